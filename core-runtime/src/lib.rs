//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the store bridge:
//! - Logging and tracing infrastructure
//! - Store configuration (device identity, user agent, environment access)
//! - Resolution of the engine artifact the bridge links against
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other crates depend on. It
//! establishes the logging conventions and the configuration surface read
//! from the process environment.

pub mod artifact;
pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
