//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-service`, `core-runtime`). Host applications
//! can depend on `applepackage-workspace` and enable the documented features
//! without needing to wire each crate individually. Enabling `linked` links the
//! ipatool engine library into the final artifact.

#[cfg(feature = "service")]
pub use core_runtime;
#[cfg(feature = "service")]
pub use core_service;
