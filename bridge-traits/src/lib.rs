//! # Store Bridge Traits
//!
//! Backend abstraction for the store operations the package library delegates.
//!
//! ## Overview
//!
//! This crate defines the contract between the core library and the engines
//! that actually talk to the store. Each engine (today only the ipatool engine
//! reached across the C ABI) implements [`StoreBackend`](backend::StoreBackend)
//! and reports which [`Operation`](operation::Operation)s it can serve.
//!
//! ## Modules
//!
//! - [`operation`] - The closed catalog of delegated store operations
//! - [`backend`] - The [`StoreBackend`](backend::StoreBackend) capability trait
//!   and [`BackendKind`](backend::BackendKind)
//! - [`models`] - Account, listing, and download value types
//! - [`error`] - The [`BridgeError`](error::BridgeError) taxonomy
//!
//! ## Error Handling
//!
//! All backend operations return [`BridgeError`](error::BridgeError). Backends
//! should:
//!
//! - Reject a call with `BackendUnavailable` before touching the engine when
//!   the engine is missing
//! - Surface engine failures verbatim through `BackendFailure`
//! - Never return a partially decoded value; use `MalformedResponse` instead
//!
//! ## Thread Safety
//!
//! `StoreBackend` requires `Send + Sync` so one backend instance can be shared
//! by concurrently running operations. Per-account state is never shared: it
//! travels as `&mut Account` through each call.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::{BackendKind, StoreBackend, Operation};
//! use async_trait::async_trait;
//!
//! pub struct MyBackend;
//!
//! #[async_trait]
//! impl StoreBackend for MyBackend {
//!     fn kind(&self) -> BackendKind {
//!         BackendKind::IpaTool
//!     }
//!
//!     fn is_available(&self) -> bool {
//!         true
//!     }
//!
//!     async fn fetch_bag(&self) -> Result<BagOutput> {
//!         // Implementation
//!         todo!()
//!     }
//!
//!     // ...
//! }
//! ```

pub mod backend;
pub mod error;
pub mod models;
pub mod operation;

pub use error::{BridgeError, Result};

// Re-export commonly used types
pub use backend::{BackendKind, StoreBackend};
pub use models::{
    Account, BagOutput, Cookie, DownloadOutput, EntityType, Sinf, Software, VersionMetadata,
};
pub use operation::Operation;
