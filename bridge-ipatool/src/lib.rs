//! # ipatool Backend
//!
//! [`StoreBackend`](bridge_traits::StoreBackend) implementation over the
//! ipatool engine, a Go library exposing one C entry point per operation.
//!
//! ## Layers
//!
//! - [`wire`] - Request and result payloads in the engine's JSON shape
//! - [`envelope`] - The `{ok, result, error}` response envelope and its
//!   mapping onto [`BridgeError`](bridge_traits::BridgeError)
//! - [`ffi`] - Entry point table, response buffer ownership, and blocking
//!   pool dispatch
//! - [`backend`] - [`IpaToolBackend`], which ties the three together
//!
//! ## Linking
//!
//! Build with the `linked` feature to bind the symbols exported by
//! `GoIPAToolBindings`. Without it the backend reports itself unavailable and
//! the resolver rejects every operation before any boundary call.

pub mod backend;
pub mod envelope;
pub mod ffi;
pub mod wire;

pub use backend::IpaToolBackend;
pub use ffi::{EntryPoints, ForeignCallAdapter};
pub use wire::EngineVersion;
