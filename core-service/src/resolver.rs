//! # Backend Resolver
//!
//! Selects the backend for each operation and refuses calls the backend
//! cannot serve before any of its code runs.
//!
//! ## Selection
//!
//! 1. A preferred-backend override set on the resolver wins.
//! 2. Otherwise `APPLEPACKAGE_BACKEND` is read through the resolver's
//!    environment reader. Recognized aliases (`go`, `ipatool`, `native`,
//!    `rust`) map onto their backend kind; unrecognized or absent values
//!    fall back to [`BackendKind::default`].
//!
//! ## Gating
//!
//! [`BackendResolver::perform`] runs the operation body only when the chosen
//! backend both supports the operation and is available. An availability
//! override set on the resolver replaces the backend's own report.
//!
//! ## Lifecycle
//!
//! Each resolver is an independent context object. Configure it with the
//! `with_*` methods, then share it behind an `Arc`; it is not mutated while
//! calls are in flight. Tests build one resolver per case.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use bridge_ipatool::IpaToolBackend;
use bridge_traits::{BackendKind, BridgeError, Operation, Result, StoreBackend};
use core_runtime::config::{process_environment_reader, EnvironmentReader, StoreConfig, BACKEND_ENV};
use tracing::{debug, warn};

/// Produces a fresh instance of the default backend.
pub type BackendFactory = Arc<dyn Fn() -> Arc<dyn StoreBackend> + Send + Sync>;

/// Per-process backend selection and gating policy.
pub struct BackendResolver {
    environment: EnvironmentReader,
    preferred_backend_override: Option<BackendKind>,
    availability_override: Option<bool>,
    ipatool_backend: Arc<dyn StoreBackend>,
    default_backend: BackendFactory,
}

impl BackendResolver {
    /// Create a resolver that reads the process environment and serves
    /// operations from instances produced by `default_backend`.
    pub fn new(default_backend: BackendFactory) -> Self {
        let ipatool_backend = default_backend();
        Self {
            environment: process_environment_reader(),
            preferred_backend_override: None,
            availability_override: None,
            ipatool_backend,
            default_backend,
        }
    }

    /// The production resolver: the ipatool engine linked into this build,
    /// identified to the store by `config`.
    pub fn from_config(config: &StoreConfig) -> Self {
        let config = config.clone();
        Self::new(Arc::new(move || {
            Arc::new(IpaToolBackend::new(&config)) as Arc<dyn StoreBackend>
        }))
    }

    /// Replace the environment reader consulted for backend selection.
    pub fn with_environment(mut self, environment: EnvironmentReader) -> Self {
        self.environment = environment;
        self
    }

    /// Force the preferred backend kind regardless of the environment.
    pub fn with_preferred_backend(mut self, kind: Option<BackendKind>) -> Self {
        self.preferred_backend_override = kind;
        self
    }

    /// Force the availability reported for every backend.
    pub fn with_availability_override(mut self, available: Option<bool>) -> Self {
        self.availability_override = available;
        self
    }

    /// Install the instance serving [`BackendKind::IpaTool`].
    pub fn with_ipatool_backend(mut self, backend: Arc<dyn StoreBackend>) -> Self {
        self.ipatool_backend = backend;
        self
    }

    /// Restore the process environment reader, clear both overrides, and
    /// reinstate a fresh default backend.
    pub fn reset_testing_overrides(&mut self) {
        self.environment = process_environment_reader();
        self.preferred_backend_override = None;
        self.availability_override = None;
        self.ipatool_backend = (self.default_backend)();
    }

    /// The backend kind operations are currently routed to.
    pub fn preferred_backend_kind(&self) -> BackendKind {
        if let Some(kind) = self.preferred_backend_override {
            return kind;
        }

        let environment = (self.environment)();
        match environment.get(BACKEND_ENV) {
            Some(raw) => BackendKind::parse(raw).unwrap_or_else(|| {
                warn!(value = %raw, "Unrecognized {}; using default backend", BACKEND_ENV);
                BackendKind::default()
            }),
            None => BackendKind::default(),
        }
    }

    /// The backend that would serve `operation`.
    pub fn backend_for(&self, operation: Operation) -> Arc<dyn StoreBackend> {
        let kind = self.preferred_backend_kind();
        debug!(operation = %operation, backend = %kind, "Resolved backend");
        match kind {
            BackendKind::IpaTool => Arc::clone(&self.ipatool_backend),
        }
    }

    /// Whether `backend` should be treated as reachable.
    pub fn is_available(&self, backend: &dyn StoreBackend) -> bool {
        self.availability_override
            .unwrap_or_else(|| backend.is_available())
    }

    /// Run `body` against the backend for `operation`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::BackendUnavailable`] without running `body`
    /// when the backend does not support `operation` or is unavailable.
    /// Otherwise returns whatever `body` returns.
    pub async fn perform<T, F, Fut>(&self, operation: Operation, body: F) -> Result<T>
    where
        F: FnOnce(Arc<dyn StoreBackend>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let backend = self.backend_for(operation);

        if !backend.supports(operation) || !self.is_available(backend.as_ref()) {
            let kind = backend.kind();
            warn!(operation = %operation, backend = %kind, "Backend unavailable");
            return Err(BridgeError::BackendUnavailable(format!(
                "{} backend is unavailable for operation {}",
                kind, operation
            )));
        }

        body(backend).await
    }
}

impl fmt::Debug for BackendResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendResolver")
            .field("preferred_backend_override", &self.preferred_backend_override)
            .field("availability_override", &self.availability_override)
            .field("ipatool_backend", &self.ipatool_backend.kind())
            .finish_non_exhaustive()
    }
}
