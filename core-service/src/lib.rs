//! Store service façade and bootstrap helpers.
//!
//! [`StoreService`] exposes one method per store operation. Each forwards its
//! arguments, fills in defaults, and runs through
//! [`BackendResolver::perform`], so availability and capability checks
//! happen in exactly one place.
//!
//! ```no_run
//! # async fn example() -> core_service::Result<()> {
//! use core_service::StoreService;
//!
//! let service = StoreService::from_env()?;
//! let mut account = service.authenticate_with_password("jane@example.com", "secret").await?;
//! let app = service.lookup("com.example.app", "US").await?;
//! service.purchase(&mut account, &app).await?;
//! let download = service.download(&mut account, &app, None).await?;
//! println!("{}", download.download_url);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod resolver;

pub use error::{CoreError, Result};
pub use resolver::{BackendFactory, BackendResolver};

use std::sync::Arc;

use bridge_ipatool::{EngineVersion, ForeignCallAdapter};
use bridge_traits::{
    Account, BagOutput, Cookie, DownloadOutput, EntityType, Operation, Software, VersionMetadata,
};
use core_runtime::config::StoreConfig;
use tracing::{debug, info};

/// Result limit used by [`StoreService::search_default`].
pub const DEFAULT_SEARCH_LIMIT: u32 = 5;

/// Primary façade exposed to host applications.
#[derive(Debug, Clone)]
pub struct StoreService {
    resolver: Arc<BackendResolver>,
}

impl StoreService {
    /// Create a service over a fully configured resolver.
    pub fn new(resolver: BackendResolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }

    /// Service backed by the engine linked into this build.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(BackendResolver::from_config(config))
    }

    /// Service configured from the process environment.
    pub fn from_env() -> Result<Self> {
        let config = StoreConfig::from_env()?;
        match Self::engine_version() {
            Ok(version) => info!(module = %version.module, version = %version.version, "Store engine loaded"),
            Err(err) => debug!(error = %err, "Store engine version unavailable"),
        }
        Ok(Self::from_config(&config))
    }

    /// Module path and version of the linked engine.
    pub fn engine_version() -> Result<EngineVersion> {
        Ok(ForeignCallAdapter::from_link().engine_version()?)
    }

    pub fn resolver(&self) -> &BackendResolver {
        &self.resolver
    }

    /// Search the catalog.
    pub async fn search(
        &self,
        term: &str,
        country_code: &str,
        limit: u32,
        entity_type: EntityType,
    ) -> bridge_traits::Result<Vec<Software>> {
        self.resolver
            .perform(Operation::Search, |backend| async move {
                backend.search(term, country_code, limit, entity_type).await
            })
            .await
    }

    /// Search iPhone apps, returning at most [`DEFAULT_SEARCH_LIMIT`] results.
    pub async fn search_default(
        &self,
        term: &str,
        country_code: &str,
    ) -> bridge_traits::Result<Vec<Software>> {
        self.search(term, country_code, DEFAULT_SEARCH_LIMIT, EntityType::default())
            .await
    }

    pub async fn lookup(
        &self,
        bundle_id: &str,
        country_code: &str,
    ) -> bridge_traits::Result<Software> {
        self.resolver
            .perform(Operation::Lookup, |backend| async move {
                backend.lookup(bundle_id, country_code).await
            })
            .await
    }

    pub async fn fetch_bag(&self) -> bridge_traits::Result<BagOutput> {
        self.resolver
            .perform(Operation::FetchBag, |backend| async move {
                backend.fetch_bag().await
            })
            .await
    }

    /// Sign in with a one-time code and existing session cookies.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        code: &str,
        cookies: &[Cookie],
    ) -> bridge_traits::Result<Account> {
        self.resolver
            .perform(Operation::Authenticate, |backend| async move {
                backend.authenticate(email, password, code, cookies).await
            })
            .await
    }

    /// Sign in without a one-time code or prior cookies.
    pub async fn authenticate_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> bridge_traits::Result<Account> {
        self.authenticate(email, password, "", &[]).await
    }

    pub async fn rotate_password_token(&self, account: &mut Account) -> bridge_traits::Result<()> {
        self.resolver
            .perform(Operation::RotatePasswordToken, |backend| async move {
                backend.rotate_password_token(account).await
            })
            .await
    }

    pub async fn purchase(
        &self,
        account: &mut Account,
        app: &Software,
    ) -> bridge_traits::Result<()> {
        self.resolver
            .perform(Operation::Purchase, |backend| async move {
                backend.purchase(account, app).await
            })
            .await
    }

    /// External version identifiers of `bundle_identifier`.
    pub async fn list_versions(
        &self,
        account: &mut Account,
        bundle_identifier: &str,
    ) -> bridge_traits::Result<Vec<String>> {
        self.resolver
            .perform(Operation::ListVersions, |backend| async move {
                backend.list_versions(account, bundle_identifier).await
            })
            .await
    }

    pub async fn get_version_metadata(
        &self,
        account: &mut Account,
        app: &Software,
        version_id: &str,
    ) -> bridge_traits::Result<VersionMetadata> {
        self.resolver
            .perform(Operation::GetVersionMetadata, |backend| async move {
                backend.get_version_metadata(account, app, version_id).await
            })
            .await
    }

    /// Prepare a download of `app`. `None` selects the current version.
    pub async fn download(
        &self,
        account: &mut Account,
        app: &Software,
        external_version_id: Option<String>,
    ) -> bridge_traits::Result<DownloadOutput> {
        self.resolver
            .perform(Operation::Download, |backend| async move {
                backend.download(account, app, external_version_id).await
            })
            .await
    }
}
