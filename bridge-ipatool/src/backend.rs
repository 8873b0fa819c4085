use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bridge_traits::{
    Account, BackendKind, BagOutput, BridgeError, Cookie, DownloadOutput, EntityType, Operation,
    Result, Sinf, Software, StoreBackend, VersionMetadata,
};
use core_runtime::config::StoreConfig;
use core_runtime::logging::redact_if_sensitive;
use tracing::{debug, instrument};
use url::Url;

use crate::ffi::ForeignCallAdapter;
use crate::wire::{
    AuthenticateRequest, BagRequest, BagResult, DownloadRequest, DownloadResult,
    ListVersionsRequest, ListVersionsResult, LookupRequest, PurchaseRequest, PurchaseResult,
    SearchRequest, VersionMetadataRequest, VersionMetadataResult,
};

/// Store backend served by the ipatool engine.
///
/// Device identity comes from [`StoreConfig`]; callers never supply it.
/// Session-bearing operations replace the caller's [`Account`] with the one
/// the engine returns, so refreshed tokens and cookies are never lost.
#[derive(Debug, Clone)]
pub struct IpaToolBackend {
    adapter: ForeignCallAdapter,
    device_identifier: String,
    user_agent: String,
}

impl IpaToolBackend {
    /// Backend over the engine linked into this build.
    pub fn new(config: &StoreConfig) -> Self {
        Self::with_adapter(ForeignCallAdapter::from_link(), config)
    }

    pub fn with_adapter(adapter: ForeignCallAdapter, config: &StoreConfig) -> Self {
        Self {
            adapter,
            device_identifier: config.device_identifier.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    pub fn adapter(&self) -> &ForeignCallAdapter {
        &self.adapter
    }

    fn authenticate_request(
        &self,
        email: &str,
        password: &str,
        code: &str,
        cookies: &[Cookie],
    ) -> AuthenticateRequest {
        AuthenticateRequest {
            email: email.to_string(),
            password: password.to_string(),
            code: code.to_string(),
            cookies: cookies.to_vec(),
            device_identifier: self.device_identifier.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

#[async_trait]
impl StoreBackend for IpaToolBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::IpaTool
    }

    fn is_available(&self) -> bool {
        self.adapter.is_linked()
    }

    fn supports(&self, operation: Operation) -> bool {
        self.adapter.supports(operation)
    }

    #[instrument(skip_all, fields(term = %term, country = %country_code, limit = limit))]
    async fn search(
        &self,
        term: &str,
        country_code: &str,
        limit: u32,
        entity_type: EntityType,
    ) -> Result<Vec<Software>> {
        let request = SearchRequest {
            term: term.to_string(),
            country_code: country_code.to_string(),
            limit,
            entity_type,
        };
        let results: Vec<Software> = self.adapter.call(Operation::Search, request).await?;
        debug!(count = results.len(), "Search completed");
        Ok(results)
    }

    #[instrument(skip_all, fields(bundle_id = %bundle_id, country = %country_code))]
    async fn lookup(&self, bundle_id: &str, country_code: &str) -> Result<Software> {
        let request = LookupRequest {
            bundle_id: bundle_id.to_string(),
            country_code: country_code.to_string(),
        };
        self.adapter.call(Operation::Lookup, request).await
    }

    #[instrument(skip_all)]
    async fn fetch_bag(&self) -> Result<BagOutput> {
        let request = BagRequest {
            device_identifier: self.device_identifier.clone(),
            user_agent: self.user_agent.clone(),
        };
        let result: BagResult = self.adapter.call(Operation::FetchBag, request).await?;
        let auth_endpoint = Url::parse(&result.auth_endpoint).map_err(|e| {
            BridgeError::MalformedResponse(format!("invalid auth endpoint: {}", e))
        })?;
        Ok(BagOutput { auth_endpoint })
    }

    #[instrument(skip_all, fields(email = %redact_if_sensitive("email", email)))]
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
        code: &str,
        cookies: &[Cookie],
    ) -> Result<Account> {
        let request = self.authenticate_request(email, password, code, cookies);
        let account: Account = self.adapter.call(Operation::Authenticate, request).await?;
        debug!(cookies = account.cookie.len(), "Authenticated");
        Ok(account)
    }

    #[instrument(skip_all, fields(email = %redact_if_sensitive("email", &account.email)))]
    async fn rotate_password_token(&self, account: &mut Account) -> Result<()> {
        let request =
            self.authenticate_request(&account.email, &account.password, "", &account.cookie);
        let refreshed: Account = self.adapter.call(Operation::Authenticate, request).await?;
        *account = refreshed;
        debug!("Password token rotated");
        Ok(())
    }

    #[instrument(skip_all, fields(bundle_id = %app.bundle_id))]
    async fn purchase(&self, account: &mut Account, app: &Software) -> Result<()> {
        let request = PurchaseRequest {
            account: account.clone(),
            app: app.clone(),
            device_identifier: self.device_identifier.clone(),
            user_agent: self.user_agent.clone(),
        };
        let result: PurchaseResult = self.adapter.call(Operation::Purchase, request).await?;
        *account = result.account;
        Ok(())
    }

    #[instrument(skip_all, fields(bundle_id = %bundle_identifier))]
    async fn list_versions(
        &self,
        account: &mut Account,
        bundle_identifier: &str,
    ) -> Result<Vec<String>> {
        let request = ListVersionsRequest {
            account: account.clone(),
            bundle_identifier: bundle_identifier.to_string(),
            device_identifier: self.device_identifier.clone(),
            user_agent: self.user_agent.clone(),
        };
        let result: ListVersionsResult =
            self.adapter.call(Operation::ListVersions, request).await?;
        *account = result.account;
        debug!(count = result.versions.len(), "Listed versions");
        Ok(result.versions)
    }

    #[instrument(skip_all, fields(bundle_id = %app.bundle_id, version_id = %version_id))]
    async fn get_version_metadata(
        &self,
        account: &mut Account,
        app: &Software,
        version_id: &str,
    ) -> Result<VersionMetadata> {
        let request = VersionMetadataRequest {
            account: account.clone(),
            app: app.clone(),
            version_id: version_id.to_string(),
            device_identifier: self.device_identifier.clone(),
            user_agent: self.user_agent.clone(),
        };
        let result: VersionMetadataResult =
            self.adapter.call(Operation::GetVersionMetadata, request).await?;
        *account = result.account;
        Ok(result.metadata)
    }

    #[instrument(skip_all, fields(bundle_id = %app.bundle_id, version = ?external_version_id))]
    async fn download(
        &self,
        account: &mut Account,
        app: &Software,
        external_version_id: Option<String>,
    ) -> Result<DownloadOutput> {
        let request = DownloadRequest {
            account: account.clone(),
            app: app.clone(),
            external_version_id: external_version_id.unwrap_or_default(),
            device_identifier: self.device_identifier.clone(),
            user_agent: self.user_agent.clone(),
        };
        let result: DownloadResult = self.adapter.call(Operation::Download, request).await?;

        // Decode everything before touching the caller's account
        let output = decode_download(&result)?;
        *account = result.account;
        Ok(output)
    }
}

fn decode_download(result: &DownloadResult) -> Result<DownloadOutput> {
    let sinfs = result
        .sinfs
        .iter()
        .map(|payload| {
            STANDARD
                .decode(&payload.sinf_base64)
                .map(|sinf| Sinf {
                    id: payload.id,
                    sinf,
                })
                .map_err(|e| BridgeError::MalformedResponse(format!("invalid sinf payload: {}", e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let itunes_metadata = STANDARD
        .decode(&result.itunes_metadata_base64)
        .map_err(|e| BridgeError::MalformedResponse(format!("invalid iTunesMetadata: {}", e)))?;

    Ok(DownloadOutput {
        download_url: result.download_url.clone(),
        sinfs,
        bundle_short_version_string: result.bundle_short_version_string.clone(),
        bundle_version: result.bundle_version.clone(),
        itunes_metadata,
    })
}
