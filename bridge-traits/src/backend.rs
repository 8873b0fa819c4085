//! Backend Contract
//!
//! The capability surface every store engine must implement.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::models::{Account, BagOutput, Cookie, DownloadOutput, EntityType, Software, VersionMetadata};
use crate::operation::Operation;

/// Known backend implementations.
///
/// Only one kind exists today, but selection stays a tagged switch so new
/// engines slot in without reshaping callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BackendKind {
    /// The ipatool engine compiled from Go and reached over the C ABI
    #[default]
    IpaTool,
}

impl BackendKind {
    /// Get the configuration identifier for this backend
    ///
    /// # Examples
    ///
    /// ```
    /// use bridge_traits::BackendKind;
    ///
    /// assert_eq!(BackendKind::IpaTool.as_str(), "go");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::IpaTool => "go",
        }
    }

    /// Human-readable name used in logs and error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            BackendKind::IpaTool => "ipatool",
        }
    }

    /// Resolve a configuration value to a backend kind.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Returns `None` for values that name no known backend.
    ///
    /// # Examples
    ///
    /// ```
    /// use bridge_traits::BackendKind;
    ///
    /// assert_eq!(BackendKind::parse(" IPATool "), Some(BackendKind::IpaTool));
    /// assert_eq!(BackendKind::parse("native"), Some(BackendKind::IpaTool));
    /// assert_eq!(BackendKind::parse("unknown"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "go" | "ipatool" => Some(BackendKind::IpaTool),
            // The in-process engine has not been written; it maps to the
            // Go engine until it exists.
            "native" | "rust" => Some(BackendKind::IpaTool),
            _ => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Store backend trait
///
/// Implementations service the operations of the [`Operation`] catalog.
/// Callers never reach a backend directly: the resolver in `core-service`
/// checks [`is_available`](StoreBackend::is_available) and
/// [`supports`](StoreBackend::supports) first and rejects the call with
/// `BackendUnavailable` if either is false.
///
/// Operations that may refresh session state take `&mut Account` and must
/// overwrite it with the refreshed account the engine hands back.
///
/// # Provided behavior
///
/// - [`supports`](StoreBackend::supports) reports every operation; narrow it
///   when only part of the catalog is implemented.
/// - [`rotate_password_token`](StoreBackend::rotate_password_token)
///   re-authenticates with the stored credentials and an empty one-time code.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Which backend this is
    fn kind(&self) -> BackendKind;

    /// Whether the implementation is linked and reachable in this process
    fn is_available(&self) -> bool;

    /// Whether this backend implements `operation`
    fn supports(&self, operation: Operation) -> bool {
        let _ = operation;
        true
    }

    /// Search the store catalog
    async fn search(
        &self,
        term: &str,
        country_code: &str,
        limit: u32,
        entity_type: EntityType,
    ) -> Result<Vec<Software>>;

    /// Look up a single listing by bundle identifier
    async fn lookup(&self, bundle_id: &str, country_code: &str) -> Result<Software>;

    /// Discover the authentication endpoint
    async fn fetch_bag(&self) -> Result<BagOutput>;

    /// Sign in and return a fresh account
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
        code: &str,
        cookies: &[Cookie],
    ) -> Result<Account>;

    /// Refresh the password token of `account` in place
    async fn rotate_password_token(&self, account: &mut Account) -> Result<()> {
        let refreshed = self
            .authenticate(&account.email, &account.password, "", &account.cookie)
            .await?;
        *account = refreshed;
        Ok(())
    }

    /// Acquire a license for `app`
    async fn purchase(&self, account: &mut Account, app: &Software) -> Result<()>;

    /// List the external version identifiers of an app
    async fn list_versions(
        &self,
        account: &mut Account,
        bundle_identifier: &str,
    ) -> Result<Vec<String>>;

    /// Resolve metadata for one external version identifier
    async fn get_version_metadata(
        &self,
        account: &mut Account,
        app: &Software,
        version_id: &str,
    ) -> Result<VersionMetadata>;

    /// Prepare a download; `None` selects the current version
    async fn download(
        &self,
        account: &mut Account,
        app: &Software,
        external_version_id: Option<String>,
    ) -> Result<DownloadOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use mockall::mock;

    mock! {
        pub Backend {}

        #[async_trait]
        impl StoreBackend for Backend {
            fn kind(&self) -> BackendKind;
            fn is_available(&self) -> bool;
            async fn search(&self, term: &str, country_code: &str, limit: u32, entity_type: EntityType) -> Result<Vec<Software>>;
            async fn lookup(&self, bundle_id: &str, country_code: &str) -> Result<Software>;
            async fn fetch_bag(&self) -> Result<BagOutput>;
            async fn authenticate(&self, email: &str, password: &str, code: &str, cookies: &[Cookie]) -> Result<Account>;
            async fn purchase(&self, account: &mut Account, app: &Software) -> Result<()>;
            async fn list_versions(&self, account: &mut Account, bundle_identifier: &str) -> Result<Vec<String>>;
            async fn get_version_metadata(&self, account: &mut Account, app: &Software, version_id: &str) -> Result<VersionMetadata>;
            async fn download(&self, account: &mut Account, app: &Software, external_version_id: Option<String>) -> Result<DownloadOutput>;
        }
    }

    fn account(email: &str, token: &str, cookies: Vec<Cookie>) -> Account {
        Account {
            email: email.to_string(),
            password: "secret".to_string(),
            apple_id: email.to_string(),
            store: "143441".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password_token: token.to_string(),
            directory_services_identifier: "1".to_string(),
            cookie: cookies,
            pod: None,
        }
    }

    fn cookie(name: &str) -> Cookie {
        Cookie {
            name: name.to_string(),
            value: "v".to_string(),
            path: "/".to_string(),
            domain: None,
            expires_at: None,
            http_only: true,
            secure: true,
        }
    }

    #[test]
    fn test_supports_defaults_to_everything() {
        let backend = MockBackend::new();
        for op in Operation::ALL {
            assert!(backend.supports(op));
        }
    }

    #[tokio::test]
    async fn test_rotate_password_token_reauthenticates_with_empty_code() {
        let mut backend = MockBackend::new();
        backend
            .expect_authenticate()
            .withf(|email, password, code, cookies| {
                email == "a@b.com"
                    && password == "secret"
                    && code.is_empty()
                    && cookies.len() == 1
                    && cookies[0].name == "session"
            })
            .times(1)
            .returning(|email, _, _, cookies| Ok(account(email, "rotated", cookies.to_vec())));

        let mut current = account("a@b.com", "stale", vec![cookie("session")]);
        backend.rotate_password_token(&mut current).await.unwrap();

        assert_eq!(current.password_token, "rotated");
        assert_eq!(current.cookie.len(), 1);
    }

    #[tokio::test]
    async fn test_rotate_password_token_leaves_account_on_failure() {
        let mut backend = MockBackend::new();
        backend
            .expect_authenticate()
            .times(1)
            .returning(|_, _, _, _| Err(BridgeError::BackendFailure("password token is expired".into())));

        let mut current = account("a@b.com", "stale", vec![]);
        let err = backend.rotate_password_token(&mut current).await.unwrap_err();

        assert_eq!(
            err,
            BridgeError::BackendFailure("password token is expired".into())
        );
        assert_eq!(current.password_token, "stale");
    }

    #[test]
    fn test_backend_kind_aliases() {
        for alias in ["go", "ipatool", "native", "rust", "  GO\n"] {
            assert_eq!(BackendKind::parse(alias), Some(BackendKind::IpaTool));
        }
        assert_eq!(BackendKind::parse("swiftly"), None);
        assert_eq!(BackendKind::parse(""), None);
        assert_eq!(BackendKind::default(), BackendKind::IpaTool);
    }
}
