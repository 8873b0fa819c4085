//! # Store Configuration
//!
//! Provides the process-level configuration the bridge attaches to every
//! session-bearing engine request.
//!
//! ## Overview
//!
//! The store identifies a client by a device identifier (a MAC-address style
//! GUID) and a user agent. Both are sourced from configuration, never from
//! the caller of an individual operation. `StoreConfig` is assembled once at
//! startup with [`StoreConfigBuilder`] and validated fail-fast.
//!
//! ## Environment
//!
//! | Variable                          | Meaning                                    |
//! |-----------------------------------|--------------------------------------------|
//! | `APPLEPACKAGE_BACKEND`            | Preferred backend kind (read by resolver)  |
//! | `APPLEPACKAGE_DEVICE_IDENTIFIER`  | Device identifier override                 |
//! | `APPLEPACKAGE_USER_AGENT`         | User agent override                        |
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::StoreConfig;
//!
//! let config = StoreConfig::builder()
//!     .device_identifier("A1B2C3D4E5F6")
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.device_identifier, "A1B2C3D4E5F6");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::StoreConfig;
//!
//! // Device identifiers must be hexadecimal
//! let config = StoreConfig::builder()
//!     .device_identifier("not a guid")
//!     .build()
//!     .expect("Should fail - invalid device identifier");
//! ```

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Environment variable selecting the preferred backend kind
pub const BACKEND_ENV: &str = "APPLEPACKAGE_BACKEND";

/// Environment variable overriding the device identifier
pub const DEVICE_IDENTIFIER_ENV: &str = "APPLEPACKAGE_DEVICE_IDENTIFIER";

/// Environment variable overriding the user agent
pub const USER_AGENT_ENV: &str = "APPLEPACKAGE_USER_AGENT";

/// User agent the store accepts for Configurator-style clients
pub const DEFAULT_USER_AGENT: &str =
    "Configurator/2.17 (Macintosh; OS X 15.2; 24C5089c) AppleWebKit/0620.1.16.11.6";

const MAX_DEVICE_IDENTIFIER_LEN: usize = 64;

/// Snapshot of environment variables.
pub type Environment = HashMap<String, String>;

/// Function producing the environment the bridge should consult.
///
/// Production code reads the process environment; tests inject fixed maps.
pub type EnvironmentReader = Arc<dyn Fn() -> Environment + Send + Sync>;

/// Read the current process environment.
pub fn process_environment() -> Environment {
    std::env::vars().collect()
}

/// Reader over the live process environment.
pub fn process_environment_reader() -> EnvironmentReader {
    Arc::new(process_environment)
}

/// Reader that always returns the given variables.
///
/// # Examples
///
/// ```
/// use core_runtime::config::{fixed_environment_reader, BACKEND_ENV};
///
/// let reader = fixed_environment_reader([(BACKEND_ENV, "native")]);
/// assert_eq!(reader().get(BACKEND_ENV).map(String::as_str), Some("native"));
/// ```
pub fn fixed_environment_reader<K, V, I>(vars: I) -> EnvironmentReader
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let env: Environment = vars
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    Arc::new(move || env.clone())
}

/// Configuration shared by every store request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Device GUID presented to the store
    pub device_identifier: String,

    /// User agent presented to the store
    pub user_agent: String,
}

impl StoreConfig {
    /// Creates a new builder for constructing a `StoreConfig`.
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Build a configuration from the process environment, generating a
    /// device identifier when none is configured.
    pub fn from_env() -> Result<Self> {
        Self::builder().environment(&process_environment()).build()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The device identifier is non-empty hexadecimal of bounded length
    /// - The user agent is non-empty
    pub fn validate(&self) -> Result<()> {
        let id = self.device_identifier.as_str();
        if id.is_empty() {
            return Err(Error::Config(
                "Device identifier cannot be empty".to_string(),
            ));
        }

        if id.len() > MAX_DEVICE_IDENTIFIER_LEN {
            return Err(Error::Config(format!(
                "Device identifier exceeds maximum of {} characters",
                MAX_DEVICE_IDENTIFIER_LEN
            )));
        }

        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::Config(
                "Device identifier must be hexadecimal (e.g. a MAC address without separators)"
                    .to_string(),
            ));
        }

        if self.user_agent.trim().is_empty() {
            return Err(Error::Config("User agent cannot be empty".to_string()));
        }

        Ok(())
    }
}

/// Generate a random 12-digit uppercase hexadecimal device identifier.
pub fn generate_device_identifier() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_uppercase()
}

/// Builder for constructing [`StoreConfig`] instances.
#[derive(Debug, Default)]
pub struct StoreConfigBuilder {
    device_identifier: Option<String>,
    user_agent: Option<String>,
}

impl StoreConfigBuilder {
    /// Sets the device identifier.
    ///
    /// Default: a freshly generated identifier.
    pub fn device_identifier(mut self, id: impl Into<String>) -> Self {
        self.device_identifier = Some(id.into());
        self
    }

    /// Sets the user agent.
    ///
    /// Default: [`DEFAULT_USER_AGENT`]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Applies overrides found in `env`. Values set explicitly on the builder
    /// afterwards still win.
    pub fn environment(mut self, env: &Environment) -> Self {
        if let Some(id) = non_blank(env.get(DEVICE_IDENTIFIER_ENV)) {
            self.device_identifier = Some(id);
        }
        if let Some(agent) = non_blank(env.get(USER_AGENT_ENV)) {
            self.user_agent = Some(agent);
        }
        self
    }

    /// Builds the final `StoreConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a provided value fails validation.
    pub fn build(self) -> Result<StoreConfig> {
        let config = StoreConfig {
            device_identifier: self
                .device_identifier
                .map(|id| id.trim().to_string())
                .unwrap_or_else(generate_device_identifier),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        };

        config.validate()?;

        Ok(config)
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
