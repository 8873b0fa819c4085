//! Store value types shared by every backend.
//!
//! Field names follow the JSON the store and the engine exchange, so these
//! types serialize straight onto the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// A session cookie attached to an [`Account`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Expiry as seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
}

/// Store account together with its session state.
///
/// Operations that can refresh the session take `&mut Account` and overwrite
/// it with the value returned by the backend, so the caller's copy always
/// reflects the latest cookies and tokens.
///
/// # Security
///
/// The `Debug` implementation redacts the password and password token.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub email: String,
    pub password: String,
    pub apple_id: String,
    pub store: String,
    pub first_name: String,
    pub last_name: String,
    pub password_token: String,
    pub directory_services_identifier: String,
    #[serde(default)]
    pub cookie: Vec<Cookie>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("apple_id", &self.apple_id)
            .field("store", &self.store)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password_token", &"[REDACTED]")
            .field(
                "directory_services_identifier",
                &self.directory_services_identifier,
            )
            .field("cookies", &self.cookie.len())
            .field("pod", &self.pod)
            .finish()
    }
}

/// Device family a search is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntityType {
    #[default]
    #[serde(rename = "iPhone")]
    IPhone,
    #[serde(rename = "iPad")]
    IPad,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::IPhone => "iPhone",
            EntityType::IPad => "iPad",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A store listing.
///
/// Decoding is strict on identity, publisher, and descriptive fields: an
/// entry missing any of them is rejected rather than zero-filled. Rating
/// aggregates and screenshots are absent for some listings and default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Software {
    #[serde(rename = "trackId")]
    pub id: i64,
    #[serde(rename = "bundleId")]
    pub bundle_id: String,
    #[serde(rename = "trackName")]
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub artist_name: String,
    pub seller_name: String,
    pub description: String,
    #[serde(default)]
    pub average_user_rating: f64,
    #[serde(default)]
    pub user_rating_count: i64,
    #[serde(rename = "artworkUrl512")]
    pub artwork_url: String,
    #[serde(default)]
    pub screenshot_urls: Vec<String>,
    pub minimum_os_version: String,
    #[serde(rename = "currentVersionReleaseDate")]
    pub release_date: String,
    pub primary_genre_name: String,
}

/// Display version and release date of one historical version of an app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMetadata {
    pub display_version: String,
    pub release_date: DateTime<Utc>,
}

/// Per-license signature blob delivered with a download.
#[derive(Clone, PartialEq, Eq)]
pub struct Sinf {
    pub id: i64,
    pub sinf: Vec<u8>,
}

impl fmt::Debug for Sinf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sinf")
            .field("id", &self.id)
            .field("bytes", &self.sinf.len())
            .finish()
    }
}

/// Everything needed to fetch and sign an app package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutput {
    pub download_url: String,
    pub sinfs: Vec<Sinf>,
    pub bundle_short_version_string: String,
    pub bundle_version: String,
    /// Raw `iTunesMetadata.plist` contents
    pub itunes_metadata: Vec<u8>,
}

/// Result of bag discovery: the endpoint authentication must be sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BagOutput {
    pub auth_endpoint: Url,
}
