//! Request and result payloads exchanged with the engine.
//!
//! Key names are fixed by the engine, including its irregular capitalization
//! (`bundleID`, `versionID`, `downloadURL`, `iTunesMetadataBase64`).

use bridge_traits::{Account, Cookie, EntityType, Software, VersionMetadata};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub term: String,
    pub country_code: String,
    pub limit: u32,
    pub entity_type: EntityType,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupRequest {
    #[serde(rename = "bundleID")]
    pub bundle_id: String,
    pub country_code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BagRequest {
    pub device_identifier: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateRequest {
    pub email: String,
    pub password: String,
    pub code: String,
    pub cookies: Vec<Cookie>,
    pub device_identifier: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub account: Account,
    pub app: Software,
    pub device_identifier: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVersionsRequest {
    pub account: Account,
    pub bundle_identifier: String,
    pub device_identifier: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMetadataRequest {
    pub account: Account,
    pub app: Software,
    #[serde(rename = "versionID")]
    pub version_id: String,
    pub device_identifier: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub account: Account,
    pub app: Software,
    /// Empty selects the current version
    #[serde(rename = "externalVersionID")]
    pub external_version_id: String,
    pub device_identifier: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseResult {
    pub account: Account,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListVersionsResult {
    pub account: Account,
    pub versions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionMetadataResult {
    pub account: Account,
    pub metadata: VersionMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BagResult {
    pub auth_endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SinfPayload {
    pub id: i64,
    pub sinf_base64: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResult {
    pub account: Account,
    #[serde(rename = "downloadURL")]
    pub download_url: String,
    pub sinfs: Vec<SinfPayload>,
    pub bundle_short_version_string: String,
    pub bundle_version: String,
    #[serde(rename = "iTunesMetadataBase64")]
    pub itunes_metadata_base64: String,
}

/// Build identity reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineVersion {
    pub module: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn account() -> Account {
        serde_json::from_value(json!({
            "email": "a@b.com",
            "password": "pw",
            "appleId": "a@b.com",
            "store": "143441",
            "firstName": "A",
            "lastName": "B",
            "passwordToken": "tok",
            "directoryServicesIdentifier": "dsid"
        }))
        .unwrap()
    }

    fn app() -> Software {
        serde_json::from_value(json!({
            "trackId": 1,
            "bundleId": "com.example.app",
            "trackName": "Example",
            "version": "1.0",
            "artistName": "Dev",
            "sellerName": "Dev Inc",
            "description": "",
            "artworkUrl512": "https://example.com/a.png",
            "minimumOsVersion": "15.0",
            "currentVersionReleaseDate": "2024-01-01T00:00:00Z",
            "primaryGenreName": "Utilities"
        }))
        .unwrap()
    }

    #[test]
    fn test_lookup_request_keys() {
        let value = serde_json::to_value(LookupRequest {
            bundle_id: "com.example.app".to_string(),
            country_code: "US".to_string(),
        })
        .unwrap();

        assert_eq!(value, json!({"bundleID": "com.example.app", "countryCode": "US"}));
    }

    #[test]
    fn test_search_request_entity_names() {
        let value = serde_json::to_value(SearchRequest {
            term: "notes".to_string(),
            country_code: "US".to_string(),
            limit: 5,
            entity_type: EntityType::IPad,
        })
        .unwrap();

        assert_eq!(value["entityType"], "iPad");
        assert_eq!(value["limit"], 5);
    }

    #[test]
    fn test_download_request_keys() {
        let value = serde_json::to_value(DownloadRequest {
            account: account(),
            app: app(),
            external_version_id: String::new(),
            device_identifier: "AABBCCDDEEFF".to_string(),
            user_agent: "UA".to_string(),
        })
        .unwrap();

        let object = value.as_object().unwrap();
        for key in ["account", "app", "externalVersionID", "deviceIdentifier", "userAgent"] {
            assert!(object.contains_key(key), "missing {}", key);
        }
        assert_eq!(value["externalVersionID"], Value::String(String::new()));
        assert_eq!(value["app"]["bundleId"], "com.example.app");
        assert_eq!(value["account"]["passwordToken"], "tok");
    }

    #[test]
    fn test_version_metadata_request_key() {
        let value = serde_json::to_value(VersionMetadataRequest {
            account: account(),
            app: app(),
            version_id: "8765".to_string(),
            device_identifier: "AABBCCDDEEFF".to_string(),
            user_agent: "UA".to_string(),
        })
        .unwrap();

        assert_eq!(value["versionID"], "8765");
    }

    #[test]
    fn test_download_result_keys() {
        let result: DownloadResult = serde_json::from_value(json!({
            "account": serde_json::to_value(account()).unwrap(),
            "downloadURL": "https://cdn.example.com/app.ipa",
            "sinfs": [{"id": 0, "sinfBase64": "AAEC"}],
            "bundleShortVersionString": "1.2",
            "bundleVersion": "120",
            "iTunesMetadataBase64": "PHBsaXN0Lz4="
        }))
        .unwrap();

        assert_eq!(result.download_url, "https://cdn.example.com/app.ipa");
        assert_eq!(result.sinfs[0].sinf_base64, "AAEC");
        assert_eq!(result.itunes_metadata_base64, "PHBsaXN0Lz4=");
    }

    #[test]
    fn test_version_metadata_result_dates() {
        let result: VersionMetadataResult = serde_json::from_value(json!({
            "account": serde_json::to_value(account()).unwrap(),
            "metadata": {"displayVersion": "2.0", "releaseDate": "2023-06-01T12:00:00Z"}
        }))
        .unwrap();

        assert_eq!(result.metadata.display_version, "2.0");
        assert_eq!(result.metadata.release_date.to_rfc3339(), "2023-06-01T12:00:00+00:00");
    }
}
