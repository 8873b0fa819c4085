//! Envelope codec
//!
//! Every engine response is a JSON envelope:
//!
//! ```json
//! { "ok": true,  "result": { ... } }
//! { "ok": false, "error": "License required", "errorKind": "licenseRequired" }
//! ```
//!
//! `errorKind` is optional. When it is absent or unrecognized the error is
//! classified from the message text.

use bridge_traits::{BridgeError, Operation, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const UNSUPPORTED_MARKER: &str = "unsupported operation";
const LICENSE_REQUIRED_MESSAGE: &str = "License required";
const DEFAULT_FAILURE_MESSAGE: &str = "ipatool backend operation failed";

/// Machine-readable failure class reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    UnsupportedOperation,
    LicenseRequired,
    Failure,
    #[serde(other)]
    Unknown,
}

/// Response wrapper returned by every entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<R> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<R>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

/// Serialize a request payload to the JSON text handed to the engine.
pub fn encode_request<T: Serialize>(request: &T) -> Result<String> {
    serde_json::to_string(request)
        .map_err(|e| BridgeError::InvalidRequest(format!("failed to encode request: {}", e)))
}

/// Decode the engine's response to `operation`.
///
/// # Errors
///
/// - [`BridgeError::MalformedResponse`] when the text is not a valid
///   envelope, a successful envelope carries no result or carries an error,
///   or a failed envelope carries a result
/// - [`BridgeError::UnsupportedOperation`], [`BridgeError::LicenseRequired`],
///   or [`BridgeError::BackendFailure`] for failed envelopes
///
/// # Examples
///
/// ```
/// use bridge_ipatool::envelope::decode_response;
/// use bridge_traits::{BridgeError, Operation};
///
/// let value: u32 = decode_response(Operation::Search, r#"{"ok":true,"result":7}"#).unwrap();
/// assert_eq!(value, 7);
///
/// let err = decode_response::<u32>(Operation::Purchase, r#"{"ok":false,"error":"License required"}"#)
///     .unwrap_err();
/// assert_eq!(err, BridgeError::LicenseRequired);
/// ```
pub fn decode_response<R: DeserializeOwned>(operation: Operation, text: &str) -> Result<R> {
    let envelope: Envelope<R> = serde_json::from_str(text).map_err(|e| {
        BridgeError::MalformedResponse(format!(
            "invalid response envelope for {}: {}",
            operation, e
        ))
    })?;

    if !envelope.ok {
        if envelope.result.is_some() {
            return Err(BridgeError::MalformedResponse(format!(
                "failed response to {} carries a result",
                operation
            )));
        }
        return Err(classify_failure(
            operation,
            envelope.error_kind,
            envelope.error,
        ));
    }

    if let Some(error) = envelope.error {
        return Err(BridgeError::MalformedResponse(format!(
            "successful response to {} carries an error: {}",
            operation, error
        )));
    }

    envelope
        .result
        .ok_or_else(|| BridgeError::MalformedResponse("backend returned no result".to_string()))
}

fn classify_failure(
    operation: Operation,
    kind: Option<ErrorKind>,
    message: Option<String>,
) -> BridgeError {
    match kind {
        Some(ErrorKind::UnsupportedOperation) => BridgeError::UnsupportedOperation(operation),
        Some(ErrorKind::LicenseRequired) => BridgeError::LicenseRequired,
        Some(ErrorKind::Failure) => BridgeError::BackendFailure(
            message.unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
        ),
        Some(ErrorKind::Unknown) | None => match message {
            Some(message) if message.contains(UNSUPPORTED_MARKER) => {
                BridgeError::UnsupportedOperation(operation)
            }
            Some(message) if message == LICENSE_REQUIRED_MESSAGE => BridgeError::LicenseRequired,
            Some(message) => BridgeError::BackendFailure(message),
            None => BridgeError::BackendFailure(DEFAULT_FAILURE_MESSAGE.to_string()),
        },
    }
}
