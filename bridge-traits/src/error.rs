use thiserror::Error;

use crate::operation::Operation;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The selected backend is missing, unavailable, or cannot serve the
    /// operation. Raised before the engine is called.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Backend does not implement operation {0}")]
    UnsupportedOperation(Operation),

    #[error("License required")]
    LicenseRequired,

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("Backend operation failed: {0}")]
    BackendFailure(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl BridgeError {
    /// Whether the call was rejected before reaching the engine.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, BridgeError::BackendUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
