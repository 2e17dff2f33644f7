//! Error types for chain address resolution.

use thiserror::Error;

/// Errors raised while resolving an on-chain address.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Failed to reach address service at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Address service returned {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Failed to decode address service response: {0}")]
    DecodeError(String),

    #[error("Invalid resolver configuration: {0}")]
    Config(String),
}

impl From<ChainError> for crate::auth::AuthError {
    fn from(e: ChainError) -> Self {
        crate::auth::AuthError::UpstreamResolution(e.to_string())
    }
}
