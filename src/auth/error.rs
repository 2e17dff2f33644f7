//! Error types for session-key issuance and validation.

use crate::repository::RepositoryError;
use thiserror::Error;

/// Errors that can occur while issuing, validating, or revoking session keys.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Address resolution failed: {0}")]
    UpstreamResolution(String),

    #[error("Invalid hex encoding in {field}")]
    Decode { field: &'static str },

    #[error("Delegation verification failed")]
    DelegationInvalid,

    #[error("Signature verification failed")]
    SignatureInvalid,

    #[error("Invalid token: {0}")]
    TokenInvalid(String),

    #[error("Session key not found: {id}")]
    NotFound { id: String },

    #[error("Permission denied. You are not authorized to access this resource")]
    PermissionDenied,

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] RepositoryError),

    #[error("Failed to sign token: {0}")]
    TokenEncoding(String),
}

impl AuthError {
    /// Whether the error means the caller failed to prove who they are.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AuthError::Decode { .. }
                | AuthError::DelegationInvalid
                | AuthError::SignatureInvalid
                | AuthError::TokenInvalid(_)
                | AuthError::Unauthenticated(_)
        )
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        AuthError::TokenInvalid(e.to_string())
    }
}
