//! The chain resolver contract.

use crate::auth::types::SignInInput;
use crate::chain::error::ChainError;
use async_trait::async_trait;

/// Resolves the on-chain address a sign-in proof belongs to.
///
/// One implementation exists per supported chain. The engine holds a single
/// resolver chosen at construction.
#[async_trait]
pub trait ChainResolver: Send + Sync {
    /// Chain name recorded on issued session keys.
    fn name(&self) -> &str;

    /// Resolve the address for `input`.
    ///
    /// Failures are terminal for the sign-in attempt; no retries happen here.
    async fn resolve_address(&self, input: &SignInInput) -> Result<String, ChainError>;
}
