//! Sign-in and token issuance.

use crate::auth::address::derive_address;
use crate::auth::error::AuthError;
use crate::auth::token::mint_token;
use crate::auth::types::{
    non_zero_expiry, AnonymousSignInInput, NewSessionKey, SignInInput, SignInOutput,
};
use crate::auth::verifier::verify_anonymous;
use crate::chain::ChainResolver;
use crate::config::AuthConfig;
use crate::repository::KeyRepository;
use chrono::Utc;
use log::{debug, info};
use std::sync::Arc;

/// Issues session keys and the tokens that reference them.
pub struct IssuanceEngine {
    repository: Arc<dyn KeyRepository>,
    resolver: Arc<dyn ChainResolver>,
    config: AuthConfig,
}

impl IssuanceEngine {
    pub fn new(
        repository: Arc<dyn KeyRepository>,
        resolver: Arc<dyn ChainResolver>,
        config: AuthConfig,
    ) -> Self {
        Self {
            repository,
            resolver,
            config,
        }
    }

    /// Sign in with a chain-specific proof.
    ///
    /// 1. Resolve the owner address through the chain resolver
    /// 2. Drop the address's existing keys unless multiple keys are allowed
    /// 3. Persist a new session key and mint its token
    pub async fn sign_in(&self, input: &SignInInput) -> Result<SignInOutput, AuthError> {
        let address = self.resolver.resolve_address(input).await?;
        debug!("Resolved {} address {}", self.resolver.name(), address);

        self.apply_key_policy(&address).await?;

        self.issue_for_address(
            &input.public_key,
            None,
            &address,
            &input.device_id,
            Some(input.expires_at),
        )
        .await
    }

    /// Verify an anonymous proof and return the address derived from the root key.
    pub async fn sign_in_anonymous(&self, input: &AnonymousSignInInput) -> Result<String, AuthError> {
        verify_anonymous(input)?;
        derive_address(&input.root_public_key)
    }

    /// Anonymous sign-in through to a minted token.
    pub async fn issue_anonymous(
        &self,
        input: &AnonymousSignInInput,
    ) -> Result<SignInOutput, AuthError> {
        let address = self.sign_in_anonymous(input).await?;

        self.apply_key_policy(&address).await?;

        self.issue_for_address(
            &input.root_public_key,
            input.ephemeral_public_key.as_deref().filter(|k| !k.is_empty()),
            &address,
            &input.device_id,
            input.session_expiry(),
        )
        .await
    }

    /// Persist a key for an already-established address and mint its token.
    pub async fn issue_for_address(
        &self,
        public_key: &str,
        ephemeral_public_key: Option<&str>,
        address: &str,
        device_id: &str,
        expires_at: Option<i64>,
    ) -> Result<SignInOutput, AuthError> {
        let expires_at = non_zero_expiry(expires_at);
        let key = self
            .repository
            .create(NewSessionKey {
                address: address.to_string(),
                chain_name: self.resolver.name().to_string(),
                root_public_key: public_key.to_string(),
                ephemeral_public_key: ephemeral_public_key.map(str::to_string),
                device_id: device_id.to_string(),
                expires_at_secs: expires_at,
            })
            .await?;

        let token = mint_token(&self.config, &key, expires_at, Utc::now().timestamp())?;

        info!(
            "Issued session key {} for address {} on device {}",
            key.id, key.address, key.device_id
        );
        Ok(SignInOutput { token })
    }

    /// Best-effort: not atomic with the create that follows.
    async fn apply_key_policy(&self, address: &str) -> Result<(), AuthError> {
        if !self.config.allow_multiple_keys {
            self.repository.delete_all_by_address(address).await?;
        }
        Ok(())
    }
}
