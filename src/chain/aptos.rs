//! Aptos keyless address resolution.
//!
//! The pepper service turns an identity token plus an ephemeral public key
//! binder into the user's keyless account address.

use crate::auth::types::SignInInput;
use crate::chain::error::ChainError;
use crate::chain::resolver::ChainResolver;
use crate::chain::types::{AptosNetwork, PepperErrorResponse, PepperResponse};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::StatusCode;
use std::time::Duration;

/// Path of the pepper fetch endpoint.
const PEPPER_FETCH_PATH: &str = "/keyless/pepper/v0/fetch";

/// Default request timeout for the pepper service.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Resolver backed by the Aptos keyless pepper service.
#[derive(Debug)]
pub struct AptosResolver {
    client: reqwest::Client,
    fetch_url: String,
}

impl AptosResolver {
    /// Resolver for the hosted pepper service of `network`.
    pub fn new(network: AptosNetwork) -> Result<Self, ChainError> {
        Self::with_base_url(&network.api_base_url(), Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Resolver for a pepper service at `base_url`.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            fetch_url: format!("{}{}", base_url.trim_end_matches('/'), PEPPER_FETCH_PATH),
        })
    }
}

#[async_trait]
impl ChainResolver for AptosResolver {
    fn name(&self) -> &str {
        "aptos"
    }

    async fn resolve_address(&self, input: &SignInInput) -> Result<String, ChainError> {
        debug!("Fetching pepper for device {}", input.device_id);

        let response = self
            .client
            .post(&self.fetch_url)
            .json(input)
            .send()
            .await
            .map_err(|e| ChainError::ConnectionFailed {
                url: self.fetch_url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ChainError::DecodeError(e.to_string()))?;

        if status != StatusCode::OK {
            let error: PepperErrorResponse = serde_json::from_slice(&body)
                .map_err(|e| ChainError::DecodeError(e.to_string()))?;
            warn!("Pepper service rejected sign-in: {} {}", status, error.message);
            return Err(ChainError::Rejected {
                status: status.as_u16(),
                message: error.message,
            });
        }

        let pepper: PepperResponse =
            serde_json::from_slice(&body).map_err(|e| ChainError::DecodeError(e.to_string()))?;
        Ok(pepper.address)
    }
}
