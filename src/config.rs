//! Process configuration.

use crate::chain::AptosNetwork;
use std::env;
use std::error::Error;

/// Settings the engine and validator are constructed with.
///
/// Immutable once built; there is no global configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Value of the `iss` claim on minted tokens and required on presented ones.
    pub issuer: String,
    /// HMAC secret tokens are signed with.
    pub shared_secret: String,
    /// When false, sign-in removes an address's existing keys first.
    pub allow_multiple_keys: bool,
}

impl AuthConfig {
    pub fn new(
        issuer: impl Into<String>,
        shared_secret: impl Into<String>,
        allow_multiple_keys: bool,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            shared_secret: shared_secret.into(),
            allow_multiple_keys,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub port: u16,
    pub redis_url: String,
    pub jwt_issuer: String,
    pub jwt_shared_secret: String,
    pub allow_multiple_keys: bool,
    pub aptos_network: AptosNetwork,
    pub apple_callback_path: Option<String>,
    pub apple_redirect_uri: Option<String>,
}

impl ServerSettings {
    /// Build settings from a variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_shared_secret = lookup("JWT_SHARED_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or("JWT_SHARED_SECRET must be set")?;

        Ok(ServerSettings {
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()?,
            redis_url: lookup("REDIS_URL").unwrap_or_else(|| "redis://localhost:6379".to_string()),
            jwt_issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "wallet-session".to_string()),
            jwt_shared_secret,
            allow_multiple_keys: lookup("ALLOW_MULTIPLE_KEYS")
                .unwrap_or_else(|| "false".to_string())
                .parse()
                .map_err(|_| "ALLOW_MULTIPLE_KEYS must be true or false")?,
            aptos_network: lookup("APTOS_NETWORK")
                .unwrap_or_else(|| "devnet".to_string())
                .parse()?,
            apple_callback_path: lookup("APPLE_CALLBACK_PATH").filter(|s| !s.is_empty()),
            apple_redirect_uri: lookup("APPLE_REDIRECT_URI").filter(|s| !s.is_empty()),
        })
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig::new(
            self.jwt_issuer.clone(),
            self.jwt_shared_secret.clone(),
            self.allow_multiple_keys,
        )
    }
}

/// Load settings from the process environment.
pub fn load_config() -> Result<ServerSettings, Box<dyn Error>> {
    ServerSettings::from_lookup(|name| env::var(name).ok())
}
