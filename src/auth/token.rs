//! Session token minting and validation.
//!
//! Tokens are HMAC-signed JWTs:
//!
//! ```text
//! { iss: <issuer>, aud: <session key id>, sub: "<address>.<device_id>", iat, exp? }
//! ```
//!
//! The token's own `exp` claim is informational. What decides whether a
//! caller is still authenticated is the persisted key's `expires_at_secs`,
//! checked in [`TokenValidator::authenticate`]. Expiring or revoking a key
//! therefore never requires reissuing or blacklisting tokens.

use crate::auth::error::AuthError;
use crate::auth::request::{RequestContext, RequestVerifier};
use crate::auth::types::{non_zero_expiry, SessionKey, TokenClaims};
use crate::config::AuthConfig;
use crate::repository::KeyRepository;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, warn};
use std::sync::Arc;

/// Algorithms accepted on presented tokens. Anything outside the HMAC family is refused.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Mint a token for a freshly created session key.
pub fn mint_token(
    config: &AuthConfig,
    key: &SessionKey,
    expires_at: Option<i64>,
    issued_at: i64,
) -> Result<String, AuthError> {
    let claims = TokenClaims {
        iss: config.issuer.clone(),
        aud: key.id.clone(),
        sub: format!("{}.{}", key.address, key.device_id),
        iat: issued_at,
        exp: non_zero_expiry(expires_at),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.shared_secret.as_bytes()),
    )
    .map_err(|e| AuthError::TokenEncoding(e.to_string()))
}

/// Resolves presented tokens to their session keys.
pub struct TokenValidator {
    repository: Arc<dyn KeyRepository>,
    config: AuthConfig,
}

impl TokenValidator {
    pub fn new(repository: Arc<dyn KeyRepository>, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Verify signature, algorithm and issuer, and return the claims.
    pub fn decode_claims(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["iss", "aud", "sub"]);
        validation.set_issuer(&[self.config.issuer.as_str()]);

        let data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.config.shared_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            warn!("Rejected session token: {}", e);
            AuthError::from(e)
        })?;

        Ok(data.claims)
    }

    /// Resolve a token to the session key named by its audience.
    ///
    /// A token for a key that no longer exists is an authentication failure.
    pub async fn resolve(&self, token: &str) -> Result<SessionKey, AuthError> {
        let claims = self.decode_claims(token)?;

        debug!("Resolving session key {}", claims.aud);
        self.repository
            .get(&claims.aud)
            .await?
            .ok_or_else(|| AuthError::Unauthenticated("unknown session key".to_string()))
    }

    /// Full request authentication: token, record expiry, then request verification.
    pub async fn authenticate(
        &self,
        token: &str,
        request: &RequestContext,
        verifier: &dyn RequestVerifier,
    ) -> Result<SessionKey, AuthError> {
        if token.is_empty() {
            return Err(AuthError::Unauthenticated("missing token".to_string()));
        }

        let key = self.resolve(token).await?;

        if key.is_expired(Utc::now().timestamp()) {
            warn!("Session key {} has expired", key.id);
            return Err(AuthError::Unauthenticated("session key expired".to_string()));
        }

        if !verifier.verify_request(request, &key) {
            warn!("Request verification failed for session key {}", key.id);
            return Err(AuthError::Unauthenticated("request verification failed".to_string()));
        }

        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::request::NoRequestVerifier;
    use crate::auth::types::NewSessionKey;
    use crate::repository::InMemoryKeyRepository;

    const NONE_HEADER: &str = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0";
    const RS256_HEADER: &str = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9";

    fn config() -> AuthConfig {
        AuthConfig::new("issuer.test", "shared-secret", true)
    }

    async fn stored_key(repo: &InMemoryKeyRepository, expires_at_secs: Option<i64>) -> SessionKey {
        repo.create(NewSessionKey {
            address: "addr1".to_string(),
            chain_name: "aptos".to_string(),
            root_public_key: "0020aa".to_string(),
            ephemeral_public_key: None,
            device_id: "dev1".to_string(),
            expires_at_secs,
        })
        .await
        .unwrap()
    }

    fn replace_header(token: &str, header: &str) -> String {
        let (_, rest) = token.split_once('.').unwrap();
        format!("{}.{}", header, rest)
    }

    struct RejectAll;

    impl RequestVerifier for RejectAll {
        fn verify_request(&self, _request: &RequestContext, _key: &SessionKey) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_resolve_minted_token() {
        let repo = Arc::new(InMemoryKeyRepository::new());
        let key = stored_key(&repo, None).await;
        let validator = TokenValidator::new(repo.clone(), config());

        let token = mint_token(&config(), &key, None, Utc::now().timestamp()).unwrap();
        let claims = validator.decode_claims(&token).unwrap();
        assert_eq!(claims.aud, key.id);
        assert_eq!(claims.sub, "addr1.dev1");
        assert_eq!(claims.exp, None);

        assert_eq!(validator.resolve(&token).await.unwrap(), key);
    }

    #[tokio::test]
    async fn test_zero_expiry_omits_exp_claim() {
        let repo = Arc::new(InMemoryKeyRepository::new());
        let key = stored_key(&repo, None).await;
        let validator = TokenValidator::new(repo.clone(), config());

        let token = mint_token(&config(), &key, Some(0), 1).unwrap();
        assert_eq!(validator.decode_claims(&token).unwrap().exp, None);
    }

    #[tokio::test]
    async fn test_past_exp_claim_still_resolves() {
        let repo = Arc::new(InMemoryKeyRepository::new());
        let key = stored_key(&repo, None).await;
        let validator = TokenValidator::new(repo.clone(), config());

        let long_ago = Utc::now().timestamp() - 86_400;
        let token = mint_token(&config(), &key, Some(long_ago), long_ago - 60).unwrap();
        assert_eq!(validator.resolve(&token).await.unwrap().id, key.id);
    }

    #[tokio::test]
    async fn test_wrong_secret_or_issuer_is_rejected() {
        let repo = Arc::new(InMemoryKeyRepository::new());
        let key = stored_key(&repo, None).await;
        let validator = TokenValidator::new(repo.clone(), config());

        let other_secret = AuthConfig::new("issuer.test", "other-secret", true);
        let token = mint_token(&other_secret, &key, None, 1).unwrap();
        assert!(matches!(validator.resolve(&token).await, Err(AuthError::TokenInvalid(_))));

        let other_issuer = AuthConfig::new("someone-else", "shared-secret", true);
        let token = mint_token(&other_issuer, &key, None, 1).unwrap();
        assert!(matches!(validator.resolve(&token).await, Err(AuthError::TokenInvalid(_))));
    }

    #[tokio::test]
    async fn test_non_hmac_algorithms_are_rejected() {
        let repo = Arc::new(InMemoryKeyRepository::new());
        let key = stored_key(&repo, None).await;
        let validator = TokenValidator::new(repo.clone(), config());
        let token = mint_token(&config(), &key, None, 1).unwrap();

        for header in [NONE_HEADER, RS256_HEADER] {
            let forged = replace_header(&token, header);
            assert!(matches!(validator.resolve(&forged).await, Err(AuthError::TokenInvalid(_))));
        }
        assert!(matches!(validator.resolve("garbage").await, Err(AuthError::TokenInvalid(_))));
    }

    #[tokio::test]
    async fn test_other_hmac_variants_are_accepted() {
        let repo = Arc::new(InMemoryKeyRepository::new());
        let key = stored_key(&repo, None).await;
        let validator = TokenValidator::new(repo.clone(), config());

        let claims = TokenClaims {
            iss: "issuer.test".to_string(),
            aud: key.id.clone(),
            sub: "addr1.dev1".to_string(),
            iat: 1,
            exp: None,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"shared-secret"),
        )
        .unwrap();
        assert_eq!(validator.resolve(&token).await.unwrap().id, key.id);
    }

    #[tokio::test]
    async fn test_unknown_key_is_unauthenticated() {
        let repo = Arc::new(InMemoryKeyRepository::new());
        let key = stored_key(&repo, None).await;
        let validator = TokenValidator::new(repo.clone(), config());
        let token = mint_token(&config(), &key, None, 1).unwrap();

        repo.delete(&key.id).await.unwrap();
        assert!(matches!(validator.resolve(&token).await, Err(AuthError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn test_authenticate_enforces_record_expiry() {
        let repo = Arc::new(InMemoryKeyRepository::new());
        let now = Utc::now().timestamp();
        let live = stored_key(&repo, Some(now + 3600)).await;
        let expired = stored_key(&repo, Some(now - 1)).await;
        let validator = TokenValidator::new(repo.clone(), config());
        let request = RequestContext::default();

        // Neither token carries an exp claim; only the records differ.
        let live_token = mint_token(&config(), &live, None, now).unwrap();
        let expired_token = mint_token(&config(), &expired, None, now).unwrap();

        assert_eq!(
            validator
                .authenticate(&live_token, &request, &NoRequestVerifier)
                .await
                .unwrap()
                .id,
            live.id
        );
        assert!(validator.resolve(&expired_token).await.is_ok());
        assert!(matches!(
            validator
                .authenticate(&expired_token, &request, &NoRequestVerifier)
                .await,
            Err(AuthError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn test_authenticate_rejections() {
        let repo = Arc::new(InMemoryKeyRepository::new());
        let key = stored_key(&repo, None).await;
        let validator = TokenValidator::new(repo.clone(), config());
        let token = mint_token(&config(), &key, None, 1).unwrap();
        let request = RequestContext::default();

        assert!(matches!(
            validator.authenticate("", &request, &NoRequestVerifier).await,
            Err(AuthError::Unauthenticated(_))
        ));
        assert!(matches!(
            validator.authenticate(&token, &request, &RejectAll).await,
            Err(AuthError::Unauthenticated(_))
        ));
    }
}
