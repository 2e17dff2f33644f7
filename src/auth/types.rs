//! Types for session-key issuance and validation.

use serde::{Deserialize, Serialize};

/// A persisted session key.
///
/// This is the server-side record backing an issued token and the unit of
/// revocation. Records are never updated once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionKey {
    /// Opaque identifier assigned by the repository.
    pub id: String,

    /// Owner address. Several keys may share one address.
    pub address: String,

    /// Name of the chain resolver that produced `address`.
    pub chain_name: String,

    /// Hex-encoded root public key.
    pub root_public_key: String,

    /// Hex-encoded ephemeral public key delegated by the root key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_public_key: Option<String>,

    /// Client device discriminator.
    pub device_id: String,

    /// Absolute Unix expiry. `None` or `0` never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at_secs: Option<i64>,
}

impl SessionKey {
    /// The key downstream requests are expected to be signed with.
    pub fn signing_key(&self) -> &str {
        match self.ephemeral_public_key.as_deref() {
            Some(ephemeral) if !ephemeral.is_empty() => ephemeral,
            _ => &self.root_public_key,
        }
    }

    /// Whether the record is past its expiry at `now` (Unix seconds).
    pub fn is_expired(&self, now: i64) -> bool {
        match self.expires_at_secs {
            Some(expires_at) if expires_at != 0 => expires_at < now,
            _ => false,
        }
    }
}

/// Payload for creating a [`SessionKey`]; the repository assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSessionKey {
    pub address: String,
    pub chain_name: String,
    pub root_public_key: String,
    pub ephemeral_public_key: Option<String>,
    pub device_id: String,
    pub expires_at_secs: Option<i64>,
}

impl NewSessionKey {
    /// Attach a repository-assigned id.
    pub fn into_session_key(self, id: String) -> SessionKey {
        SessionKey {
            id,
            address: self.address,
            chain_name: self.chain_name,
            root_public_key: self.root_public_key,
            ephemeral_public_key: self.ephemeral_public_key,
            device_id: self.device_id,
            expires_at_secs: self.expires_at_secs,
        }
    }
}

/// Chain-specific sign-in proof.
///
/// Serialized field names follow the keyless pepper service request body,
/// so the resolver can forward the input as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInInput {
    /// Bearer identity token (base64 JWT from the identity provider).
    #[serde(rename = "jwt_b64")]
    pub id_token: String,

    /// Hex-encoded public key that will sign for this session.
    #[serde(rename = "epk")]
    pub public_key: String,

    /// Blinder binding the public key into the identity token nonce.
    #[serde(rename = "epk_blinder")]
    pub blinder: String,

    /// Requested expiry in Unix seconds, `0` for none.
    #[serde(rename = "exp_date_secs")]
    pub expires_at: i64,

    /// Identity-token claim used as the user identifier.
    pub uid_key: String,

    pub device_id: String,
}

/// Token returned by a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInOutput {
    pub token: String,
}

/// Proof of key possession for sign-in without an identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousSignInInput {
    /// Hex-encoded root public key, including its two-byte scheme prefix.
    #[serde(rename = "public_key")]
    pub root_public_key: String,

    /// Hex signature over `timestamp ++ device_id`.
    pub signature: String,

    pub timestamp: String,

    pub device_id: String,

    #[serde(rename = "exp_date_secs", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,

    /// Hex-encoded ephemeral public key that signed the challenge instead of the root key.
    #[serde(rename = "epk", default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_public_key: Option<String>,

    /// Root-key signature over the raw ephemeral public key bytes.
    #[serde(rename = "epk_signature", default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_public_key_signature: Option<String>,

    #[serde(rename = "epk_exp_date_secs", default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_expires_at: Option<i64>,
}

impl AnonymousSignInInput {
    /// Expiry to record for the issued key: the ephemeral expiry when present.
    pub fn session_expiry(&self) -> Option<i64> {
        self.ephemeral_expires_at.or(self.expires_at)
    }
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub iss: String,
    /// Session key id.
    pub aud: String,
    /// `address.device_id`
    pub sub: String,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Normalize an expiry hint: zero means "never".
pub(crate) fn non_zero_expiry(expires_at: Option<i64>) -> Option<i64> {
    expires_at.filter(|&secs| secs != 0)
}
