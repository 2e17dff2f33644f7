//! Proof-of-possession checks for anonymous sign-in.
//!
//! A client proves control of its key by signing `timestamp ++ device_id`.
//! It may sign with an ephemeral key instead of its root key, provided the
//! root key has signed the ephemeral key's bytes (a delegation certificate).
//!
//! The check is split into two steps so that a failed delegation and a failed
//! challenge surface as different errors:
//!
//! ```text
//! root ──signs──▶ ephemeral pk bytes      verify_delegation  → DelegationInvalid
//! signer ─signs─▶ timestamp ++ device_id  verify_challenge   → SignatureInvalid
//! ```

use crate::auth::error::AuthError;
use crate::auth::types::AnonymousSignInInput;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use log::warn;

/// Length of the scheme/version prefix carried by encoded public keys.
const KEY_PREFIX_LEN: usize = 2;

/// Verify that the root key delegated signing authority to the ephemeral key.
pub fn verify_delegation(
    root_public_key: &str,
    ephemeral_public_key: &str,
    delegation_signature: &str,
) -> Result<(), AuthError> {
    let root_bytes = decode_hex(root_public_key, "public_key")?;
    let ephemeral_bytes = decode_hex(ephemeral_public_key, "epk")?;
    let signature = decode_hex(delegation_signature, "epk_signature")?;

    if !verify_raw(&root_bytes, &ephemeral_bytes, &signature) {
        warn!("Delegation certificate rejected for ephemeral key");
        return Err(AuthError::DelegationInvalid);
    }
    Ok(())
}

/// Verify the challenge signature over `timestamp ++ device_id`.
pub fn verify_challenge(
    signing_public_key: &str,
    timestamp: &str,
    device_id: &str,
    signature: &str,
) -> Result<(), AuthError> {
    let key_bytes = decode_hex(signing_public_key, "public_key")?;
    let signature = decode_hex(signature, "signature")?;
    let message = challenge_message(timestamp, device_id);

    if !verify_raw(&key_bytes, &message, &signature) {
        warn!("Challenge signature rejected for device {}", device_id);
        return Err(AuthError::SignatureInvalid);
    }
    Ok(())
}

/// Run the full anonymous proof: optional delegation, then the challenge.
///
/// Returns the hex key that signed the challenge.
pub fn verify_anonymous(input: &AnonymousSignInInput) -> Result<&str, AuthError> {
    let signing_key = match non_empty(&input.ephemeral_public_key) {
        Some(ephemeral) => {
            let delegation =
                non_empty(&input.ephemeral_public_key_signature).ok_or(AuthError::DelegationInvalid)?;
            verify_delegation(&input.root_public_key, ephemeral, delegation)?;
            ephemeral
        }
        None => input.root_public_key.as_str(),
    };

    verify_challenge(signing_key, &input.timestamp, &input.device_id, &input.signature)?;
    Ok(signing_key)
}

/// The message a client signs to prove key possession.
pub fn challenge_message(timestamp: &str, device_id: &str) -> Vec<u8> {
    let mut message = Vec::with_capacity(timestamp.len() + device_id.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(device_id.as_bytes());
    message
}

/// Ed25519 check over an encoded key (prefix stripped) and a raw signature.
///
/// Wrong lengths count as a failed verification.
fn verify_raw(encoded_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Some(raw_key) = encoded_key.get(KEY_PREFIX_LEN..) else {
        return false;
    };
    let Ok(raw_key) = <[u8; 32]>::try_from(raw_key) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&raw_key) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    verifying_key.verify(message, &signature).is_ok()
}

fn decode_hex(value: &str, field: &'static str) -> Result<Vec<u8>, AuthError> {
    hex::decode(value).map_err(|_| AuthError::Decode { field })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
