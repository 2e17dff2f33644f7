//! Address derivation for keys that sign in without a chain round-trip.

use crate::auth::error::AuthError;
use sha3::{Digest, Sha3_256};

/// Scheme tag appended to the public key before hashing (single-key scheme).
pub const SINGLE_KEY_SCHEME: u8 = 2;

/// Derive the canonical address for a hex-encoded public key.
///
/// `address = hex(SHA3-256(public_key_bytes || 0x02))`. The key bytes are hashed
/// exactly as they arrive on the wire, scheme prefix included.
pub fn derive_address(public_key_hex: &str) -> Result<String, AuthError> {
    let public_key = hex::decode(public_key_hex).map_err(|_| AuthError::Decode {
        field: "public_key",
    })?;

    let mut hasher = Sha3_256::new();
    hasher.update(&public_key);
    hasher.update([SINGLE_KEY_SCHEME]);

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_address_is_deterministic() {
        let key = format!("0020{}", "11".repeat(32));
        let first = derive_address(&key).unwrap();
        let second = derive_address(&key).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_derive_address_distinguishes_keys() {
        let a = derive_address(&"11".repeat(32)).unwrap();
        let b = derive_address(&"12".repeat(32)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_derive_address_matches_manual_hash() {
        let key_bytes = [0xABu8; 34];
        let mut payload = key_bytes.to_vec();
        payload.push(2);
        let expected = hex::encode(Sha3_256::digest(&payload));

        assert_eq!(derive_address(&hex::encode(key_bytes)).unwrap(), expected);
    }

    #[test]
    fn test_derive_address_rejects_bad_hex() {
        assert!(matches!(
            derive_address("zz"),
            Err(AuthError::Decode { field: "public_key" })
        ));
    }
}
