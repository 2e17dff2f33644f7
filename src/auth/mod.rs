//! Session credentials for wallet clients.
//!
//! Clients prove control of a key instead of a password and receive a bearer
//! token bound to a persisted [`SessionKey`].
//!
//! ```text
//! SignInInput ──▶ ChainResolver ─┐
//!                                ├─▶ KeyRepository.create ──▶ token (HS256)
//! AnonymousSignInInput ──▶ verifier ──▶ derive_address ─┘
//!
//! token ──▶ TokenValidator ──▶ KeyRepository.get(aud) ──▶ SessionKey
//! ```

pub mod address;
pub mod engine;
pub mod error;
pub mod request;
pub mod revocation;
pub mod token;
pub mod types;
pub mod verifier;

pub use address::derive_address;
pub use engine::IssuanceEngine;
pub use error::AuthError;
pub use request::{bearer_token, NoRequestVerifier, RequestContext, RequestVerifier};
pub use revocation::RevocationAuthority;
pub use token::{mint_token, TokenValidator};
pub use types::{
    AnonymousSignInInput, NewSessionKey, SessionKey, SignInInput, SignInOutput, TokenClaims,
};
pub use verifier::{verify_anonymous, verify_challenge, verify_delegation};
