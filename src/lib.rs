//! Session credentials for wallet clients that prove key possession.
//!
//! A client signs in either with a chain-specific proof (resolved to an
//! on-chain address by a [`chain::ChainResolver`]) or anonymously with an
//! Ed25519 key, optionally delegated to an ephemeral key. Either way it gets
//! back an HMAC-signed token bound to a persisted [`auth::SessionKey`].

// Key issuance, validation and revocation
pub mod auth;

// Chain-specific address resolution
pub mod chain;

// Process configuration
pub mod config;

// HTTP routes
pub mod http;

// Session-key persistence
pub mod repository;

pub use auth::{AuthError, IssuanceEngine, RevocationAuthority, SessionKey, TokenValidator};
pub use config::AuthConfig;
