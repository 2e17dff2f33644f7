//! Session-key persistence.
//!
//! The engine only talks to storage through [`KeyRepository`]. Two
//! implementations ship with the crate:
//!
//! - [`RedisKeyRepository`] for deployments, one JSON record per key plus a
//!   per-address index set.
//! - [`InMemoryKeyRepository`] for tests and local development.
//!
//! Neither offers compare-and-swap, so "delete all keys for an address, then
//! create one" can race with a concurrent sign-in for the same address.

pub mod memory;
pub mod redis;

pub use self::memory::InMemoryKeyRepository;
pub use self::redis::RedisKeyRepository;

use crate::auth::types::{NewSessionKey, SessionKey};
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a repository backend.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Redis operation failed: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

/// Durable store of issued session keys.
#[async_trait]
pub trait KeyRepository: Send + Sync {
    /// Fetch a key by id. `Ok(None)` when it does not exist.
    async fn get(&self, id: &str) -> Result<Option<SessionKey>, RepositoryError>;

    /// All keys owned by an address.
    async fn get_all_by_address(&self, address: &str) -> Result<Vec<SessionKey>, RepositoryError>;

    /// Persist a new key and assign its id.
    async fn create(&self, key: NewSessionKey) -> Result<SessionKey, RepositoryError>;

    /// Delete a key by id. Deleting a missing key is not an error.
    async fn delete(&self, id: &str) -> Result<(), RepositoryError>;

    /// Delete every key owned by an address.
    async fn delete_all_by_address(&self, address: &str) -> Result<(), RepositoryError>;
}

/// Generate a new session key id.
pub(crate) fn new_key_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
