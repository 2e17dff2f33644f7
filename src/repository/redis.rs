//! Redis-backed key repository.
//!
//! Layout:
//! - `session_key:<id>`: the session key as a JSON string
//! - `address:<address>:session_keys`: set of key ids owned by the address

use crate::auth::types::{NewSessionKey, SessionKey};
use crate::repository::{new_key_id, KeyRepository, RepositoryError};
use async_trait::async_trait;
use log::{debug, info, warn};
use redis::{AsyncCommands, Client as RedisClient};
use std::sync::Arc;

/// Session-key store on a Redis server.
pub struct RedisKeyRepository {
    redis_client: Arc<RedisClient>,
}

impl RedisKeyRepository {
    pub fn new(redis_client: Arc<RedisClient>) -> Self {
        Self { redis_client }
    }

    /// Open a client for `redis_url`. No connection is made until first use.
    pub fn open(redis_url: &str) -> Result<Self, RepositoryError> {
        let client = RedisClient::open(redis_url)?;
        Ok(Self::new(Arc::new(client)))
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, RepositoryError> {
        Ok(self.redis_client.get_multiplexed_async_connection().await?)
    }

    // Redis key constructors
    fn session_key(&self, id: &str) -> String {
        format!("session_key:{}", id)
    }

    fn address_keys_key(&self, address: &str) -> String {
        format!("address:{}:session_keys", address)
    }
}

#[async_trait]
impl KeyRepository for RedisKeyRepository {
    async fn get(&self, id: &str) -> Result<Option<SessionKey>, RepositoryError> {
        let mut conn = self.connection().await?;
        let json: Option<String> = conn.get(self.session_key(id)).await?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn get_all_by_address(&self, address: &str) -> Result<Vec<SessionKey>, RepositoryError> {
        let mut conn = self.connection().await?;
        let ids: Vec<String> = conn.smembers(self.address_keys_key(address)).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let record_keys: Vec<String> = ids.iter().map(|id| self.session_key(id)).collect();
        let records: Vec<Option<String>> = conn.mget(record_keys).await?;

        let mut keys = Vec::with_capacity(records.len());
        for json in records.into_iter().flatten() {
            keys.push(serde_json::from_str(&json)?);
        }
        debug!("Found {} session keys for address {}", keys.len(), address);
        Ok(keys)
    }

    async fn create(&self, key: NewSessionKey) -> Result<SessionKey, RepositoryError> {
        let key = key.into_session_key(new_key_id());
        let json = serde_json::to_string(&key)?;

        let mut conn = self.connection().await?;
        let _: () = redis::pipe()
            .atomic()
            .set(self.session_key(&key.id), json)
            .ignore()
            .sadd(self.address_keys_key(&key.address), &key.id)
            .ignore()
            .query_async(&mut conn)
            .await?;

        info!(
            "Created session key {} for address {} on device {}",
            key.id, key.address, key.device_id
        );
        Ok(key)
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let mut conn = self.connection().await?;
        let json: Option<String> = conn.get(self.session_key(id)).await?;
        let Some(json) = json else {
            return Ok(());
        };

        // An unreadable record is still removed; its address index entry is
        // left for delete_all_by_address to sweep.
        let key: SessionKey = match serde_json::from_str(&json) {
            Ok(key) => key,
            Err(e) => {
                warn!("Deleting unreadable session key {}: {}", id, e);
                let _: () = conn.del(self.session_key(id)).await?;
                return Ok(());
            }
        };

        let _: () = redis::pipe()
            .atomic()
            .del(self.session_key(id))
            .ignore()
            .srem(self.address_keys_key(&key.address), id)
            .ignore()
            .query_async(&mut conn)
            .await?;

        info!("Deleted session key {} for address {}", id, key.address);
        Ok(())
    }

    async fn delete_all_by_address(&self, address: &str) -> Result<(), RepositoryError> {
        let mut conn = self.connection().await?;
        let index_key = self.address_keys_key(address);
        let ids: Vec<String> = conn.smembers(&index_key).await?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        for id in &ids {
            pipe.del(self.session_key(id)).ignore();
        }
        pipe.del(&index_key).ignore();
        let _: () = pipe.query_async(&mut conn).await?;

        if !ids.is_empty() {
            info!("Deleted {} session keys for address {}", ids.len(), address);
        }
        Ok(())
    }
}
