//! In-process key repository.

use crate::auth::types::{NewSessionKey, SessionKey};
use crate::repository::{new_key_id, KeyRepository, RepositoryError};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

#[derive(Default)]
struct Store {
    keys: HashMap<String, SessionKey>,
    by_address: HashMap<String, BTreeSet<String>>,
}

/// Key repository held entirely in memory. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryKeyRepository {
    store: RwLock<Store>,
}

impl InMemoryKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.store.read().await.keys.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl KeyRepository for InMemoryKeyRepository {
    async fn get(&self, id: &str) -> Result<Option<SessionKey>, RepositoryError> {
        Ok(self.store.read().await.keys.get(id).cloned())
    }

    async fn get_all_by_address(&self, address: &str) -> Result<Vec<SessionKey>, RepositoryError> {
        let store = self.store.read().await;
        let keys = store
            .by_address
            .get(address)
            .into_iter()
            .flatten()
            .filter_map(|id| store.keys.get(id).cloned())
            .collect();
        Ok(keys)
    }

    async fn create(&self, key: NewSessionKey) -> Result<SessionKey, RepositoryError> {
        let key = key.into_session_key(new_key_id());
        let mut store = self.store.write().await;
        store
            .by_address
            .entry(key.address.clone())
            .or_default()
            .insert(key.id.clone());
        store.keys.insert(key.id.clone(), key.clone());
        Ok(key)
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let mut store = self.store.write().await;
        if let Some(key) = store.keys.remove(id) {
            if let Some(ids) = store.by_address.get_mut(&key.address) {
                ids.remove(id);
                if ids.is_empty() {
                    store.by_address.remove(&key.address);
                }
            }
        }
        Ok(())
    }

    async fn delete_all_by_address(&self, address: &str) -> Result<(), RepositoryError> {
        let mut store = self.store.write().await;
        if let Some(ids) = store.by_address.remove(address) {
            for id in ids {
                store.keys.remove(&id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_key(address: &str, device_id: &str) -> NewSessionKey {
        NewSessionKey {
            address: address.to_string(),
            chain_name: "aptos".to_string(),
            root_public_key: "0020aa".to_string(),
            ephemeral_public_key: None,
            device_id: device_id.to_string(),
            expires_at_secs: None,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_unique_ids() {
        let repo = InMemoryKeyRepository::new();
        let a = repo.create(new_key("addr1", "dev1")).await.unwrap();
        let b = repo.create(new_key("addr1", "dev1")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(repo.get(&a.id).await.unwrap(), Some(a));
        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn test_address_index() {
        let repo = InMemoryKeyRepository::new();
        let a = repo.create(new_key("addr1", "dev1")).await.unwrap();
        let _b = repo.create(new_key("addr1", "dev2")).await.unwrap();
        let c = repo.create(new_key("addr2", "dev1")).await.unwrap();

        assert_eq!(repo.get_all_by_address("addr1").await.unwrap().len(), 2);

        repo.delete(&a.id).await.unwrap();
        assert_eq!(repo.get(&a.id).await.unwrap(), None);
        assert_eq!(repo.get_all_by_address("addr1").await.unwrap().len(), 1);

        repo.delete_all_by_address("addr1").await.unwrap();
        assert!(repo.get_all_by_address("addr1").await.unwrap().is_empty());
        assert_eq!(repo.get_all_by_address("addr2").await.unwrap(), vec![c]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let repo = InMemoryKeyRepository::new();
        repo.delete("missing").await.unwrap();
        repo.delete_all_by_address("nobody").await.unwrap();
        assert!(repo.is_empty().await);
    }
}
