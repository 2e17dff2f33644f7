//! Session-key revocation.
//!
//! Ownership is scoped by address: a caller may revoke its own key, or any
//! other key owned by the same address (managing its other devices). Keys of
//! other addresses are never reachable.

use crate::auth::error::AuthError;
use crate::auth::types::SessionKey;
use crate::repository::KeyRepository;
use log::{info, warn};
use std::sync::Arc;

pub struct RevocationAuthority {
    repository: Arc<dyn KeyRepository>,
}

impl RevocationAuthority {
    pub fn new(repository: Arc<dyn KeyRepository>) -> Self {
        Self { repository }
    }

    /// Revoke `target_id` on behalf of `caller`.
    pub async fn revoke(&self, caller: &SessionKey, target_id: &str) -> Result<(), AuthError> {
        if target_id != caller.id {
            let target = self
                .repository
                .get(target_id)
                .await?
                .ok_or_else(|| AuthError::NotFound {
                    id: target_id.to_string(),
                })?;

            if target.address != caller.address {
                warn!(
                    "Session key {} denied revoking key {} of another address",
                    caller.id, target_id
                );
                return Err(AuthError::PermissionDenied);
            }
        }

        self.repository.delete(target_id).await?;
        info!("Session key {} revoked by {}", target_id, caller.id);
        Ok(())
    }

    /// Every key owned by the caller's address, the caller's own included.
    pub async fn list_associated(&self, caller: &SessionKey) -> Result<Vec<SessionKey>, AuthError> {
        Ok(self.repository.get_all_by_address(&caller.address).await?)
    }
}
