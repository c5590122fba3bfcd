//! CRUD surface over the service-history relation.

use std::sync::Arc;

use simtrack_core::{HistoryRecord, HistoryUpdate, PendingNumber};
use simtrack_storage::traits::HistoryStore;
use simtrack_storage::{Page, StorageBackend, StorageError};
use uuid::Uuid;

use crate::error::ServiceError;

pub struct HistoryService {
    storage: Arc<StorageBackend>,
}

impl HistoryService {
    #[must_use]
    pub fn new(storage: Arc<StorageBackend>) -> Self {
        Self { storage }
    }

    pub async fn list(&self, offset: u64, limit: u64) -> Result<Page<HistoryRecord>, ServiceError> {
        Ok(self.storage.list_history(offset, limit).await?)
    }

    /// The unresolved view: records still awaiting a terminal outcome,
    /// oldest first, capped at `limit`.
    pub async fn unresolved(&self, limit: u64) -> Result<Vec<HistoryRecord>, ServiceError> {
        Ok(self.storage.list_unevaluated(limit).await?)
    }

    pub async fn get(&self, id: &str) -> Result<HistoryRecord, ServiceError> {
        self.storage
            .get_history(id)
            .await?
            .ok_or_else(|| StorageError::NotFound { entity: "history", id: id.to_owned() }.into())
    }

    /// Create a record for a manually reported pending number. Rejects a
    /// duplicate while an unevaluated record tracks the same phone.
    pub async fn create(&self, pending: PendingNumber) -> Result<HistoryRecord, ServiceError> {
        if pending.phone_number.trim().is_empty() {
            return Err(ServiceError::InvalidInput("phone number is required".to_owned()));
        }
        let record = HistoryRecord::from_pending(Uuid::new_v4().to_string(), &pending);
        self.storage.insert_history(&record).await?;
        Ok(record)
    }

    pub async fn update(
        &self,
        id: &str,
        update: HistoryUpdate,
    ) -> Result<HistoryRecord, ServiceError> {
        if update.is_empty() {
            return Err(ServiceError::InvalidInput("no fields to update".to_owned()));
        }
        self.storage
            .update_history(id, &update)
            .await?
            .ok_or_else(|| StorageError::NotFound { entity: "history", id: id.to_owned() }.into())
    }

    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        if self.storage.delete_history(id).await? {
            Ok(())
        } else {
            Err(StorageError::NotFound { entity: "history", id: id.to_owned() }.into())
        }
    }
}
