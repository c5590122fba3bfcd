//! CRUD surface over the device-number registry.

use std::sync::Arc;

use simtrack_core::{RegistryFilter, RegistryRecord};
use simtrack_storage::traits::RegistryStore;
use simtrack_storage::{Page, StorageBackend, StorageError};

use crate::error::ServiceError;

pub struct RegistryService {
    storage: Arc<StorageBackend>,
}

impl RegistryService {
    #[must_use]
    pub fn new(storage: Arc<StorageBackend>) -> Self {
        Self { storage }
    }

    pub async fn list(
        &self,
        filter: RegistryFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Page<RegistryRecord>, ServiceError> {
        Ok(self.storage.list_devices(&filter, offset, limit).await?)
    }

    pub async fn get(&self, id: &str) -> Result<RegistryRecord, ServiceError> {
        self.storage
            .get_device(id)
            .await?
            .ok_or_else(|| StorageError::NotFound { entity: "device", id: id.to_owned() }.into())
    }

    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        if self.storage.delete_device(id).await? {
            Ok(())
        } else {
            Err(StorageError::NotFound { entity: "device", id: id.to_owned() }.into())
        }
    }

    /// Retire every number from the active pool. Retired rows are deleted at
    /// the provider by the next cleanup pass, not here.
    pub async fn retire_all(&self) -> Result<u64, ServiceError> {
        let retired = self.storage.retire_all().await?;
        tracing::info!(retired, "retired all registry numbers");
        Ok(retired)
    }
}
