//! Unified storage backend with enum dispatch.

use async_trait::async_trait;
use simtrack_core::{
    DeliveryOutcome, DeviceReport, HistoryRecord, HistoryUpdate, RegistryFilter, RegistryRecord,
    ReturnReceipt, UpsertOutcome,
};

use crate::error::StorageError;
use crate::traits::{HistoryStore, Page, RegistryStore};

macro_rules! dispatch {
    ($self:expr, $trait:path, $method:ident ( $($arg:expr),* $(,)? )) => {
        match *$self {
            StorageBackend::Postgres(ref s) => <crate::pg::PgStore as $trait>::$method(s, $($arg),*).await,
            StorageBackend::Memory(ref s) => <crate::memory::MemoryStore as $trait>::$method(s, $($arg),*).await,
        }
    };
}

#[derive(Clone, Debug)]
pub enum StorageBackend {
    Postgres(crate::pg::PgStore),
    Memory(crate::memory::MemoryStore),
}

impl StorageBackend {
    pub async fn new_postgres(database_url: &str) -> Result<Self, StorageError> {
        Ok(Self::Postgres(crate::pg::PgStore::new(database_url).await?))
    }

    #[must_use]
    pub fn new_memory() -> Self {
        Self::Memory(crate::memory::MemoryStore::new())
    }
}

// ── HistoryStore ─────────────────────────────────────────────────

#[async_trait]
impl HistoryStore for StorageBackend {
    async fn insert_history(&self, record: &HistoryRecord) -> Result<(), StorageError> {
        dispatch!(self, HistoryStore, insert_history(record))
    }

    async fn get_history(&self, id: &str) -> Result<Option<HistoryRecord>, StorageError> {
        dispatch!(self, HistoryStore, get_history(id))
    }

    async fn find_history_by_phone(
        &self,
        phone_number: &str,
    ) -> Result<Option<HistoryRecord>, StorageError> {
        dispatch!(self, HistoryStore, find_history_by_phone(phone_number))
    }

    async fn list_history(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Page<HistoryRecord>, StorageError> {
        dispatch!(self, HistoryStore, list_history(offset, limit))
    }

    async fn list_unevaluated(&self, limit: u64) -> Result<Vec<HistoryRecord>, StorageError> {
        dispatch!(self, HistoryStore, list_unevaluated(limit))
    }

    async fn active_working_set(
        &self,
        sn_prefix: &str,
        limit: u64,
    ) -> Result<Vec<HistoryRecord>, StorageError> {
        dispatch!(self, HistoryStore, active_working_set(sn_prefix, limit))
    }

    async fn record_return(&self, id: &str, receipt: &ReturnReceipt) -> Result<(), StorageError> {
        dispatch!(self, HistoryStore, record_return(id, receipt))
    }

    async fn record_delivery(
        &self,
        id: &str,
        outcome: &DeliveryOutcome,
    ) -> Result<(), StorageError> {
        dispatch!(self, HistoryStore, record_delivery(id, outcome))
    }

    async fn update_history(
        &self,
        id: &str,
        update: &HistoryUpdate,
    ) -> Result<Option<HistoryRecord>, StorageError> {
        dispatch!(self, HistoryStore, update_history(id, update))
    }

    async fn delete_history(&self, id: &str) -> Result<bool, StorageError> {
        dispatch!(self, HistoryStore, delete_history(id))
    }
}

// ── RegistryStore ────────────────────────────────────────────────

#[async_trait]
impl RegistryStore for StorageBackend {
    async fn upsert_device(&self, report: &DeviceReport) -> Result<UpsertOutcome, StorageError> {
        dispatch!(self, RegistryStore, upsert_device(report))
    }

    async fn get_device(&self, id: &str) -> Result<Option<RegistryRecord>, StorageError> {
        dispatch!(self, RegistryStore, get_device(id))
    }

    async fn find_device_by_sn(&self, sn: &str) -> Result<Option<RegistryRecord>, StorageError> {
        dispatch!(self, RegistryStore, find_device_by_sn(sn))
    }

    async fn list_devices(
        &self,
        filter: &RegistryFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Page<RegistryRecord>, StorageError> {
        dispatch!(self, RegistryStore, list_devices(filter, offset, limit))
    }

    async fn registry_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<RegistryRecord>, StorageError> {
        dispatch!(self, RegistryStore, registry_page(offset, limit))
    }

    async fn assign_batch(
        &self,
        id: &str,
        batch_id: &str,
        status: &str,
    ) -> Result<(), StorageError> {
        dispatch!(self, RegistryStore, assign_batch(id, batch_id, status))
    }

    async fn retire_all(&self) -> Result<u64, StorageError> {
        dispatch!(self, RegistryStore, retire_all())
    }

    async fn delete_device(&self, id: &str) -> Result<bool, StorageError> {
        dispatch!(self, RegistryStore, delete_device(id))
    }
}
