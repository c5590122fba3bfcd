//! Storage trait abstraction
//!
//! Async domain traits for the two relations this service owns, enabling
//! Postgres-primary with in-memory fallback via enum dispatch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use simtrack_core::{
    DeliveryOutcome, DeviceReport, HistoryRecord, HistoryUpdate, RegistryFilter, RegistryRecord,
    ReturnReceipt, UpsertOutcome,
};

use crate::error::StorageError;

/// Generic paginated result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in the current page.
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// Offset from the start.
    pub offset: u64,
    /// Maximum items per page.
    pub limit: u64,
}

impl<T> Page<T> {
    /// Whether more items exist past this page.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.offset.saturating_add(self.limit) < self.total
    }
}

/// Operations on the service-history relation.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Insert a fresh record. Rejects with [`StorageError::Duplicate`] when
    /// an unevaluated record already tracks the same phone number.
    async fn insert_history(&self, record: &HistoryRecord) -> Result<(), StorageError>;

    /// Get record by ID.
    async fn get_history(&self, id: &str) -> Result<Option<HistoryRecord>, StorageError>;

    /// Find the unevaluated record tracking a phone number, if any.
    async fn find_history_by_phone(
        &self,
        phone_number: &str,
    ) -> Result<Option<HistoryRecord>, StorageError>;

    /// List records with pagination, newest first.
    async fn list_history(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Page<HistoryRecord>, StorageError>;

    /// Plain unevaluated scan, oldest first. Used by the CRUD surface; the
    /// engine's canonical working set is [`Self::active_working_set`].
    async fn list_unevaluated(&self, limit: u64) -> Result<Vec<HistoryRecord>, StorageError>;

    /// Unevaluated records whose linked device number is still active:
    /// inner join against the registry on `sn_prefix + phone_number`,
    /// oldest first.
    async fn active_working_set(
        &self,
        sn_prefix: &str,
        limit: u64,
    ) -> Result<Vec<HistoryRecord>, StorageError>;

    /// Persist the provider's return confirmation. Must be written before
    /// any delivery attempt for the record.
    async fn record_return(&self, id: &str, receipt: &ReturnReceipt) -> Result<(), StorageError>;

    /// Persist one delivery attempt's outcome and raise `evaluated`.
    /// Overwrites the previous delivery code so intermediate attempts stay
    /// visible.
    async fn record_delivery(
        &self,
        id: &str,
        outcome: &DeliveryOutcome,
    ) -> Result<(), StorageError>;

    /// Apply a partial update. `evaluated` is ORed with the current value,
    /// never lowered. Returns the updated record, `None` on missing ID.
    async fn update_history(
        &self,
        id: &str,
        update: &HistoryUpdate,
    ) -> Result<Option<HistoryRecord>, StorageError>;

    /// Delete record by ID. Returns `true` if a row was deleted.
    async fn delete_history(&self, id: &str) -> Result<bool, StorageError>;
}

/// Operations on the device-number registry relation.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Insert-or-update keyed by `sn`: an existing row gets its status flags
    /// refreshed, a new `sn` gets a full row. Runs atomically.
    async fn upsert_device(&self, report: &DeviceReport) -> Result<UpsertOutcome, StorageError>;

    /// Get device by ID.
    async fn get_device(&self, id: &str) -> Result<Option<RegistryRecord>, StorageError>;

    /// Find device by its serial-number business key.
    async fn find_device_by_sn(&self, sn: &str) -> Result<Option<RegistryRecord>, StorageError>;

    /// List devices with filters and pagination, newest first.
    async fn list_devices(
        &self,
        filter: &RegistryFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Page<RegistryRecord>, StorageError>;

    /// One fixed-size page of the registry in stable (creation) order, for
    /// the cleanup pager. A short page signals the end of the scan.
    async fn registry_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<RegistryRecord>, StorageError>;

    /// Stamp the provider batch and its status onto a device row.
    async fn assign_batch(
        &self,
        id: &str,
        batch_id: &str,
        status: &str,
    ) -> Result<(), StorageError>;

    /// Mark every registry row inactive. Returns the number of rows retired.
    async fn retire_all(&self) -> Result<u64, StorageError>;

    /// Delete device by ID. Returns `true` if a row was deleted.
    async fn delete_device(&self, id: &str) -> Result<bool, StorageError>;
}
