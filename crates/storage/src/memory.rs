//! In-memory storage backend.
//!
//! Same semantics as the Postgres backend, kept simple with linear scans.
//! Used by the test suite and by `--memory` dev mode; never intended for
//! production data.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use simtrack_core::{
    DeliveryOutcome, DeviceReport, HistoryRecord, HistoryUpdate, RegistryFilter, RegistryRecord,
    ReturnReceipt, UpsertOutcome,
};
use uuid::Uuid;

use crate::error::StorageError;
use crate::traits::{HistoryStore, Page, RegistryStore};

#[derive(Debug, Default)]
struct Inner {
    history: Vec<HistoryRecord>,
    registry: Vec<RegistryRecord>,
}

/// Process-local storage with the same trait surface as [`crate::PgStore`].
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only happens after a panic in another test thread;
        // the data is still structurally sound.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn page_of<T: Clone>(sorted: &[T], offset: u64, limit: u64) -> Page<T> {
    let total = sorted.len() as u64;
    let items = sorted
        .iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .cloned()
        .collect();
    Page { items, total, offset, limit }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn insert_history(&self, record: &HistoryRecord) -> Result<(), StorageError> {
        let mut inner = self.lock();
        let collision = inner
            .history
            .iter()
            .any(|r| !r.evaluated && r.phone_number == record.phone_number);
        if collision {
            return Err(StorageError::Duplicate(format!(
                "pending history for phone number {} already exists",
                record.phone_number
            )));
        }
        inner.history.push(record.clone());
        Ok(())
    }

    async fn get_history(&self, id: &str) -> Result<Option<HistoryRecord>, StorageError> {
        Ok(self.lock().history.iter().find(|r| r.id == id).cloned())
    }

    async fn find_history_by_phone(
        &self,
        phone_number: &str,
    ) -> Result<Option<HistoryRecord>, StorageError> {
        Ok(self
            .lock()
            .history
            .iter()
            .find(|r| !r.evaluated && r.phone_number == phone_number)
            .cloned())
    }

    async fn list_history(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Page<HistoryRecord>, StorageError> {
        let mut records = self.lock().history.clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_of(&records, offset, limit))
    }

    async fn list_unevaluated(&self, limit: u64) -> Result<Vec<HistoryRecord>, StorageError> {
        let mut records: Vec<HistoryRecord> =
            self.lock().history.iter().filter(|r| !r.evaluated).cloned().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        records.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(records)
    }

    async fn active_working_set(
        &self,
        sn_prefix: &str,
        limit: u64,
    ) -> Result<Vec<HistoryRecord>, StorageError> {
        let inner = self.lock();
        let mut records: Vec<HistoryRecord> = inner
            .history
            .iter()
            .filter(|r| !r.evaluated)
            .filter(|r| {
                let sn = format!("{sn_prefix}{}", r.phone_number);
                inner.registry.iter().any(|d| d.active && d.sn == sn)
            })
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        records.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(records)
    }

    async fn record_return(&self, id: &str, receipt: &ReturnReceipt) -> Result<(), StorageError> {
        let mut inner = self.lock();
        let record = inner.history.iter_mut().find(|r| r.id == id).ok_or_else(|| {
            StorageError::NotFound { entity: "history", id: id.to_owned() }
        })?;
        record.is_returned = receipt.is_returned;
        record.returned_at.clone_from(&receipt.returned_at);
        record.remark.clone_from(&receipt.remark);
        record.remark_at.clone_from(&receipt.remark_at);
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn record_delivery(
        &self,
        id: &str,
        outcome: &DeliveryOutcome,
    ) -> Result<(), StorageError> {
        let mut inner = self.lock();
        let record = inner.history.iter_mut().find(|r| r.id == id).ok_or_else(|| {
            StorageError::NotFound { entity: "history", id: id.to_owned() }
        })?;
        record.last_message = Some(outcome.message.clone());
        record.last_delivery_code = Some(outcome.code);
        record.evaluated = true;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn update_history(
        &self,
        id: &str,
        update: &HistoryUpdate,
    ) -> Result<Option<HistoryRecord>, StorageError> {
        let mut inner = self.lock();
        let Some(record) = inner.history.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(is_returned) = update.is_returned {
            record.is_returned = is_returned;
        }
        if let Some(ref returned_at) = update.returned_at {
            record.returned_at = Some(returned_at.clone());
        }
        if let Some(ref remark) = update.remark {
            record.remark = Some(remark.clone());
        }
        if let Some(ref remark_at) = update.remark_at {
            record.remark_at = Some(remark_at.clone());
        }
        if let Some(ref last_message) = update.last_message {
            record.last_message = Some(last_message.clone());
        }
        if let Some(last_delivery_code) = update.last_delivery_code {
            record.last_delivery_code = Some(last_delivery_code);
        }
        // Monotonic: evaluated can be raised, never lowered.
        record.evaluated = record.evaluated || update.evaluated.unwrap_or(false);
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn delete_history(&self, id: &str) -> Result<bool, StorageError> {
        let mut inner = self.lock();
        let before = inner.history.len();
        inner.history.retain(|r| r.id != id);
        Ok(inner.history.len() < before)
    }
}

#[async_trait]
impl RegistryStore for MemoryStore {
    async fn upsert_device(&self, report: &DeviceReport) -> Result<UpsertOutcome, StorageError> {
        let mut inner = self.lock();
        if let Some(record) = inner.registry.iter_mut().find(|r| r.sn == report.sn) {
            record.st_status.clone_from(&report.st);
            record.active = report.active;
            record.slot_active.clone_from(&report.slot_active);
            record.updated_at = Utc::now();
            return Ok(UpsertOutcome::Updated(record.clone()));
        }
        let now = Utc::now();
        let record = RegistryRecord {
            id: Uuid::new_v4().to_string(),
            port: report.port.clone(),
            iccid: report.iccid.clone(),
            imei: report.imei.clone(),
            imsi: report.imsi.clone(),
            sn: report.sn.clone(),
            status: "0".to_owned(),
            batch_id: None,
            active: report.active,
            st_status: report.st.clone(),
            slot_active: report.slot_active.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.registry.push(record.clone());
        Ok(UpsertOutcome::Inserted(record))
    }

    async fn get_device(&self, id: &str) -> Result<Option<RegistryRecord>, StorageError> {
        Ok(self.lock().registry.iter().find(|r| r.id == id).cloned())
    }

    async fn find_device_by_sn(&self, sn: &str) -> Result<Option<RegistryRecord>, StorageError> {
        Ok(self.lock().registry.iter().find(|r| r.sn == sn).cloned())
    }

    async fn list_devices(
        &self,
        filter: &RegistryFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Page<RegistryRecord>, StorageError> {
        let mut records: Vec<RegistryRecord> =
            self.lock().registry.iter().filter(|r| filter.matches(r)).cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_of(&records, offset, limit))
    }

    async fn registry_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<RegistryRecord>, StorageError> {
        let mut records = self.lock().registry.clone();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(records
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    async fn assign_batch(
        &self,
        id: &str,
        batch_id: &str,
        status: &str,
    ) -> Result<(), StorageError> {
        let mut inner = self.lock();
        let record = inner.registry.iter_mut().find(|r| r.id == id).ok_or_else(|| {
            StorageError::NotFound { entity: "device", id: id.to_owned() }
        })?;
        record.batch_id = Some(batch_id.to_owned());
        record.status = status.to_owned();
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn retire_all(&self) -> Result<u64, StorageError> {
        let mut inner = self.lock();
        let mut retired = 0u64;
        for record in inner.registry.iter_mut().filter(|r| r.active) {
            record.active = false;
            record.updated_at = Utc::now();
            retired += 1;
        }
        Ok(retired)
    }

    async fn delete_device(&self, id: &str) -> Result<bool, StorageError> {
        let mut inner = self.lock();
        let before = inner.registry.len();
        inner.registry.retain(|r| r.id != id);
        Ok(inner.registry.len() < before)
    }
}
