//! SMS-reception reconciliation engine.
//!
//! Drives the poll-evaluate-retry cycle: ingest the provider's wait list,
//! select history records whose device number is still active, check each for
//! received content, relay the latest gateway message back through the
//! provider with bounded retries, and mark records evaluated with the
//! outcome. A separate cleanup pass removes retired numbers from the
//! provider in pages.

use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use simtrack_core::{DeliveryOutcome, DialPlan, HistoryRecord, PendingNumber, ReturnReceipt};
use simtrack_goip::GoipClient;
use simtrack_provider::{ProviderClient, ProviderError};
use simtrack_storage::traits::{HistoryStore, RegistryStore};
use simtrack_storage::StorageBackend;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::retry::RetryPolicy;

/// Upper bound on records pulled into one cycle's working set.
const WORKING_SET_LIMIT: u64 = 100;

/// How many messages to read from a gateway port per check.
const SMS_FETCH_COUNT: u32 = 10;

/// Registry page size for the cleanup pass.
const CLEANUP_PAGE_SIZE: u64 = 100;

/// Terminal classification of one record within a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Provider has not confirmed content for this number yet.
    NotReturned,
    /// Content confirmed but the gateway port had no messages; the record
    /// stays unevaluated for the next cycle.
    NoMessages,
    /// Relay confirmed with a zero delivery code.
    Delivered,
    /// The provider rejected the dispatch outright on the first attempt.
    DispatchFailed,
    /// All attempts persisted a non-zero delivery code.
    Unconfirmed,
    /// The check or relay failed; recorded here, never propagated to
    /// sibling records.
    Failed(String),
}

/// Summary of one ingest step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub inserted: u64,
    pub duplicates: u64,
    pub failures: u64,
}

/// Summary of one reconciliation cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    /// True when the cycle was skipped because the previous one was still
    /// running.
    pub skipped: bool,
    pub ingest: IngestReport,
    pub checked: u64,
    pub delivered: u64,
    pub dispatch_failed: u64,
    pub unconfirmed: u64,
    pub not_returned: u64,
    pub no_messages: u64,
    pub failures: u64,
}

impl CycleReport {
    fn skipped() -> Self {
        Self { skipped: true, ..Self::default() }
    }

    fn count(&mut self, outcome: &RecordOutcome) {
        self.checked += 1;
        match *outcome {
            RecordOutcome::NotReturned => self.not_returned += 1,
            RecordOutcome::NoMessages => self.no_messages += 1,
            RecordOutcome::Delivered => self.delivered += 1,
            RecordOutcome::DispatchFailed => self.dispatch_failed += 1,
            RecordOutcome::Unconfirmed => self.unconfirmed += 1,
            RecordOutcome::Failed(_) => self.failures += 1,
        }
    }
}

/// Summary of one cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub pages_scanned: u64,
    pub deleted: u64,
    /// Pages whose provider delete failed; counted, never fatal.
    pub page_errors: u64,
}

/// The reconciliation engine. One instance per process; cycles are
/// serialized through an internal single-flight guard.
pub struct ReconcileService {
    storage: Arc<StorageBackend>,
    provider: Arc<ProviderClient>,
    goip: Arc<GoipClient>,
    dial_plan: DialPlan,
    country_id: String,
    retry: RetryPolicy,
    cycle_guard: tokio::sync::Mutex<()>,
}

impl ReconcileService {
    #[must_use]
    pub fn new(
        storage: Arc<StorageBackend>,
        provider: Arc<ProviderClient>,
        goip: Arc<GoipClient>,
        dial_plan: DialPlan,
        country_id: String,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            storage,
            provider,
            goip,
            dial_plan,
            country_id,
            retry,
            cycle_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Fetch the provider's wait list. Pure read, no writes.
    pub async fn fetch_pending(&self) -> Result<Vec<PendingNumber>, ServiceError> {
        Ok(self.provider.list_pending(&self.country_id).await?)
    }

    /// Mirror pending numbers into the history store. Each entry is an
    /// independent failure domain; a duplicate phone number is a soft
    /// reject, not an error.
    pub async fn ingest(&self, pending: &[PendingNumber]) -> IngestReport {
        let inserts = pending.iter().map(|p| async move {
            let record = HistoryRecord::from_pending(Uuid::new_v4().to_string(), p);
            self.storage.insert_history(&record).await
        });

        let mut report = IngestReport::default();
        for (pending, result) in pending.iter().zip(join_all(inserts).await) {
            match result {
                Ok(()) => report.inserted += 1,
                Err(e) if e.is_duplicate() => {
                    tracing::debug!(phone = %pending.phone_number, "pending number already tracked");
                    report.duplicates += 1;
                },
                Err(e) => {
                    tracing::warn!(phone = %pending.phone_number, error = %e, "ingest failed");
                    report.failures += 1;
                },
            }
        }
        report
    }

    /// Run one full reconciliation cycle. Returns a skipped report when the
    /// previous cycle is still in flight.
    pub async fn run_cycle(&self) -> Result<CycleReport, ServiceError> {
        let Ok(_guard) = self.cycle_guard.try_lock() else {
            tracing::debug!("previous cycle still running, skipping");
            return Ok(CycleReport::skipped());
        };

        let pending = self.fetch_pending().await?;
        let mut report = CycleReport { ingest: self.ingest(&pending).await, ..CycleReport::default() };

        let working_set = self
            .storage
            .active_working_set(self.dial_plan.prefix(), WORKING_SET_LIMIT)
            .await?;
        tracing::info!(records = working_set.len(), "selected working set");

        let outcomes =
            join_all(working_set.iter().map(|record| self.evaluate_record(record))).await;
        for (record, outcome) in working_set.iter().zip(&outcomes) {
            if let RecordOutcome::Failed(ref reason) = *outcome {
                tracing::warn!(id = %record.id, phone = %record.phone_number, %reason, "record failed");
            }
            report.count(outcome);
        }

        tracing::info!(
            checked = report.checked,
            delivered = report.delivered,
            failures = report.failures,
            "cycle complete"
        );
        Ok(report)
    }

    /// Check one record and relay its message if the provider confirmed
    /// reception. Errors are folded into the outcome at this boundary.
    pub async fn evaluate_record(&self, record: &HistoryRecord) -> RecordOutcome {
        match self.check_and_relay(record).await {
            Ok(outcome) => outcome,
            Err(e) => RecordOutcome::Failed(e.to_string()),
        }
    }

    async fn check_and_relay(&self, record: &HistoryRecord) -> Result<RecordOutcome, ServiceError> {
        let results = self
            .provider
            .query_result(&self.country_id, &record.phone_number, &record.item_id)
            .await?;
        let Some(result) = results.into_iter().next() else {
            return Ok(RecordOutcome::NotReturned);
        };
        if !result.phone_is_ret {
            return Ok(RecordOutcome::NotReturned);
        }

        // Persist the receipt before any delivery attempt so a crash
        // mid-retry cannot re-ingest this number as pending.
        let receipt = ReturnReceipt::from(result);
        self.storage.record_return(&record.id, &receipt).await?;

        let sn = self.dial_plan.to_sn(&record.phone_number);
        let Some(device) = self.storage.find_device_by_sn(&sn).await? else {
            return Ok(RecordOutcome::Failed(format!("no registry entry for sn {sn}")));
        };

        let messages = self.goip.fetch_messages(&device.port, SMS_FETCH_COUNT).await?;
        let Some(last) = messages.last() else {
            tracing::info!(id = %record.id, port = %device.port, "no messages on port yet");
            return Ok(RecordOutcome::NoMessages);
        };

        self.deliver_with_retry(record, &last.text).await
    }

    /// Relay content through the provider with bounded retries.
    ///
    /// Every attempt that yields a delivery code is persisted (raising
    /// `evaluated`) before the next wait, so intermediate attempts stay
    /// visible across interruptions. A zero code stops the loop. A provider
    /// reject on the first attempt is a dispatch failure and is not retried;
    /// non-zero codes are retried up to the bound.
    async fn deliver_with_retry(
        &self,
        record: &HistoryRecord,
        content: &str,
    ) -> Result<RecordOutcome, ServiceError> {
        let mut delivered_code = None;
        for attempt in self.retry.attempts() {
            if attempt > 1 {
                tokio::time::sleep(self.retry.delay).await;
            }

            let code = match self
                .provider
                .upload_sms(&record.phone_number, content, &self.country_id)
                .await
            {
                Ok(code) => code,
                Err(ProviderError::Upstream { code, reason }) if attempt == 1 => {
                    tracing::warn!(id = %record.id, code, %reason, "dispatch rejected");
                    let outcome = DeliveryOutcome { message: content.to_owned(), code };
                    self.storage.record_delivery(&record.id, &outcome).await?;
                    return Ok(RecordOutcome::DispatchFailed);
                },
                Err(e) => {
                    tracing::warn!(id = %record.id, attempt, error = %e, "upload attempt failed");
                    continue;
                },
            };

            let outcome = DeliveryOutcome { message: content.to_owned(), code };
            self.storage.record_delivery(&record.id, &outcome).await?;
            delivered_code = Some(code);

            if outcome.is_confirmed() {
                tracing::info!(id = %record.id, attempt, "delivery confirmed");
                return Ok(RecordOutcome::Delivered);
            }
            tracing::warn!(id = %record.id, attempt, code, "delivery unconfirmed");
        }

        match delivered_code {
            // Every attempt errored before yielding a code; the record stays
            // unevaluated and comes back next cycle.
            None => Ok(RecordOutcome::Failed("all upload attempts failed".to_owned())),
            Some(_) => Ok(RecordOutcome::Unconfirmed),
        }
    }

    /// Page through the registry and delete retired numbers at the provider.
    /// Terminates on the first short page; per-page errors are counted, not
    /// fatal.
    pub async fn cleanup_retired(&self) -> Result<CleanupReport, ServiceError> {
        let mut report = CleanupReport::default();
        let mut offset = 0u64;

        loop {
            let page = self.storage.registry_page(offset, CLEANUP_PAGE_SIZE).await?;
            let page_len = page.len() as u64;
            if page_len == 0 {
                break;
            }
            report.pages_scanned += 1;

            let retired: Vec<String> = page
                .iter()
                .filter(|d| !d.active)
                .map(|d| self.dial_plan.national(&d.sn).unwrap_or(&d.sn).to_owned())
                .collect();

            if !retired.is_empty() {
                match self.provider.delete_numbers(&retired, &self.country_id).await {
                    Ok(()) => report.deleted += retired.len() as u64,
                    Err(e) => {
                        tracing::warn!(offset, error = %e, "cleanup page delete failed");
                        report.page_errors += 1;
                    },
                }
            }

            if page_len < CLEANUP_PAGE_SIZE {
                break;
            }
            offset += CLEANUP_PAGE_SIZE;
        }

        tracing::info!(
            pages = report.pages_scanned,
            deleted = report.deleted,
            errors = report.page_errors,
            "cleanup pass complete"
        );
        Ok(report)
    }
}
