//! Device provisioning: gateway status reports into the registry and the
//! provider's monitoring batches.

use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use simtrack_core::DeviceReport;
use simtrack_provider::ProviderClient;
use simtrack_storage::traits::RegistryStore;
use simtrack_storage::StorageBackend;

use crate::error::ServiceError;

/// Fallback batch status when the provider cannot be asked.
const DEFAULT_BATCH_STATUS: &str = "1";

/// Outcome of provisioning one device report.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionEntry {
    pub sn: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of one provisioning request.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub processed: u64,
    pub succeeded: u64,
    pub entries: Vec<ProvisionEntry>,
}

/// Registers gateway device reports and submits their numbers to the
/// provider for monitoring.
pub struct ProvisionService {
    storage: Arc<StorageBackend>,
    provider: Arc<ProviderClient>,
    country_id: String,
}

impl ProvisionService {
    #[must_use]
    pub fn new(
        storage: Arc<StorageBackend>,
        provider: Arc<ProviderClient>,
        country_id: String,
    ) -> Self {
        Self { storage, provider, country_id }
    }

    /// Provision a batch of device reports. Reports fan out concurrently and
    /// fail independently; one bad SIM never blocks its siblings.
    pub async fn provision(&self, reports: Vec<DeviceReport>) -> ProvisionReport {
        let entries =
            join_all(reports.iter().map(|report| self.provision_one(report))).await;
        let succeeded = entries.iter().filter(|e| e.success).count() as u64;
        ProvisionReport { processed: entries.len() as u64, succeeded, entries }
    }

    async fn provision_one(&self, report: &DeviceReport) -> ProvisionEntry {
        match self.register_and_submit(report).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(sn = %report.sn, error = %e, "provisioning failed");
                ProvisionEntry {
                    sn: report.sn.clone(),
                    success: false,
                    batch_id: None,
                    status: None,
                    error: Some(e.to_string()),
                }
            },
        }
    }

    async fn register_and_submit(
        &self,
        report: &DeviceReport,
    ) -> Result<ProvisionEntry, ServiceError> {
        if report.sn.is_empty() {
            return Err(ServiceError::InvalidInput("device report without sn".to_owned()));
        }

        let outcome = self.storage.upsert_device(report).await?;
        let device = outcome.record();

        let batch_id =
            self.provider.add_numbers(&[report.sn.clone()], &self.country_id).await?;

        // A batch status query failure downgrades to the default status
        // rather than undoing the registration.
        let status = match self.provider.query_batch_status(&batch_id).await {
            Ok(status) => status.phone_status,
            Err(e) => {
                tracing::warn!(sn = %report.sn, error = %e, "batch status query failed");
                DEFAULT_BATCH_STATUS.to_owned()
            },
        };

        // Only stamp the first batch a number lands in.
        if device.batch_id.is_none() {
            self.storage.assign_batch(&device.id, &batch_id, &status).await?;
        }

        tracing::info!(sn = %report.sn, batch_id = %batch_id, %status, "device provisioned");
        Ok(ProvisionEntry {
            sn: report.sn.clone(),
            success: true,
            batch_id: Some(batch_id),
            status: Some(status),
            error: None,
        })
    }
}
