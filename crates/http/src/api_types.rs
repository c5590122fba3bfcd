//! Request and response types for the HTTP API.

use serde::{Deserialize, Serialize};
use simtrack_core::{DeviceReport, HistoryUpdate, PendingNumber};
use simtrack_storage::Page;

/// Standard success envelope: `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { success: true, data }
    }
}

/// Pagination block mirrored into list responses.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

/// Paged success envelope.
#[derive(Debug, Serialize)]
pub struct PagedResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> From<Page<T>> for PagedResponse<T> {
    fn from(page: Page<T>) -> Self {
        let pagination = Pagination {
            total: page.total,
            limit: page.limit,
            offset: page.offset,
            has_more: page.has_more(),
        };
        Self { success: true, data: page.items, pagination }
    }
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
}

/// Common list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Restrict to records still awaiting a terminal outcome.
    #[serde(default)]
    pub unresolved: bool,
}

const fn default_limit() -> u64 {
    100
}

/// Registry list query: pagination plus filters.
#[derive(Debug, Deserialize)]
pub struct RegistryQuery {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub sn: Option<String>,
    pub batch_id: Option<String>,
    pub status: Option<String>,
    pub active: Option<bool>,
}

/// Body for creating a history record by hand.
pub type CreateHistoryRequest = PendingNumber;

/// Body for updating a history record.
pub type UpdateHistoryRequest = HistoryUpdate;

/// Body for provisioning gateway device reports.
#[derive(Debug, Deserialize)]
pub struct ProvisionRequest {
    pub devices: Vec<DeviceReport>,
}

#[derive(Debug, Serialize)]
pub struct RetireAllResponse {
    pub success: bool,
    pub retired: u64,
}
