//! Ephemeral provider-side types produced per poll cycle. Not persisted.

use serde::{Deserialize, Serialize};

/// One entry from the provider's wait list.
///
/// Mirrored into a [`crate::HistoryRecord`] on first sight, deduplicated by
/// `phone_number`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingNumber {
    pub item_id: String,
    pub phone_number: String,
    pub country_id: String,
    pub fetched_at: Option<String>,
}

/// Provider-assigned lifecycle status for a batch of submitted numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStatus {
    pub batch_id: String,
    pub phone_status: String,
}
