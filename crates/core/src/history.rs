//! Service-history records for inbound phone numbers awaiting SMS codes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PendingNumber;

/// One tracked phone number in the SMS-reception workflow.
///
/// Created when a pending number is first observed at the provider, then
/// mutated by the reconciliation engine on each poll cycle. Records are never
/// deleted by the reconciliation subsystem; retiring the underlying device
/// number is a registry concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Opaque primary key (UUID v4).
    pub id: String,
    /// Provider-assigned item ID for this wait-list entry.
    pub item_id: String,
    /// Bare national phone number. Unique among records that have not yet
    /// been evaluated.
    pub phone_number: String,
    /// Provider country identifier (e.g. "col").
    pub country_id: String,
    /// Provider-reported fetch timestamp, kept as the opaque string the
    /// provider sends.
    pub fetched_at: Option<String>,
    /// Whether the provider confirmed content was received for this number.
    pub is_returned: bool,
    /// Provider-reported return timestamp.
    pub returned_at: Option<String>,
    /// Provider remark attached to the return.
    pub remark: Option<String>,
    /// Provider remark timestamp.
    pub remark_at: Option<String>,
    /// Text of the last SMS relayed for this record.
    pub last_message: Option<String>,
    /// Delivery code of the most recent upload attempt. Overwritten on each
    /// attempt so intermediate attempts stay visible.
    pub last_delivery_code: Option<i64>,
    /// Terminal-outcome flag. Monotonic: once `true` it never reverts.
    pub evaluated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Build a fresh record for a pending number observed at the provider.
    #[must_use]
    pub fn from_pending(id: String, pending: &PendingNumber) -> Self {
        let now = Utc::now();
        Self {
            id,
            item_id: pending.item_id.clone(),
            phone_number: pending.phone_number.clone(),
            country_id: pending.country_id.clone(),
            fetched_at: pending.fetched_at.clone(),
            is_returned: false,
            returned_at: None,
            remark: None,
            remark_at: None,
            last_message: None,
            last_delivery_code: None,
            evaluated: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Provider confirmation that a number received its SMS.
///
/// Persisted onto the history record BEFORE any delivery attempt, so a crash
/// mid-retry does not re-trigger re-ingestion of the same pending number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReturnReceipt {
    pub is_returned: bool,
    pub returned_at: Option<String>,
    pub remark: Option<String>,
    pub remark_at: Option<String>,
}

/// Outcome of one SMS upload attempt.
///
/// Recording a delivery always sets `evaluated = true` on the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    /// Message text that was relayed.
    pub message: String,
    /// Provider delivery code. Zero means the delivery was confirmed.
    pub code: i64,
}

impl DeliveryOutcome {
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        self.code == 0
    }
}

/// Partial update applied through the CRUD surface.
///
/// `evaluated` can only be raised: stores apply it as a logical OR against
/// the current value, so external callers cannot reset a terminal record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryUpdate {
    pub is_returned: Option<bool>,
    pub returned_at: Option<String>,
    pub remark: Option<String>,
    pub remark_at: Option<String>,
    pub last_message: Option<String>,
    pub last_delivery_code: Option<i64>,
    pub evaluated: Option<bool>,
}

impl HistoryUpdate {
    /// Whether the update carries at least one field to apply.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.is_returned.is_none()
            && self.returned_at.is_none()
            && self.remark.is_none()
            && self.remark_at.is_none()
            && self.last_message.is_none()
            && self.last_delivery_code.is_none()
            && self.evaluated.is_none()
    }
}
