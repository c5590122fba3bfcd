//! Device-number registry: one row per SIM slot known to the GOIP gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A device number tracked through the provisioning workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    /// Opaque primary key (UUID v4).
    pub id: String,
    /// GOIP gateway port the SIM is seated in.
    pub port: String,
    pub iccid: String,
    pub imei: String,
    pub imsi: String,
    /// Serial number: the registry's globally unique business key. Carries
    /// the country calling code prefix (full number), unlike the bare
    /// national number in the history domain.
    pub sn: String,
    /// Provider batch lifecycle status for this number.
    pub status: String,
    /// Provider batch this number was submitted under, once assigned.
    pub batch_id: Option<String>,
    /// Whether the number is still in the active pool. `false` marks it
    /// retired and eligible for provider-side deletion.
    pub active: bool,
    /// Raw gateway `st` flag, kept verbatim.
    pub st_status: Option<String>,
    /// Raw gateway slot-active flag, kept verbatim.
    pub slot_active: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A device report coming in from the gateway status feed.
///
/// Upserted into the registry keyed by `sn`: registering an sn that already
/// exists refreshes its status flags instead of erroring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceReport {
    #[serde(default = "unknown_field")]
    pub port: String,
    #[serde(default = "unknown_field")]
    pub iccid: String,
    #[serde(default = "unknown_field")]
    pub imei: String,
    #[serde(default = "unknown_field")]
    pub imsi: String,
    pub sn: String,
    #[serde(default)]
    pub st: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub slot_active: Option<String>,
}

fn unknown_field() -> String {
    "N/A".to_owned()
}

const fn default_active() -> bool {
    true
}

/// Whether an upsert created a new row or refreshed an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(RegistryRecord),
    Updated(RegistryRecord),
}

impl UpsertOutcome {
    #[must_use]
    pub fn record(&self) -> &RegistryRecord {
        match *self {
            Self::Inserted(ref r) | Self::Updated(ref r) => r,
        }
    }

    #[must_use]
    pub const fn was_inserted(&self) -> bool {
        matches!(*self, Self::Inserted(_))
    }
}

/// Filters for listing registry rows.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryFilter {
    pub sn: Option<String>,
    pub batch_id: Option<String>,
    pub status: Option<String>,
    pub active: Option<bool>,
}

impl RegistryFilter {
    /// Whether a record passes every populated filter field.
    #[must_use]
    pub fn matches(&self, record: &RegistryRecord) -> bool {
        if let Some(ref sn) = self.sn {
            if !record.sn.contains(sn.as_str()) {
                return false;
            }
        }
        if let Some(ref batch_id) = self.batch_id {
            if record.batch_id.as_deref() != Some(batch_id.as_str()) {
                return false;
            }
        }
        if let Some(ref status) = self.status {
            if record.status != *status {
                return false;
            }
        }
        if let Some(active) = self.active {
            if record.active != active {
                return false;
            }
        }
        true
    }
}
