//! Wire types for the provider gateway protocol.
//!
//! The provider speaks a single-endpoint JSON dialect: every request is a
//! POST with an `act` discriminator, every response is `{data: ...}` on
//! success or `{code, reason}` on failure. Field names follow the provider's
//! capitalized underscore convention verbatim.

use serde::{Deserialize, Serialize};
use simtrack_core::{PendingNumber, ReturnReceipt};

/// One phone entry inside a batch-scoped request.
#[derive(Debug, Clone, Serialize)]
pub struct PhoneEntry {
    #[serde(rename = "Country_ID")]
    pub country_id: String,
    #[serde(rename = "Phone_Num")]
    pub phone_num: String,
}

/// Request envelope, tagged by the `act` field.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "act")]
pub enum ProviderRequest {
    PhoneAddBatch {
        #[serde(rename = "PhoneList")]
        phone_list: Vec<PhoneEntry>,
    },
    PhoneBatchResult {
        #[serde(rename = "BatchID")]
        batch_id: String,
    },
    PhoneDeleteBatch {
        #[serde(rename = "PhoneList")]
        phone_list: Vec<PhoneEntry>,
    },
    PhoneDeleteAll,
    UploadSms {
        #[serde(rename = "Country_ID")]
        country_id: String,
        #[serde(rename = "Phone_Num")]
        phone_num: String,
        #[serde(rename = "Sms_Content")]
        sms_content: String,
    },
    GetWaitPhoneList {
        #[serde(rename = "Country_ID")]
        country_id: String,
    },
    GetResultPhoneList {
        #[serde(rename = "Country_ID")]
        country_id: String,
        #[serde(rename = "Phone_Num")]
        phone_num: String,
        #[serde(rename = "Item_ID")]
        item_id: String,
    },
}

/// Response envelope: `data` on success, `code`/`reason` on failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ProviderResponse<T> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Per-phone status row in a `PhoneBatchResult` response.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchStatusEntry {
    #[serde(rename = "Phone_Status", default)]
    pub phone_status: Option<String>,
}

/// Delivery acknowledgement in an `UploadSms` response.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadAck {
    pub code: i64,
}

/// Wait-list row in a `GetWaitPhoneList` response.
#[derive(Debug, Clone, Deserialize)]
pub struct WaitPhoneEntry {
    #[serde(rename = "Item_ID")]
    pub item_id: String,
    #[serde(rename = "Phone_Num")]
    pub phone_num: String,
    #[serde(rename = "Country_ID")]
    pub country_id: String,
    #[serde(rename = "Phone_GetTime", default)]
    pub phone_get_time: Option<String>,
}

impl From<WaitPhoneEntry> for PendingNumber {
    fn from(entry: WaitPhoneEntry) -> Self {
        Self {
            item_id: entry.item_id,
            phone_number: entry.phone_num,
            country_id: entry.country_id,
            fetched_at: entry.phone_get_time,
        }
    }
}

/// Result row in a `GetResultPhoneList` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultPhoneEntry {
    #[serde(rename = "Phone_IsRet", default)]
    pub phone_is_ret: bool,
    #[serde(rename = "Phone_RetTime", default)]
    pub phone_ret_time: Option<String>,
    #[serde(rename = "Phone_Remark", default)]
    pub phone_remark: Option<String>,
    #[serde(rename = "Phone_RemarkTime", default)]
    pub phone_remark_time: Option<String>,
}

impl From<ResultPhoneEntry> for ReturnReceipt {
    fn from(entry: ResultPhoneEntry) -> Self {
        Self {
            is_returned: entry.phone_is_ret,
            returned_at: entry.phone_ret_time,
            remark: entry.phone_remark,
            remark_at: entry.phone_remark_time,
        }
    }
}
