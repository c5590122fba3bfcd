//! HTTP client for the provider gateway.

use simtrack_core::{BatchStatus, PendingNumber};

use crate::error::ProviderError;
use crate::types::{
    BatchStatusEntry, PhoneEntry, ProviderRequest, ProviderResponse, ResultPhoneEntry, UploadAck,
    WaitPhoneEntry,
};

/// Request timeout for provider calls.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Fallback batch status when the provider omits `Phone_Status`.
const DEFAULT_PHONE_STATUS: &str = "1";

/// Client for the provider's single-endpoint batch API.
///
/// No operation retries internally; retry policy belongs to the caller.
pub struct ProviderClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("client", &self.client)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"***")
            .finish()
    }
}

impl ProviderClient {
    /// Creates a new provider client against the given endpoint.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(endpoint: String, api_key: String) -> Result<Self, ProviderError> {
        let endpoint = endpoint.trim_end_matches('/').to_owned();
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::ClientInit(e.to_string()))?;
        Ok(Self { client, endpoint, api_key })
    }

    /// Returns the configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Submit phone numbers as a new monitoring batch. Returns the
    /// provider-assigned batch ID.
    ///
    /// # Errors
    /// `Validation` on an empty list; upstream/transport failures otherwise.
    pub async fn add_numbers(
        &self,
        phone_numbers: &[String],
        country_id: &str,
    ) -> Result<String, ProviderError> {
        let request = ProviderRequest::PhoneAddBatch {
            phone_list: phone_entries(phone_numbers, country_id)?,
        };
        let data: serde_json::Value = self.post(&request, "PhoneAddBatch").await?;
        Ok(json_to_string(&data))
    }

    /// Query the status of a previously submitted batch.
    ///
    /// # Errors
    /// `Validation` on an empty batch ID; upstream/transport failures otherwise.
    pub async fn query_batch_status(&self, batch_id: &str) -> Result<BatchStatus, ProviderError> {
        if batch_id.is_empty() {
            return Err(ProviderError::Validation("batch ID must not be empty".to_owned()));
        }
        let request = ProviderRequest::PhoneBatchResult { batch_id: batch_id.to_owned() };
        let entries: Vec<BatchStatusEntry> = self.post(&request, "PhoneBatchResult").await?;
        let phone_status = entries
            .first()
            .and_then(|e| e.phone_status.clone())
            .unwrap_or_else(|| DEFAULT_PHONE_STATUS.to_owned());
        Ok(BatchStatus { batch_id: batch_id.to_owned(), phone_status })
    }

    /// Remove phone numbers from monitoring.
    ///
    /// # Errors
    /// `Validation` on an empty list; upstream/transport failures otherwise.
    pub async fn delete_numbers(
        &self,
        phone_numbers: &[String],
        country_id: &str,
    ) -> Result<(), ProviderError> {
        let request = ProviderRequest::PhoneDeleteBatch {
            phone_list: phone_entries(phone_numbers, country_id)?,
        };
        let _: serde_json::Value = self.post(&request, "PhoneDeleteBatch").await?;
        Ok(())
    }

    /// Remove every phone number registered under this API key.
    ///
    /// # Errors
    /// Upstream or transport failures.
    pub async fn delete_all_numbers(&self) -> Result<(), ProviderError> {
        let _: serde_json::Value = self.post(&ProviderRequest::PhoneDeleteAll, "PhoneDeleteAll").await?;
        Ok(())
    }

    /// Relay received SMS content for a phone number. Returns the provider
    /// delivery code; zero means confirmed.
    ///
    /// # Errors
    /// `Validation` on an empty phone number; upstream/transport failures otherwise.
    pub async fn upload_sms(
        &self,
        phone_number: &str,
        content: &str,
        country_id: &str,
    ) -> Result<i64, ProviderError> {
        if phone_number.is_empty() {
            return Err(ProviderError::Validation("phone number must not be empty".to_owned()));
        }
        let request = ProviderRequest::UploadSms {
            country_id: country_id.to_owned(),
            phone_num: phone_number.to_owned(),
            sms_content: content.to_owned(),
        };
        let ack: UploadAck = self.post(&request, "UploadSms").await?;
        Ok(ack.code)
    }

    /// Fetch the provider's wait list of pending numbers. Pure read: nothing
    /// is persisted here, ingestion is the caller's explicit step.
    ///
    /// # Errors
    /// Upstream or transport failures.
    pub async fn list_pending(&self, country_id: &str) -> Result<Vec<PendingNumber>, ProviderError> {
        let request = ProviderRequest::GetWaitPhoneList { country_id: country_id.to_owned() };
        let entries: Vec<WaitPhoneEntry> = self.post(&request, "GetWaitPhoneList").await?;
        Ok(entries.into_iter().map(PendingNumber::from).collect())
    }

    /// Query the provider's result list for one tracked number.
    ///
    /// # Errors
    /// `Validation` on an empty item ID; upstream/transport failures otherwise.
    pub async fn query_result(
        &self,
        country_id: &str,
        phone_number: &str,
        item_id: &str,
    ) -> Result<Vec<ResultPhoneEntry>, ProviderError> {
        if item_id.is_empty() {
            return Err(ProviderError::Validation("item ID must not be empty".to_owned()));
        }
        let request = ProviderRequest::GetResultPhoneList {
            country_id: country_id.to_owned(),
            phone_num: phone_number.to_owned(),
            item_id: item_id.to_owned(),
        };
        self.post(&request, "GetResultPhoneList").await
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        request: &ProviderRequest,
        act: &str,
    ) -> Result<T, ProviderError> {
        let url = format!("{}?key={}", self.endpoint, self.api_key);
        tracing::debug!(act, "posting provider request");
        let response = self.client.post(url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body =
                response.text().await.unwrap_or_else(|_| "could not read error body".to_owned());
            return Err(ProviderError::HttpStatus { code: status.as_u16(), body });
        }

        let body = response.text().await?;
        let envelope: ProviderResponse<T> =
            serde_json::from_str(&body).map_err(|e| ProviderError::JsonParse {
                context: format!("{act} response (body: {})", truncate(&body, 200)),
                source: e,
            })?;

        match envelope.data {
            Some(data) => Ok(data),
            None => Err(ProviderError::Upstream {
                code: envelope.code.unwrap_or(-1),
                reason: envelope.reason.unwrap_or_else(|| "no data in response".to_owned()),
            }),
        }
    }
}

fn phone_entries(
    phone_numbers: &[String],
    country_id: &str,
) -> Result<Vec<PhoneEntry>, ProviderError> {
    if phone_numbers.is_empty() {
        return Err(ProviderError::Validation("phone number list must not be empty".to_owned()));
    }
    Ok(phone_numbers
        .iter()
        .map(|n| PhoneEntry {
            country_id: country_id.to_owned(),
            phone_num: n.trim().to_owned(),
        })
        .collect())
}

/// Batch IDs come back as a bare string or number depending on provider
/// version; normalize to a string.
fn json_to_string(value: &serde_json::Value) -> String {
    match *value {
        serde_json::Value::String(ref s) => s.clone(),
        ref other => other.to_string(),
    }
}

/// Truncates a string to the given maximum length at a char boundary.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        s.get(..end).unwrap_or("")
    }
}
