//! HTTP client for the GOIP SIM-bank SMS read endpoint.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use simtrack_core::{SmsMessage, UNDECODABLE_PLACEHOLDER};

use crate::error::GoipError;

/// The gateway is a slow embedded device; cap how long one read may take.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct GoipResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    data: Vec<Vec<serde_json::Value>>,
}

/// Client for the GOIP gateway's `goip_get_sms.html` endpoint.
pub struct GoipClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl std::fmt::Debug for GoipClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoipClient")
            .field("client", &self.client)
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl GoipClient {
    /// Creates a new GOIP client against the given gateway base URL.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(
        base_url: String,
        username: String,
        password: String,
    ) -> Result<Self, GoipError> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GoipError::ClientInit(e.to_string()))?;
        Ok(Self { client, base_url, username, password })
    }

    /// Read received SMS from one gateway port, newest last.
    ///
    /// Each message body arrives base64-encoded; a body that fails to decode
    /// becomes [`UNDECODABLE_PLACEHOLDER`] so one corrupt message never drops
    /// the rest of the batch.
    ///
    /// # Errors
    /// Transport failures (including the 10s timeout), non-2xx statuses, and
    /// non-zero gateway codes.
    pub async fn fetch_messages(
        &self,
        port: &str,
        max_count: u32,
    ) -> Result<Vec<SmsMessage>, GoipError> {
        let url = format!("{}/goip_get_sms.html", self.base_url);
        let response = self
            .client
            .get(url)
            .query(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
                ("port", port),
                ("sms_num", &max_count.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body =
                response.text().await.unwrap_or_else(|_| "could not read error body".to_owned());
            return Err(GoipError::HttpStatus { code: status.as_u16(), body });
        }

        let body = response.text().await?;
        let parsed: GoipResponse =
            serde_json::from_str(&body).map_err(|e| GoipError::JsonParse {
                context: format!("sms read response (body: {})", truncate(&body, 200)),
                source: e,
            })?;

        if parsed.code != 0 {
            return Err(GoipError::Gateway(parsed.code));
        }

        let mut messages = Vec::with_capacity(parsed.data.len());
        for row in &parsed.data {
            match row_to_message(row) {
                Some(message) => messages.push(message),
                None => {
                    tracing::warn!(columns = row.len(), "skipping malformed sms row");
                },
            }
        }
        Ok(messages)
    }
}

/// Rows are positional: `[id, port, timestamp, sender, receiver, content_b64]`.
fn row_to_message(row: &[serde_json::Value]) -> Option<SmsMessage> {
    if row.len() < 6 {
        return None;
    }
    Some(SmsMessage {
        port: field_string(&row[1]),
        timestamp: field_string(&row[2]),
        sender: field_string(&row[3]),
        receiver: field_string(&row[4]),
        text: decode_content(&field_string(&row[5])),
    })
}

/// Gateways flip between string and numeric fields across firmware versions.
fn field_string(value: &serde_json::Value) -> String {
    match *value {
        serde_json::Value::String(ref s) => s.clone(),
        ref other => other.to_string(),
    }
}

/// Decode a base64 SMS body to UTF-8 text, substituting a fixed placeholder
/// on any decode failure.
#[must_use]
pub fn decode_content(content_b64: &str) -> String {
    BASE64
        .decode(content_b64)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| UNDECODABLE_PLACEHOLDER.to_owned())
}

fn truncate(s: &str, max_len: usize) -> &str {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_valid_base64_round_trips() {
        let encoded = BASE64.encode("tu código es 4217");
        assert_eq!(decode_content(&encoded), "tu código es 4217");
    }

    #[test]
    fn decode_invalid_base64_yields_placeholder() {
        assert_eq!(decode_content("!!not-base64!!"), UNDECODABLE_PLACEHOLDER);
    }

    #[test]
    fn decode_non_utf8_bytes_yields_placeholder() {
        let encoded = BASE64.encode([0xff, 0xfe, 0x00, 0x80]);
        assert_eq!(decode_content(&encoded), UNDECODABLE_PLACEHOLDER);
    }

    #[test]
    fn short_rows_are_rejected() {
        let row = vec![serde_json::json!(1), serde_json::json!("1A")];
        assert!(row_to_message(&row).is_none());
    }
}
