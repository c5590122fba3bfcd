//! Decoded SMS messages read off the GOIP gateway. Not persisted.

use serde::{Deserialize, Serialize};

/// Placeholder substituted when a message payload cannot be decoded to UTF-8
/// text. One corrupt message never drops the rest of a batch.
pub const UNDECODABLE_PLACEHOLDER: &str = "[undecodable]";

/// A single SMS read from a gateway port, content already decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsMessage {
    pub port: String,
    pub timestamp: String,
    pub sender: String,
    pub receiver: String,
    /// Decoded text, or [`UNDECODABLE_PLACEHOLDER`] when the base64 payload
    /// was not valid UTF-8.
    pub text: String,
}
