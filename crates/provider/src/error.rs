//! Typed error enum for the provider crate.

use thiserror::Error;

/// Errors from provider gateway operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Malformed or empty input caught before any I/O.
    #[error("validation error: {0}")]
    Validation(String),
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("HTTP status {code}: {body}")]
    HttpStatus { code: u16, body: String },
    /// The provider answered 2xx but reported a failure in its envelope.
    #[error("provider error {code}: {reason}")]
    Upstream { code: i64, reason: String },
    #[error("JSON parse error in {context}: {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("client initialization failed: {0}")]
    ClientInit(String),
}

impl ProviderError {
    /// Whether this error is transient and worth retrying at the caller.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match *self {
            Self::HttpRequest(_) => true,
            Self::HttpStatus { code, .. } => matches!(code, 429 | 500 | 502 | 503),
            _ => false,
        }
    }
}
