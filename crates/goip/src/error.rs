//! Typed error enum for the GOIP crate.

use thiserror::Error;

/// Errors from GOIP gateway operations.
///
/// Base64 decode failures are deliberately absent: a corrupt message body
/// becomes a placeholder string, never an error.
#[derive(Debug, Error)]
pub enum GoipError {
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("HTTP status {code}: {body}")]
    HttpStatus { code: u16, body: String },
    /// The gateway answered 2xx with a non-zero status code.
    #[error("gateway error code {0}")]
    Gateway(i64),
    #[error("JSON parse error in {context}: {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("client initialization failed: {0}")]
    ClientInit(String),
}

impl GoipError {
    /// Whether this error is transient and worth retrying at the caller.
    /// Request timeouts land here: the gateway is slow, not broken.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match *self {
            Self::HttpRequest(_) => true,
            Self::HttpStatus { code, .. } => matches!(code, 429 | 500 | 502 | 503),
            _ => false,
        }
    }
}
