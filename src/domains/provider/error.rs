//! Provider error types and HTTP error mapping.

use std::time::Duration;

use thiserror::Error;

use crate::core::pipeline::ErrorKind;

/// Errors raised while fetching data from the market-data provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider could not be reached.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The provider did not answer in time.
    #[error("Provider timed out: {0}")]
    Timeout(String),

    /// The provider refused the request (HTTP 4xx).
    #[error("Provider rejected the request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// The provider is up but failing or throttling (HTTP 5xx, 429).
    #[error("Provider unavailable (HTTP {status}): {body}")]
    Unavailable { status: u16, body: String },

    /// The response body was not the JSON we expected.
    #[error("Invalid provider response: {0}")]
    Decode(String),

    /// The configured base URL or a dataset path is malformed.
    #[error("Invalid provider URL: {0}")]
    InvalidUrl(String),

    /// Any other HTTP client failure.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl ProviderError {
    pub fn connect(msg: impl Into<String>) -> Self {
        Self::Connect(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Classification used by the pipeline.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connect(_) | Self::Unavailable { .. } | Self::Client(_) => ErrorKind::Connectivity,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Rejected { .. } => ErrorKind::Validation,
            Self::Decode(_) | Self::InvalidUrl(_) => ErrorKind::ExecutionError,
        }
    }
}

/// Map a non-success HTTP status from the provider to a [`ProviderError`].
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> ProviderError {
    let body = body.trim().to_string();
    match status.as_u16() {
        408 => ProviderError::Timeout(format!("HTTP 408: {body}")),
        429 | 500..=599 => ProviderError::Unavailable {
            status: status.as_u16(),
            body,
        },
        400..=499 => ProviderError::Rejected {
            status: status.as_u16(),
            body,
        },
        _ => ProviderError::Decode(format!("unexpected HTTP {status}: {body}")),
    }
}

/// Map a [`reqwest::Error`] raised while sending a request.
pub(crate) fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(format!("no response within {}s", timeout.as_secs()))
    } else if err.is_connect() {
        ProviderError::Connect(error_chain(&err))
    } else if err.is_decode() {
        ProviderError::Decode(error_chain(&err))
    } else {
        ProviderError::Client(err)
    }
}

/// Flatten an error and its sources into one line.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
