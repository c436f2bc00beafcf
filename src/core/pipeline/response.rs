//! Pipeline response types and the error taxonomy.
//!
//! Every stage of the pipeline returns a [`Response`], which is always exactly
//! one of [`Response::Success`] or [`Response::Failure`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domains::tools::ToolError;

/// A single named-field record of a tabular payload.
///
/// Field order is the insertion order (`serde_json` is built with
/// `preserve_order`).
pub type Record = Map<String, Value>;

/// Classification tag attached to every [`Failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Bad arguments. Never retried.
    Validation,
    /// Network or provider unreachable.
    Connectivity,
    /// Deadline exceeded or call cancelled.
    Timeout,
    /// The handler failed with an unclassified error.
    ExecutionError,
    /// Catch-all.
    Unknown,
}

impl ErrorKind {
    /// Whether this kind is transient by nature.
    ///
    /// This only seeds [`Failure::retryable`]; the retry middleware decides
    /// from its own policy.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Connectivity | Self::Timeout)
    }

    /// Stable name used in rendered failures and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "Validation",
            Self::Connectivity => "Connectivity",
            Self::Timeout => "Timeout",
            Self::ExecutionError => "ExecutionError",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value carried by a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Ordered sequence of records.
    Table(Vec<Record>),
    /// A single JSON value (number, string, object...).
    Scalar(Value),
    /// Transport-ready text, already normalized.
    Text(String),
}

impl Payload {
    /// Build a payload from an arbitrary JSON value.
    ///
    /// An array whose elements are all objects is tabular; anything else is
    /// a scalar.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Array(items) if items.iter().all(Value::is_object) => Self::Table(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Object(record) => Some(record),
                        _ => None,
                    })
                    .collect(),
            ),
            other => Self::Scalar(other),
        }
    }

    /// Short human-readable rendering used in log previews.
    pub fn preview(&self) -> String {
        match self {
            Self::Table(records) => {
                serde_json::to_string(records).unwrap_or_else(|_| format!("<{} rows>", records.len()))
            }
            Self::Scalar(Value::String(s)) => s.clone(),
            Self::Scalar(value) => value.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

/// A classified failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
    /// Error source chain, kept only when trace inclusion is enabled.
    pub trace: Option<String>,
}

impl Failure {
    /// Create a failure of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: kind.is_transient(),
            trace: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connectivity, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExecutionError, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// Attach a trace.
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    /// Translate a handler error into a failure.
    ///
    /// This is the only place where a native error becomes a [`Failure`].
    /// The error's `source()` chain is captured as the trace.
    pub fn from_tool_error(error: &ToolError) -> Self {
        let failure = Self::new(error.kind(), error.to_string());
        match source_chain(error) {
            Some(chain) => failure.with_trace(chain),
            None => failure,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Render the `source()` chain of an error, one cause per line.
fn source_chain(error: &(dyn std::error::Error + 'static)) -> Option<String> {
    let mut lines = Vec::new();
    let mut current = error.source();
    while let Some(cause) = current {
        lines.push(format!("caused by: {cause}"));
        current = cause.source();
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Outcome of one pipeline traversal.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Success(Payload),
    Failure(Failure),
}

impl Response {
    pub fn success(payload: Payload) -> Self {
        Self::Success(payload)
    }

    pub fn failure(failure: Failure) -> Self {
        Self::Failure(failure)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The failure kind, if this is a failure.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure.kind),
        }
    }

    /// Render the response as client-facing text.
    ///
    /// Failures render as `"<Kind>: <message>"` only. The trace stays on the
    /// [`Failure`] and in the `Error` event.
    pub fn to_text(&self) -> String {
        match self {
            Self::Success(payload) => payload.preview(),
            Self::Failure(failure) => failure.to_string(),
        }
    }
}

impl From<Result<Payload, ToolError>> for Response {
    fn from(result: Result<Payload, ToolError>) -> Self {
        match result {
            Ok(payload) => Self::Success(payload),
            Err(error) => Self::Failure(Failure::from_tool_error(&error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::provider::ProviderError;
    use serde_json::json;

    #[test]
    fn test_failure_display() {
        let failure = Failure::validation("symbol must be 3 to 12 characters");
        assert_eq!(
            failure.to_string(),
            "Validation: symbol must be 3 to 12 characters"
        );
    }

    #[test]
    fn test_transient_kinds_are_retryable() {
        assert!(Failure::connectivity("down").retryable);
        assert!(Failure::timeout("slow").retryable);
        assert!(!Failure::validation("bad").retryable);
        assert!(!Failure::execution("boom").retryable);
        assert!(!Failure::unknown("?").retryable);
    }

    #[test]
    fn test_payload_from_json_array_of_objects_is_table() {
        let payload = Payload::from_json(json!([{ "a": 1 }, { "a": 2 }]));
        match payload {
            Payload::Table(records) => assert_eq!(records.len(), 2),
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_payload_from_json_mixed_array_is_scalar() {
        let payload = Payload::from_json(json!([{ "a": 1 }, 2]));
        assert!(matches!(payload, Payload::Scalar(_)));
    }

    #[test]
    fn test_empty_array_is_empty_table() {
        assert_eq!(Payload::from_json(json!([])), Payload::Table(vec![]));
    }

    #[test]
    fn test_from_tool_error_keeps_provider_classification() {
        let error = ToolError::from(ProviderError::connect("connection refused"));
        let failure = Failure::from_tool_error(&error);
        assert_eq!(failure.kind, ErrorKind::Connectivity);
        assert!(failure.retryable);
    }

    #[test]
    fn test_from_tool_error_execution_failure() {
        let failure = Failure::from_tool_error(&ToolError::execution_failed("boom"));
        assert_eq!(failure.kind, ErrorKind::ExecutionError);
        assert_eq!(failure.message, "Execution failed: boom");
    }

    #[test]
    fn test_response_to_text_renders_kind_prefix() {
        let response = Response::failure(Failure::timeout("deadline exceeded"));
        assert_eq!(response.to_text(), "Timeout: deadline exceeded");
    }

    #[test]
    fn test_response_to_text_omits_trace() {
        let failure = Failure::connectivity("provider down").with_trace("caused by: connection reset");
        let response = Response::failure(failure);
        assert_eq!(response.to_text(), "Connectivity: provider down");
    }
}
