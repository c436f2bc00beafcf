//! Per-invocation context and event sink.
//!
//! One [`InvocationContext`] is created per client call and is exclusively
//! owned by that call's traversal of the pipeline. Events appended to its
//! sink are also written to the process-wide `tracing` stream, one event per
//! entry.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::request::Request;
use super::response::ErrorKind;

/// Severity of a sink entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
}

/// Success or failure of one attempt, as seen by the logging middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(ErrorKind),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("Success"),
            Self::Failure(kind) => write!(f, "Failure({kind})"),
        }
    }
}

/// What an event describes.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// An incoming request.
    Request {
        tool_name: String,
        arguments: Option<String>,
    },
    /// The outcome of one attempt.
    Outcome {
        tool_name: String,
        attempt: u32,
        outcome: Outcome,
        result: Option<String>,
    },
    /// A retry about to be scheduled.
    Retry {
        attempt: u32,
        kind: ErrorKind,
        wait: Duration,
    },
    /// Total latency of the call.
    Timing {
        tool_name: String,
        attempt_count: u32,
        elapsed: Duration,
    },
    /// A classified failure leaving the error-handling stage.
    Error {
        kind: ErrorKind,
        message: String,
        trace: Option<String>,
    },
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request {
                tool_name,
                arguments: Some(arguments),
            } => write!(f, "request {tool_name} {arguments}"),
            Self::Request { tool_name, .. } => write!(f, "request {tool_name}"),
            Self::Outcome {
                tool_name,
                attempt,
                outcome,
                result: Some(result),
            } => write!(f, "{outcome} {tool_name} attempt {attempt}: {result}"),
            Self::Outcome {
                tool_name,
                attempt,
                outcome,
                ..
            } => write!(f, "{outcome} {tool_name} attempt {attempt}"),
            Self::Retry {
                attempt,
                kind,
                wait,
            } => write!(f, "attempt {attempt} failed with {kind}, retrying in {wait:?}"),
            Self::Timing {
                tool_name,
                attempt_count,
                elapsed,
            } => write!(
                f,
                "{tool_name} completed in {:.2}ms after {attempt_count} attempt(s)",
                elapsed.as_secs_f64() * 1000.0
            ),
            Self::Error { kind, message, .. } => write!(f, "{kind}: {message}"),
        }
    }
}

/// One entry of the event sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub level: EventLevel,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
}

/// Append-only, ordered log of what happened during one invocation.
#[derive(Debug, Default)]
pub struct EventSink {
    events: Vec<Event>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and mirror it to `tracing`.
    pub fn push(&mut self, level: EventLevel, kind: EventKind) {
        match level {
            EventLevel::Debug => debug!(target: "pipeline", "{kind}"),
            EventLevel::Info => info!(target: "pipeline", "{kind}"),
            EventLevel::Warn => warn!(target: "pipeline", "{kind}"),
        }
        self.events.push(Event {
            level,
            timestamp: Utc::now(),
            kind,
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Why an invocation was interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    Cancelled,
    DeadlineExceeded,
}

impl fmt::Display for Interruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("request cancelled"),
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// Per-call state carried through the pipeline.
#[derive(Debug)]
pub struct InvocationContext {
    request: Request,
    started: Instant,
    events: EventSink,
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl InvocationContext {
    /// Create a context for a new call.
    pub fn new(request: Request) -> Self {
        Self {
            request,
            started: Instant::now(),
            events: EventSink::new(),
            cancellation: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Use the caller's cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Bound the whole call, retries included, by `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Replace the request with its next attempt.
    pub fn advance_attempt(&mut self) {
        self.request = self.request.next_attempt();
    }

    pub fn start_time(&self) -> Instant {
        self.started
    }

    /// Time since the call started. Follows the tokio clock, so paused time
    /// in tests is observed.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    /// Append to the event sink.
    pub fn record(&mut self, level: EventLevel, kind: EventKind) {
        self.events.push(level, kind);
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Whether the call has already been cancelled or run past its deadline.
    pub fn interruption(&self) -> Option<Interruption> {
        if self.cancellation.is_cancelled() {
            Some(Interruption::Cancelled)
        } else if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            Some(Interruption::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Resolve when the call is cancelled or its deadline passes.
    ///
    /// Never resolves for an uncancelled call without a deadline.
    pub async fn interrupted(&self) -> Interruption {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            _ = self.cancellation.cancelled() => Interruption::Cancelled,
            _ = deadline => Interruption::DeadlineExceeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> InvocationContext {
        InvocationContext::new(Request::from_value("price_board", json!({ "symbols": ["VNM"] })))
    }

    #[test]
    fn test_sink_preserves_append_order() {
        let mut ctx = context();
        ctx.record(
            EventLevel::Info,
            EventKind::Request {
                tool_name: "price_board".into(),
                arguments: None,
            },
        );
        ctx.record(
            EventLevel::Info,
            EventKind::Outcome {
                tool_name: "price_board".into(),
                attempt: 1,
                outcome: Outcome::Success,
                result: None,
            },
        );
        assert_eq!(ctx.events().len(), 2);
        assert!(matches!(ctx.events()[0].kind, EventKind::Request { .. }));
        assert!(matches!(ctx.events()[1].kind, EventKind::Outcome { .. }));
    }

    #[test]
    fn test_advance_attempt() {
        let mut ctx = context();
        ctx.advance_attempt();
        ctx.advance_attempt();
        assert_eq!(ctx.request().attempt(), 3);
        assert_eq!(ctx.request().tool_name(), "price_board");
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::Success.to_string(), "Success");
        assert_eq!(
            Outcome::Failure(ErrorKind::Connectivity).to_string(),
            "Failure(Connectivity)"
        );
    }

    #[tokio::test]
    async fn test_interrupted_on_cancel() {
        let token = CancellationToken::new();
        let ctx = context().with_cancellation(token.clone());
        token.cancel();
        assert_eq!(ctx.interrupted().await, Interruption::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupted_on_deadline() {
        let ctx = context().with_timeout(Duration::from_secs(5));
        assert_eq!(ctx.interrupted().await, Interruption::DeadlineExceeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interruption_snapshot() {
        let token = CancellationToken::new();
        let ctx = context()
            .with_cancellation(token.clone())
            .with_timeout(Duration::from_secs(5));
        assert_eq!(ctx.interruption(), None);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(ctx.interruption(), Some(Interruption::DeadlineExceeded));

        token.cancel();
        assert_eq!(ctx.interruption(), Some(Interruption::Cancelled));
    }
}
