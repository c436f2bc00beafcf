//! Request and outcome logging.

use async_trait::async_trait;
use serde_json::Value;

use super::context::{EventKind, EventLevel, InvocationContext, Outcome};
use super::middleware::{Middleware, Next};
use super::response::Response;

/// Logs each request before it runs and its outcome afterwards.
///
/// With `include_payloads` off, entries carry only the tool name and the
/// outcome.
#[derive(Debug, Clone)]
pub struct LoggingMiddleware {
    include_payloads: bool,
    max_payload_length: usize,
}

impl LoggingMiddleware {
    pub fn new(include_payloads: bool, max_payload_length: usize) -> Self {
        Self {
            include_payloads,
            max_payload_length,
        }
    }

    fn preview(&self, text: &str) -> Option<String> {
        self.include_payloads
            .then(|| truncate(text, self.max_payload_length))
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new(true, 1000)
    }
}

#[async_trait]
impl Middleware for LoggingMiddleware {
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn process(&self, ctx: &mut InvocationContext, next: Next<'_>) -> Response {
        let tool_name = ctx.request().tool_name().to_string();
        let arguments = self.preview(&Value::Object(ctx.request().arguments().clone()).to_string());
        ctx.record(
            EventLevel::Info,
            EventKind::Request {
                tool_name: tool_name.clone(),
                arguments,
            },
        );

        let response = next.run(ctx).await;

        let (level, outcome, result) = match &response {
            Response::Success(payload) => (
                EventLevel::Info,
                Outcome::Success,
                self.preview(&payload.preview()),
            ),
            Response::Failure(failure) => (
                EventLevel::Warn,
                Outcome::Failure(failure.kind),
                self.preview(&failure.message),
            ),
        };
        let attempt = ctx.request().attempt();
        ctx.record(
            level,
            EventKind::Outcome {
                tool_name,
                attempt,
                outcome,
                result,
            },
        );
        response
    }
}

/// Cut `text` to at most `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate("abc", 10), "abc");
        assert_eq!(truncate("abc", 3), "abc");
    }

    #[test]
    fn test_truncate_long_text() {
        assert_eq!(truncate("abcdef", 3), "abc...");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("giá vàng", 3), "giá...");
    }

    #[test]
    fn test_preview_disabled_without_payloads() {
        let middleware = LoggingMiddleware::new(false, 10);
        assert_eq!(middleware.preview("secret"), None);
    }
}
