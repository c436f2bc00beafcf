//! Latency measurement.

use async_trait::async_trait;
use tracing::debug;

use super::context::{EventKind, EventLevel, InvocationContext};
use super::middleware::{Middleware, Next};
use super::response::Response;

/// Records how long the call took since the context was created.
///
/// Placed outside the retry middleware it records one measurement per call,
/// spanning every attempt and backoff wait.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimingMiddleware;

impl TimingMiddleware {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Middleware for TimingMiddleware {
    fn name(&self) -> &'static str {
        "timing"
    }

    async fn process(&self, ctx: &mut InvocationContext, next: Next<'_>) -> Response {
        let response = next.run(ctx).await;

        let elapsed = ctx.elapsed();
        let tool_name = ctx.request().tool_name().to_string();
        let attempt_count = ctx.request().attempt();
        debug!(
            tool = %tool_name,
            attempts = attempt_count,
            elapsed_ms = elapsed.as_millis() as u64,
            "tool call timed"
        );
        ctx.record(
            EventLevel::Info,
            EventKind::Timing {
                tool_name,
                attempt_count,
                elapsed,
            },
        );
        response
    }
}
