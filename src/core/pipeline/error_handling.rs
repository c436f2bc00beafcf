//! Error normalization middleware.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;

use super::context::{EventKind, EventLevel, InvocationContext};
use super::middleware::{Middleware, Next};
use super::response::{Failure, Response};

/// Guarantees that nothing above it observes an unclassified error.
///
/// Panics unwinding out of inner stages become `Failure { Unknown }`. Every
/// failure passing through is logged to the event sink, and its trace is
/// kept only when `include_trace` is set.
#[derive(Debug, Clone, Default)]
pub struct ErrorHandlingMiddleware {
    include_trace: bool,
}

impl ErrorHandlingMiddleware {
    pub fn new(include_trace: bool) -> Self {
        Self { include_trace }
    }

    fn normalize(&self, mut failure: Failure, ctx: &InvocationContext) -> Failure {
        if failure.message.trim().is_empty() {
            failure.message = format!(
                "{} failed without a message",
                ctx.request().tool_name()
            );
        }
        if !self.include_trace {
            failure.trace = None;
        }
        failure
    }
}

#[async_trait]
impl Middleware for ErrorHandlingMiddleware {
    fn name(&self) -> &'static str {
        "error_handling"
    }

    async fn process(&self, ctx: &mut InvocationContext, next: Next<'_>) -> Response {
        let outcome = AssertUnwindSafe(next.run(ctx)).catch_unwind().await;
        let response = match outcome {
            Ok(response) => response,
            Err(panic) => {
                let failure = Failure::unknown(format!(
                    "{} panicked: {}",
                    ctx.request().tool_name(),
                    panic_message(panic.as_ref())
                ));
                let trace = format!(
                    "panic in {} at attempt {}",
                    ctx.request().tool_name(),
                    ctx.request().attempt()
                );
                Response::Failure(failure.with_trace(trace))
            }
        };

        match response {
            Response::Failure(failure) => {
                let failure = self.normalize(failure, ctx);
                ctx.record(
                    EventLevel::Warn,
                    EventKind::Error {
                        kind: failure.kind,
                        message: failure.message.clone(),
                        trace: failure.trace.clone(),
                    },
                );
                Response::Failure(failure)
            }
            success => success,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
