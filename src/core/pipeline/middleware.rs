//! Middleware and handler contracts.
//!
//! Each middleware receives the invocation context and a [`Next`] that runs
//! the remainder of the chain. A middleware can:
//! - inspect the request before passing it on
//! - short-circuit by returning without running `next`
//! - inspect or transform the response on the way out

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use super::context::InvocationContext;
use super::request::Request;
use super::response::{Failure, Payload, Response};
use crate::domains::tools::ToolError;

/// A unit of cross-cutting behavior wrapped around every tool call.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Process a call, usually delegating to `next` exactly once.
    async fn process(&self, ctx: &mut InvocationContext, next: Next<'_>) -> Response;
}

/// The terminal stage: whatever actually executes the tool.
///
/// Implementations report failures as [`ToolError`]; the pipeline turns them
/// into classified [`Failure`] values before any middleware sees them.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn invoke(&self, request: &Request) -> Result<Payload, ToolError>;
}

/// The rest of the chain plus the terminal handler.
///
/// Running a `Next` consumes it. The retry middleware clones it once per
/// attempt; no other stage should.
#[derive(Clone)]
pub struct Next<'a> {
    stages: &'a [Arc<dyn Middleware>],
    handler: &'a dyn Handler,
}

impl<'a> Next<'a> {
    pub(crate) fn new(stages: &'a [Arc<dyn Middleware>], handler: &'a dyn Handler) -> Self {
        Self { stages, handler }
    }

    /// Continue the chain, eventually calling the handler.
    pub fn run<'c>(self, ctx: &'c mut InvocationContext) -> BoxFuture<'c, Response>
    where
        'a: 'c,
    {
        match self.stages.split_first() {
            Some((head, tail)) => head.process(ctx, Next::new(tail, self.handler)),
            None => Box::pin(call_handler(self.handler, ctx)),
        }
    }
}

/// Invoke the handler, racing it against cancellation and the deadline.
async fn call_handler(handler: &dyn Handler, ctx: &mut InvocationContext) -> Response {
    let ctx = &*ctx;
    tokio::select! {
        biased;
        interruption = ctx.interrupted() => Response::failure(Failure::timeout(format!(
            "{interruption} while running {} (attempt {})",
            ctx.request().tool_name(),
            ctx.request().attempt()
        ))),
        result = handler.invoke(ctx.request()) => Response::from(result),
    }
}
