//! Pipeline composition.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::context::InvocationContext;
use super::error_handling::ErrorHandlingMiddleware;
use super::format::FormatMiddleware;
use super::logging::LoggingMiddleware;
use super::middleware::{Handler, Middleware, Next};
use super::request::Request;
use super::response::Response;
use super::retry::RetryMiddleware;
use super::timing::TimingMiddleware;
use crate::core::config::PipelineConfig;

/// An immutable chain of middleware around a terminal handler.
///
/// The first registered middleware is the outermost layer: it sees the
/// request first and the response last.
#[derive(Clone)]
pub struct Pipeline {
    stages: Arc<[Arc<dyn Middleware>]>,
    handler: Arc<dyn Handler>,
    call_timeout: Option<Duration>,
}

impl Pipeline {
    /// Compose `middlewares`, in execution order, around `handler`.
    pub fn new(middlewares: Vec<Arc<dyn Middleware>>, handler: Arc<dyn Handler>) -> Self {
        Self {
            stages: middlewares.into(),
            handler,
            call_timeout: None,
        }
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The standard stack: format, error handling, timing, retry, logging.
    pub fn from_config(config: &PipelineConfig, handler: Arc<dyn Handler>) -> Self {
        let pipeline = Self::builder()
            .with(FormatMiddleware::new(config.output_format))
            .with(ErrorHandlingMiddleware::new(config.include_trace))
            .with(TimingMiddleware::new())
            .with(RetryMiddleware::new(config.retry.policy()))
            .with(LoggingMiddleware::new(
                config.include_payloads,
                config.max_payload_length,
            ))
            .call_timeout(config.call_timeout())
            .build(handler);
        info!("Pipeline ready: {}", pipeline.stage_names().join(" -> "));
        pipeline
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Create a context for `request`, applying the configured call timeout.
    pub fn context(&self, request: Request) -> InvocationContext {
        let ctx = InvocationContext::new(request);
        match self.call_timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }

    /// Run a prepared context through the chain.
    pub async fn handle(&self, ctx: &mut InvocationContext) -> Response {
        Next::new(&self.stages, self.handler.as_ref()).run(ctx).await
    }

    /// Run a request that cannot be cancelled by the caller.
    pub async fn call(&self, request: Request) -> Response {
        let mut ctx = self.context(request);
        self.handle(&mut ctx).await
    }

    /// Run a request, stopping early when `cancel` fires.
    pub async fn call_with(&self, request: Request, cancel: CancellationToken) -> Response {
        let mut ctx = self.context(request).with_cancellation(cancel);
        self.handle(&mut ctx).await
    }
}

/// Collects middleware in registration order.
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<Arc<dyn Middleware>>,
    call_timeout: Option<Duration>,
}

impl PipelineBuilder {
    /// Append a middleware; it runs after everything added before it.
    pub fn with(mut self, middleware: impl Middleware + 'static) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Bound each call, retries included.
    pub fn call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn build(self, handler: Arc<dyn Handler>) -> Pipeline {
        Pipeline {
            call_timeout: self.call_timeout,
            ..Pipeline::new(self.stages, handler)
        }
    }
}
