//! Tool-call middleware pipeline.
//!
//! Every tool call is wrapped in a [`Pipeline`]: an ordered chain of
//! [`Middleware`] stages around a terminal [`Handler`]. The standard stack,
//! outermost first, is:
//!
//! 1. [`FormatMiddleware`] renders tabular results as Markdown or JSON
//! 2. [`ErrorHandlingMiddleware`] turns panics into classified failures
//! 3. [`TimingMiddleware`] measures the whole call
//! 4. [`RetryMiddleware`] retries transient failures with backoff
//! 5. [`LoggingMiddleware`] logs each attempt
//!
//! Handlers never leak errors out of the pipeline: every call ends in a
//! [`Response`], either a [`Payload`] or a classified [`Failure`].

mod builder;
mod context;
mod error_handling;
mod format;
mod logging;
mod middleware;
mod request;
mod response;
mod retry;
mod timing;

pub use builder::{Pipeline, PipelineBuilder};
pub use context::{Event, EventKind, EventLevel, EventSink, Interruption, InvocationContext, Outcome};
pub use error_handling::ErrorHandlingMiddleware;
pub use format::{FormatMiddleware, NO_DATA, OUTPUT_FORMAT_ARG, OutputFormat, normalize, render_json, render_markdown};
pub use logging::{LoggingMiddleware, truncate};
pub use middleware::{Handler, Middleware, Next};
pub use request::{Arguments, Request};
pub use response::{ErrorKind, Failure, Payload, Record, Response};
pub use retry::{Backoff, RetryMiddleware, RetryPolicy};
pub use timing::TimingMiddleware;
