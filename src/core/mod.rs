//! Core module containing shared infrastructure components.
//!
//! Configuration, error types, the middleware pipeline, the server handler
//! and the transports that serve it.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod server;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use server::McpServer;
pub use transport::{TransportConfig, TransportService};
