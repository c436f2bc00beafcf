//! Transport layer for the market-data MCP server.
//!
//! - **STDIO**: rmcp over stdin/stdout (default for MCP) - feature: `stdio`
//! - **HTTP**: JSON-RPC over POST requests - feature: `http`
//!
//! Both transports hand tool calls to the same [`McpServer`](crate::core::McpServer),
//! so a quote or financial-statement request gets the same logging, retry,
//! timing and rendering whether it arrives over STDIO or HTTP.

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "http")]
pub use config::HttpConfig;
