//! Market data MCP server.
//!
//! Exposes market-data tools (price history, intraday trades, company
//! profiles, financial statements, listings, gold prices) over the Model
//! Context Protocol. Every tool call runs through a middleware pipeline that
//! logs each attempt, retries transient provider failures with exponential
//! backoff, times the call, classifies errors and renders tabular results as
//! Markdown or JSON.
//!
//! # Architecture
//!
//! - **core**: configuration, errors, the middleware [`Pipeline`](core::Pipeline),
//!   the server handler and its transports
//! - **domains**
//!   - **provider**: HTTP client for the market-data backend
//!   - **tools**: tool definitions and the registry the pipeline dispatches to
//!
//! # Example
//!
//! ```rust,no_run
//! use market_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

pub use core::{Config, Error, McpServer, Result};
