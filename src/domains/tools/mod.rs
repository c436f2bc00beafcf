//! Tools domain module.
//!
//! Tools are the market-data capabilities MCP clients can call. Each tool
//! validates its arguments and delegates to the provider; the pipeline in
//! `core::pipeline` wraps every call with logging, retries, timing and
//! result formatting.
//!
//! ## Architecture
//!
//! - `definitions/` - Tool implementations, grouped by dataset family
//! - `handlers.rs` - The `ToolHandler` trait and argument parsing
//! - `registry.rs` - Name-indexed registry, the pipeline's terminal handler
//! - `router.rs` - rmcp ToolRouter whose routes all go through the pipeline
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Implement `ToolHandler` in a file under `definitions/`
//! 2. Export it in `definitions/mod.rs`
//! 3. Register it in `ToolRegistry::with_market_tools`
//!
//! The router and the HTTP transport pick it up from the registry.

pub mod definitions;
mod error;
mod handlers;
mod registry;
pub mod router;

pub use error::ToolError;
pub use handlers::{ToolHandler, parse_arguments};
pub use registry::ToolRegistry;
pub use router::{build_tool_router, to_call_tool_result};
