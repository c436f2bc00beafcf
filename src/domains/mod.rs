//! Domains module containing business logic organized by bounded contexts.
//!
//! - **provider**: access to the external market-data source
//! - **tools**: MCP tools built on top of the provider

pub mod provider;
pub mod tools;
