//! Tool Registry - central registration and dispatch for all tools.
//!
//! The registry is the single source of truth for tool metadata and the
//! terminal handler of the pipeline: a call for a name it does not know
//! fails as a validation error.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::Tool;
use tracing::{debug, warn};

use super::definitions::{
    AllSymbolsTool, CompanyOfficersTool, CompanyOverviewTool, FinancialStatementTool, IntradayTool,
    PriceBoardTool, PriceDepthTool, QuoteHistoryTool, SjcGoldPriceTool,
};
use super::error::ToolError;
use super::handlers::ToolHandler;
use crate::core::pipeline::{Handler, Payload, Request};
use crate::domains::provider::MarketDataProvider;

/// Name-indexed set of tool handlers.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The full market-data catalogue backed by `provider`.
    pub fn with_market_tools(provider: Arc<dyn MarketDataProvider>) -> Self {
        let mut registry = Self::new();
        registry.register(QuoteHistoryTool::new(provider.clone()));
        registry.register(IntradayTool::new(provider.clone()));
        registry.register(PriceDepthTool::new(provider.clone()));
        registry.register(PriceBoardTool::new(provider.clone()));
        registry.register(CompanyOverviewTool::new(provider.clone()));
        registry.register(CompanyOfficersTool::new(provider.clone()));
        registry.register(FinancialStatementTool::new(provider.clone()));
        registry.register(AllSymbolsTool::new(provider.clone()));
        registry.register(SjcGoldPriceTool::new(provider));
        registry
    }

    /// Add a tool, replacing any tool registered under the same name.
    pub fn register(&mut self, tool: impl ToolHandler + 'static) {
        let name = tool.name();
        if self.tools.insert(name, Arc::new(tool)).is_some() {
            warn!("Tool {} registered twice, keeping the last one", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.tools.get(name)
    }

    /// Get all tool names, sorted.
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }

    /// Get all tools as Tool models (metadata).
    pub fn tools(&self) -> Vec<Tool> {
        self.tools.values().map(|tool| tool.to_tool()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[async_trait]
impl Handler for ToolRegistry {
    async fn invoke(&self, request: &Request) -> Result<Payload, ToolError> {
        let Some(tool) = self.get(request.tool_name()) else {
            warn!("Unknown tool requested: {}", request.tool_name());
            return Err(ToolError::not_found(request.tool_name()));
        };
        debug!(tool = tool.name(), attempt = request.attempt(), "Dispatching tool");
        tool.invoke(request.arguments()).await
    }
}
