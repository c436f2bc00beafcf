//! MCP Server implementation and lifecycle management.
//!
//! The server owns the tool registry and the middleware pipeline built
//! around it. Both the rmcp tool router (STDIO) and the HTTP transport
//! dispatch through the same pipeline, so every call gets the same logging,
//! retry, timing and formatting behavior regardless of transport.

use rmcp::{ServerHandler, handler::server::tool::ToolRouter, model::*, tool_handler};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::config::Config;
use super::error::Result as CoreResult;
use super::pipeline::{Pipeline, Request, Response};
use crate::domains::{
    provider::{HttpProvider, MarketDataProvider},
    tools::{ToolRegistry, build_tool_router},
};

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Every tool the server exposes.
    registry: Arc<ToolRegistry>,

    /// Middleware chain wrapped around the registry.
    pipeline: Arc<Pipeline>,

    /// Tool router for handling tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a server backed by the HTTP provider described in `config`.
    pub fn new(config: Config) -> CoreResult<Self> {
        config.validate()?;
        let provider = HttpProvider::new(&config.provider)?;
        info!("Market data provider: {}", provider.base_url());
        Ok(Self::with_provider(config, Arc::new(provider)))
    }

    /// Create a server backed by any provider.
    pub fn with_provider(config: Config, provider: Arc<dyn MarketDataProvider>) -> Self {
        let config = Arc::new(config);
        let registry = Arc::new(ToolRegistry::with_market_tools(provider));
        let pipeline = Arc::new(Pipeline::from_config(&config.pipeline, registry.clone()));
        info!("Registered {} tools", registry.len());

        Self {
            tool_router: build_tool_router::<Self>(&registry, pipeline.clone()),
            config,
            registry,
            pipeline,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools (for HTTP transport).
    pub fn list_tools(&self) -> Vec<serde_json::Value> {
        self.registry
            .tools()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Run a tool call through the pipeline.
    pub async fn call_tool(&self, name: &str, arguments: serde_json::Value) -> Response {
        self.pipeline.call(Request::from_value(name, arguments)).await
    }

    /// Run a tool call through the pipeline, stopping when `cancel` fires.
    pub async fn call_tool_with(
        &self,
        name: &str,
        arguments: serde_json::Value,
        cancel: CancellationToken,
    ) -> Response {
        self.pipeline
            .call_with(Request::from_value(name, arguments), cancel)
            .await
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Market data tools: price history, intraday trades, price board, company \
                 profiles, financial statements, symbol listings and SJC gold prices. Tabular \
                 results are Markdown tables by default; pass output_format=\"json\" for JSON."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::{ErrorKind, NO_DATA, Payload};
    use crate::domains::provider::ProviderError;
    use crate::domains::provider::mock::MockProvider;
    use serde_json::json;

    fn server(provider: MockProvider) -> McpServer {
        McpServer::with_provider(Config::default(), Arc::new(provider))
    }

    struct PanickingProvider;

    #[async_trait::async_trait]
    impl MarketDataProvider for PanickingProvider {
        async fn fetch(&self, _path: &str, _query: &[(&'static str, String)]) -> Result<Payload, ProviderError> {
            panic!("unexpected provider payload");
        }
    }

    fn text(response: &Response) -> &str {
        match response {
            Response::Success(Payload::Text(text)) => text,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_list_tools() {
        let server = server(MockProvider::returning(json!([])));
        let tools = server.list_tools();
        assert_eq!(tools.len(), 9);
        assert!(tools.iter().all(|t| t["inputSchema"].is_object()));
        assert!(tools.iter().any(|t| t["name"] == "quote_history"));
    }

    #[test]
    fn test_server_info_enables_tools_only() {
        let info = server(MockProvider::returning(json!([]))).get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_none());
        assert!(info.capabilities.prompts.is_none());
    }

    #[tokio::test]
    async fn test_call_renders_markdown_by_default() {
        let server = server(MockProvider::returning(json!([
            { "symbol": "VCB", "close": 92.3 },
        ])));

        let response = server.call_tool("price_board", json!({ "symbols": ["VCB"] })).await;

        assert_eq!(
            text(&response),
            "```\n| symbol | close |\n|--------|-------|\n| VCB    | 92.3  |\n```"
        );
    }

    #[tokio::test]
    async fn test_call_honors_output_format() {
        let server = server(MockProvider::returning(json!([{ "symbol": "VCB" }])));

        let response = server
            .call_tool("company_officers", json!({ "symbol": "VCB", "output_format": "json" }))
            .await;

        assert_eq!(text(&response), r#"[{"symbol":"VCB"}]"#);
    }

    #[tokio::test]
    async fn test_output_format_is_case_insensitive() {
        let server = server(MockProvider::returning(json!([{ "symbol": "VCB" }])));

        let response = server
            .call_tool("company_officers", json!({ "symbol": "VCB", "output_format": "JSON" }))
            .await;

        assert_eq!(text(&response), r#"[{"symbol":"VCB"}]"#);
    }

    #[tokio::test]
    async fn test_unknown_output_format_is_validation_failure() {
        let server = server(MockProvider::returning(json!([{ "symbol": "VCB" }])));

        let response = server
            .call_tool("company_officers", json!({ "symbol": "VCB", "output_format": "xml" }))
            .await;

        assert_eq!(response.error_kind(), Some(ErrorKind::Validation));
    }

    #[tokio::test]
    async fn test_client_text_carries_no_trace_by_default() {
        let server = McpServer::with_provider(Config::default(), Arc::new(PanickingProvider));

        let response = server.call_tool("sjc_gold_price", json!({})).await;

        assert_eq!(
            response.to_text(),
            "Unknown: sjc_gold_price panicked: unexpected provider payload"
        );
        assert!(matches!(
            response,
            Response::Failure(ref f) if f.trace.as_deref() == Some("panic in sjc_gold_price at attempt 1")
        ));
    }

    #[tokio::test]
    async fn test_empty_result() {
        let server = server(MockProvider::returning(json!([])));
        let response = server.call_tool("all_symbols", json!({})).await;
        assert_eq!(text(&response), NO_DATA);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_validation_failure() {
        let server = server(MockProvider::returning(json!([])));
        let response = server.call_tool("get_weather", json!({})).await;
        assert_eq!(response.error_kind(), Some(ErrorKind::Validation));
        assert_eq!(response.to_text(), "Validation: Tool not found: get_weather");
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_provider_failure_is_retried() {
        let provider = MockProvider::returning(json!([{ "name": "SJC 1L", "buy": 118.5 }]))
            .then(Err(ProviderError::connect("connection reset by peer")));
        let server = server(provider);

        let response = server.call_tool("sjc_gold_price", json!({})).await;

        assert!(response.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_request_is_not_retried() {
        let provider = MockProvider::returning(json!([])).then(Err(ProviderError::Rejected {
            status: 404,
            body: "unknown symbol".into(),
        }));
        let server = server(provider);

        let response = server.call_tool("company_overview", json!({ "symbol": "ZZZ" })).await;

        assert_eq!(response.error_kind(), Some(ErrorKind::Validation));
    }
}
