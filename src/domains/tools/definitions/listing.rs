//! Symbol listing tool.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::core::pipeline::{Arguments, OutputFormat, Payload};
use crate::domains::provider::{MarketDataProvider, Query};
use crate::domains::tools::{ToolError, ToolHandler, parse_arguments};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    Hose,
    Hnx,
    Upcom,
}

impl Exchange {
    fn as_str(self) -> &'static str {
        match self {
            Self::Hose => "HOSE",
            Self::Hnx => "HNX",
            Self::Upcom => "UPCOM",
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AllSymbolsParams {
    #[schemars(description = "Restrict to one exchange: HOSE, HNX or UPCOM (default: all)")]
    #[serde(default)]
    pub exchange: Option<Exchange>,

    #[schemars(description = "Result rendering: markdown (default) or json")]
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

/// Every listed symbol with its organization name.
pub struct AllSymbolsTool {
    provider: Arc<dyn MarketDataProvider>,
}

impl AllSymbolsTool {
    pub const NAME: &'static str = "all_symbols";

    pub const DESCRIPTION: &'static str = "List all listed ticker symbols with their organization names, optionally restricted to one exchange.";

    const PATH: &'static str = "listing/symbols";

    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ToolHandler for AllSymbolsTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<AllSymbolsParams>()
    }

    async fn invoke(&self, arguments: &Arguments) -> Result<Payload, ToolError> {
        let params: AllSymbolsParams = parse_arguments(arguments)?;
        let query: Query = params
            .exchange
            .map(|exchange| vec![("exchange", exchange.as_str().to_string())])
            .unwrap_or_default();
        Ok(self.provider.fetch(Self::PATH, &query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::provider::mock::MockProvider;
    use serde_json::{Map, json};

    #[tokio::test]
    async fn test_no_arguments_lists_everything() {
        let provider = Arc::new(MockProvider::returning(json!([{ "symbol": "AAA" }])));
        let tool = AllSymbolsTool::new(provider.clone());

        tool.invoke(&Map::new()).await.unwrap();

        let call = provider.last_call().unwrap();
        assert_eq!(call.path, "listing/symbols");
        assert!(call.query.is_empty());
    }

    #[tokio::test]
    async fn test_exchange_filter() {
        let provider = Arc::new(MockProvider::returning(json!([])));
        let tool = AllSymbolsTool::new(provider.clone());
        let mut arguments = Map::new();
        arguments.insert("exchange".into(), json!("HNX"));

        tool.invoke(&arguments).await.unwrap();

        assert_eq!(
            provider.last_call().unwrap().query,
            vec![("exchange", "HNX".to_string())]
        );
    }
}
