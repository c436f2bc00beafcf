//! SJC gold price tool.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;

use super::common::{format_date, parse_date, today};
use crate::core::pipeline::{Arguments, OutputFormat, Payload};
use crate::domains::provider::MarketDataProvider;
use crate::domains::tools::{ToolError, ToolHandler, parse_arguments};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SjcGoldPriceParams {
    #[schemars(description = "Day to look up, YYYY-MM-DD (default: today)")]
    #[serde(default)]
    pub date: Option<String>,

    #[schemars(description = "Result rendering: markdown (default) or json")]
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

/// SJC buy and sell prices per gold product.
pub struct SjcGoldPriceTool {
    provider: Arc<dyn MarketDataProvider>,
}

impl SjcGoldPriceTool {
    pub const NAME: &'static str = "sjc_gold_price";

    pub const DESCRIPTION: &'static str = "Get SJC gold buy and sell prices by product and branch for a given day.";

    const PATH: &'static str = "gold/sjc";

    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ToolHandler for SjcGoldPriceTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<SjcGoldPriceParams>()
    }

    async fn invoke(&self, arguments: &Arguments) -> Result<Payload, ToolError> {
        let params: SjcGoldPriceParams = parse_arguments(arguments)?;
        let date = match params.date.as_deref() {
            Some(value) => parse_date("date", value)?,
            None => today(),
        };
        if date > today() {
            return Err(ToolError::invalid_arguments(format!(
                "date {} is in the future",
                format_date(date)
            )));
        }
        Ok(self.provider.fetch(Self::PATH, &[("date", format_date(date))]).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::provider::mock::MockProvider;
    use serde_json::{Map, json};

    #[tokio::test]
    async fn test_explicit_date() {
        let provider = Arc::new(MockProvider::returning(json!([{ "name": "SJC 1L", "buy": 118.5 }])));
        let tool = SjcGoldPriceTool::new(provider.clone());
        let mut arguments = Map::new();
        arguments.insert("date".into(), json!("2024-05-10"));

        tool.invoke(&arguments).await.unwrap();

        assert_eq!(
            provider.last_call().unwrap().query,
            vec![("date", "2024-05-10".to_string())]
        );
    }

    #[tokio::test]
    async fn test_future_date_rejected() {
        let provider = Arc::new(MockProvider::returning(json!([])));
        let tool = SjcGoldPriceTool::new(provider.clone());
        let mut arguments = Map::new();
        arguments.insert("date".into(), json!("2999-01-01"));

        let err = tool.invoke(&arguments).await.unwrap_err();

        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(provider.calls().is_empty());
    }
}
