//! Company profile tools.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;

use super::common::validate_symbol;
use super::quote::SymbolParams;
use crate::core::pipeline::{Arguments, OutputFormat, Payload};
use crate::domains::provider::MarketDataProvider;
use crate::domains::tools::{ToolError, ToolHandler, parse_arguments};

/// Company overview: industry, listing date, charter capital, shares outstanding.
pub struct CompanyOverviewTool {
    provider: Arc<dyn MarketDataProvider>,
}

impl CompanyOverviewTool {
    pub const NAME: &'static str = "company_overview";

    pub const DESCRIPTION: &'static str = "Get a company's profile: exchange, industry, charter capital, outstanding shares and listing information.";

    const PATH: &'static str = "company/overview";

    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ToolHandler for CompanyOverviewTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<SymbolParams>()
    }

    async fn invoke(&self, arguments: &Arguments) -> Result<Payload, ToolError> {
        let params: SymbolParams = parse_arguments(arguments)?;
        let symbol = validate_symbol(&params.symbol)?;
        Ok(self.provider.fetch(Self::PATH, &[("symbol", symbol)]).await?)
    }
}

/// Which officers to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OfficerFilter {
    #[default]
    Working,
    Resigned,
    All,
}

impl OfficerFilter {
    fn as_str(self) -> &'static str {
        match self {
            Self::Working => "working",
            Self::Resigned => "resigned",
            Self::All => "all",
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CompanyOfficersParams {
    #[schemars(description = "Ticker symbol, e.g. VCB")]
    pub symbol: String,

    #[schemars(description = "working (default), resigned or all")]
    #[serde(default)]
    pub filter_by: OfficerFilter,

    #[schemars(description = "Result rendering: markdown (default) or json")]
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

/// Board members and executives with their positions and ownership.
pub struct CompanyOfficersTool {
    provider: Arc<dyn MarketDataProvider>,
}

impl CompanyOfficersTool {
    pub const NAME: &'static str = "company_officers";

    pub const DESCRIPTION: &'static str = "List a company's officers (board members and executives) with position and ownership, optionally including those who resigned.";

    const PATH: &'static str = "company/officers";

    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ToolHandler for CompanyOfficersTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<CompanyOfficersParams>()
    }

    async fn invoke(&self, arguments: &Arguments) -> Result<Payload, ToolError> {
        let params: CompanyOfficersParams = parse_arguments(arguments)?;
        let symbol = validate_symbol(&params.symbol)?;
        let query = [("symbol", symbol), ("filter_by", params.filter_by.as_str().to_string())];
        Ok(self.provider.fetch(Self::PATH, &query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::provider::mock::MockProvider;
    use serde_json::{Value, json};

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_overview_returns_scalar_object() {
        let provider = Arc::new(MockProvider::returning(json!({ "symbol": "VCB", "industry": "Banks" })));
        let tool = CompanyOverviewTool::new(provider.clone());

        let payload = tool.invoke(&args(json!({ "symbol": "vcb" }))).await.unwrap();

        assert!(matches!(payload, Payload::Scalar(_)));
        let call = provider.last_call().unwrap();
        assert_eq!(call.path, "company/overview");
        assert_eq!(call.query, vec![("symbol", "VCB".to_string())]);
    }

    #[tokio::test]
    async fn test_officers_default_filter() {
        let provider = Arc::new(MockProvider::returning(json!([])));
        let tool = CompanyOfficersTool::new(provider.clone());

        tool.invoke(&args(json!({ "symbol": "VCB" }))).await.unwrap();

        let call = provider.last_call().unwrap();
        assert!(call.query.contains(&("filter_by", "working".to_string())));
    }

    #[tokio::test]
    async fn test_officers_rejects_unknown_filter() {
        let provider = Arc::new(MockProvider::returning(json!([])));
        let tool = CompanyOfficersTool::new(provider.clone());

        let err = tool
            .invoke(&args(json!({ "symbol": "VCB", "filter_by": "retired" })))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(provider.calls().is_empty());
    }
}
