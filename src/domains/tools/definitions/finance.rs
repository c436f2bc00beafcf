//! Financial statement tool.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use super::common::validate_symbol;
use crate::core::pipeline::{Arguments, OutputFormat, Payload};
use crate::domains::provider::MarketDataProvider;
use crate::domains::tools::{ToolError, ToolHandler, parse_arguments};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Report {
    BalanceSheet,
    IncomeStatement,
    CashFlow,
    Ratio,
}

impl Report {
    fn path(self) -> &'static str {
        match self {
            Self::BalanceSheet => "finance/balance_sheet",
            Self::IncomeStatement => "finance/income_statement",
            Self::CashFlow => "finance/cash_flow",
            Self::Ratio => "finance/ratio",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Quarter,
    Year,
}

impl Period {
    fn as_str(self) -> &'static str {
        match self {
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FinancialStatementParams {
    #[schemars(description = "Ticker symbol, e.g. VNM")]
    pub symbol: String,

    #[schemars(description = "balance_sheet, income_statement, cash_flow or ratio")]
    pub report: Report,

    #[schemars(description = "quarter (default) or year")]
    #[serde(default)]
    pub period: Period,

    #[schemars(description = "Result rendering: markdown (default) or json")]
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

/// Balance sheet, income statement, cash flow or ratios, one row per period.
pub struct FinancialStatementTool {
    provider: Arc<dyn MarketDataProvider>,
}

impl FinancialStatementTool {
    pub const NAME: &'static str = "financial_statement";

    pub const DESCRIPTION: &'static str = "Get a company's financial statements (balance sheet, income statement, cash flow) or financial ratios, by quarter or by year.";

    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ToolHandler for FinancialStatementTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<FinancialStatementParams>()
    }

    async fn invoke(&self, arguments: &Arguments) -> Result<Payload, ToolError> {
        let params: FinancialStatementParams = parse_arguments(arguments)?;
        let symbol = validate_symbol(&params.symbol)?;
        info!("Fetching {:?} ({}) for {}", params.report, params.period.as_str(), symbol);
        let query = [("symbol", symbol), ("period", params.period.as_str().to_string())];
        Ok(self.provider.fetch(params.report.path(), &query).await?)
    }
}
