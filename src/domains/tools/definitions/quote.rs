//! Price and trading data tools.
//!
//! - `quote_history`: OHLCV bars over a date range
//! - `intraday`: today's matched trades, paged
//! - `price_depth`: volume accumulated per price step
//! - `price_board`: real-time board for a list of symbols

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use super::common::{date_range, default_interval, format_date, today, validate_interval, validate_symbol};
use crate::core::pipeline::{Arguments, OutputFormat, Payload};
use crate::domains::provider::{MarketDataProvider, Query};
use crate::domains::tools::{ToolError, ToolHandler, parse_arguments};

const MAX_PAGE_SIZE: u32 = 30_000;
const MAX_BOARD_SYMBOLS: usize = 50;

// ============================================================================
// quote_history
// ============================================================================

/// Parameters for historical quotes.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QuoteHistoryParams {
    /// Ticker symbol, e.g. "VNM".
    #[schemars(description = "Ticker symbol (3-12 letters or digits), e.g. VNM")]
    pub symbol: String,

    #[schemars(description = "First day, YYYY-MM-DD (default: 30 days before end_date)")]
    #[serde(default)]
    pub start_date: Option<String>,

    #[schemars(description = "Last day, YYYY-MM-DD (default: today)")]
    #[serde(default)]
    pub end_date: Option<String>,

    #[schemars(description = "Bar interval: 1m, 5m, 15m, 30m, 1H, 1D, 1W or 1M (default: 1D)")]
    #[serde(default = "default_interval")]
    pub interval: String,

    #[schemars(description = "Result rendering: markdown (default) or json")]
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

pub struct QuoteHistoryTool {
    provider: Arc<dyn MarketDataProvider>,
}

impl QuoteHistoryTool {
    pub const NAME: &'static str = "quote_history";

    pub const DESCRIPTION: &'static str = "Get historical OHLCV price bars for a stock, index or derivative symbol over a date range. Defaults to daily bars for the last 30 days.";

    const PATH: &'static str = "quote/history";

    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    fn query(params: &QuoteHistoryParams, today: NaiveDate) -> Result<Query, ToolError> {
        let symbol = validate_symbol(&params.symbol)?;
        let interval = validate_interval(&params.interval)?;
        let (start, end) = date_range(params.start_date.as_deref(), params.end_date.as_deref(), today)?;
        Ok(vec![
            ("symbol", symbol),
            ("start", format_date(start)),
            ("end", format_date(end)),
            ("interval", interval.to_string()),
        ])
    }
}

#[async_trait]
impl ToolHandler for QuoteHistoryTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<QuoteHistoryParams>()
    }

    async fn invoke(&self, arguments: &Arguments) -> Result<Payload, ToolError> {
        let params: QuoteHistoryParams = parse_arguments(arguments)?;
        let query = Self::query(&params, today())?;
        info!("Fetching quote history: {:?}", query);
        Ok(self.provider.fetch(Self::PATH, &query).await?)
    }
}

// ============================================================================
// intraday
// ============================================================================

fn default_page_size() -> u32 {
    100
}

fn default_page() -> u32 {
    1
}

/// Parameters for intraday trades.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct IntradayParams {
    #[schemars(description = "Ticker symbol, e.g. FPT")]
    pub symbol: String,

    #[schemars(description = "Trades per page (default: 100, max: 30000)")]
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[schemars(description = "1-based page number (default: 1)")]
    #[serde(default = "default_page")]
    pub page: u32,

    #[schemars(description = "Result rendering: markdown (default) or json")]
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

pub struct IntradayTool {
    provider: Arc<dyn MarketDataProvider>,
}

impl IntradayTool {
    pub const NAME: &'static str = "intraday";

    pub const DESCRIPTION: &'static str = "Get intraday matched trades (time, price, volume, side) for a symbol in the current trading session, paged.";

    const PATH: &'static str = "quote/intraday";

    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    fn query(params: &IntradayParams) -> Result<Query, ToolError> {
        let symbol = validate_symbol(&params.symbol)?;
        if !(1..=MAX_PAGE_SIZE).contains(&params.page_size) {
            return Err(ToolError::invalid_arguments(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if params.page == 0 {
            return Err(ToolError::invalid_arguments("page starts at 1"));
        }
        Ok(vec![
            ("symbol", symbol),
            ("page_size", params.page_size.to_string()),
            ("page", params.page.to_string()),
        ])
    }
}

#[async_trait]
impl ToolHandler for IntradayTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<IntradayParams>()
    }

    async fn invoke(&self, arguments: &Arguments) -> Result<Payload, ToolError> {
        let params: IntradayParams = parse_arguments(arguments)?;
        let query = Self::query(&params)?;
        Ok(self.provider.fetch(Self::PATH, &query).await?)
    }
}

// ============================================================================
// price_depth
// ============================================================================

/// Parameters for tools that only need a symbol.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SymbolParams {
    #[schemars(description = "Ticker symbol, e.g. VCB")]
    pub symbol: String,

    #[schemars(description = "Result rendering: markdown (default) or json")]
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

pub struct PriceDepthTool {
    provider: Arc<dyn MarketDataProvider>,
}

impl PriceDepthTool {
    pub const NAME: &'static str = "price_depth";

    pub const DESCRIPTION: &'static str = "Get the volume traded at each price step for a symbol in the current session.";

    const PATH: &'static str = "quote/price_depth";

    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ToolHandler for PriceDepthTool {
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

// ============================================================================
// price_board
// ============================================================================

/// Parameters for the price board.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PriceBoardParams {
    #[schemars(description = "Ticker symbols, e.g. [\"VCB\", \"ACB\", \"TCB\"] (1-50)")]
    pub symbols: Vec<String>,

    #[schemars(description = "Result rendering: markdown (default) or json")]
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

pub struct PriceBoardTool {
    provider: Arc<dyn MarketDataProvider>,
}

impl PriceBoardTool {
    pub const NAME: &'static str = "price_board";

    pub const DESCRIPTION: &'static str = "Get the real-time price board (reference, ceiling, floor, last match, bid/ask) for a list of symbols.";

    const PATH: &'static str = "trading/price_board";

    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    fn query(params: &PriceBoardParams) -> Result<Query, ToolError> {
        if params.symbols.is_empty() || params.symbols.len() > MAX_BOARD_SYMBOLS {
            return Err(ToolError::invalid_arguments(format!(
                "symbols must list between 1 and {MAX_BOARD_SYMBOLS} tickers"
            )));
        }
        let symbols = params
            .symbols
            .iter()
            .map(|symbol| validate_symbol(symbol))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(vec![("symbols", symbols.join(","))])
    }
}

#[async_trait]
impl ToolHandler for PriceBoardTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<PriceBoardParams>()
    }

    async fn invoke(&self, arguments: &Arguments) -> Result<Payload, ToolError> {
        let params: PriceBoardParams = parse_arguments(arguments)?;
        let query = Self::query(&params)?;
        info!("Fetching price board for {}", query[0].1);
        Ok(self.provider.fetch(Self::PATH, &query).await?)
    }
}
