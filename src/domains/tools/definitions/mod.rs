//! Tool definitions module.
//!
//! Each file groups the tools of one dataset family. Every tool validates
//! its arguments and forwards a single request to the market-data provider.

pub mod common;
pub mod company;
pub mod finance;
pub mod gold;
pub mod listing;
pub mod quote;

pub use company::{CompanyOfficersTool, CompanyOverviewTool};
pub use finance::FinancialStatementTool;
pub use gold::SjcGoldPriceTool;
pub use listing::AllSymbolsTool;
pub use quote::{IntradayTool, PriceBoardTool, PriceDepthTool, QuoteHistoryTool};
