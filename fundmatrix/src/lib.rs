pub mod arb;
pub mod cache;
pub mod chart;
pub mod columns;
pub mod config;
pub mod error;
pub mod fetch;
pub mod format;
pub mod funding_table;
pub mod link;
pub mod opportunities;
pub mod rate;
pub mod screener;
pub mod source;
pub mod symbol;
pub mod types;

// ---- Top-level re-exports for ergonomic usage ----

// Config + errors
pub use config::ScreenerConfig;
pub use error::{FundmatrixError, Result};

// Matrix types
pub use types::{
    ArbLeg, ArbRow, ChartPoint, ExchangeColumn, FundingRow, Market, MarketMap, ScreenerSnapshot,
    TimeWindow, TokenRow,
};

// Arbitrage core
pub use arb::{find_best_pair, find_best_pair_pinned, max_spread, ArbPair};
pub use rate::get_rate;

// Search + links
pub use link::BacktestLinkBuilder;
pub use symbol::SymbolNormalizer;

// Screener
pub use screener::{screen, PageLimit, ScreenedRow, ScreenerQuery, SortDirection, SortKey};

// Opportunities, funding table, charts
pub use chart::{build_series, ArbChartParams, ChartSeries, FundingChartParams};
pub use funding_table::{funding_table, FundingQuery, FundingSortKey, FundingTable};
pub use opportunities::{filter_opportunities, OpportunityCache, OpportunityQuery};

// Loading
pub use cache::{GenerationCache, Ticket};
pub use fetch::{
    fetch_all, load_arb_chart, load_funding_chart, load_funding_rows, load_opportunities,
    load_opportunities_cached, load_screener,
};
pub use source::{Filter, OrderBy, PageRequest, RowSource, RpcSource, SnapshotSource};
