mod chart;
mod column;
mod funding;
mod market;
mod opportunity;
mod row;
mod snapshot;
mod window;

pub use chart::ChartPoint;
pub use column::ExchangeColumn;
pub use funding::FundingRow;
pub use market::Market;
pub use opportunity::{ArbLeg, ArbRow};
pub use row::{MarketMap, TokenRow};
pub use snapshot::ScreenerSnapshot;
pub use window::TimeWindow;
