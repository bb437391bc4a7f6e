use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fundmatrix::chart::DEFAULT_CHART_DAYS;
use fundmatrix::{FundingSortKey, PageLimit, SortKey, TimeWindow};

/// screener: cross-exchange funding-rate arbitrage screener.
#[derive(Parser, Debug)]
#[command(name = "screener", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rank tokens by their best funding spread
    Screen(ScreenArgs),

    /// Show every market of one token and its best long/short pair
    Pair(PairArgs),

    /// List precomputed long/short opportunities for one or more windows
    Arb(ArbArgs),

    /// List per-market funding rates
    Funding(FundingArgs),

    /// Print a funding or spread history series
    Chart(ChartArgs),
}

/// Arguments for the `screen` subcommand.
#[derive(Parser, Debug)]
pub struct ScreenArgs {
    /// Screener payload saved from the dashboard API
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Rate window (now, 1d, 3d, 7d, 15d, 30d)
    #[arg(long, default_value = "now")]
    pub window: TimeWindow,

    /// Token prefix to search for
    #[arg(long)]
    pub search: Option<String>,

    /// Only consider these exchanges (repeatable)
    #[arg(long = "exchange")]
    pub exchanges: Vec<String>,

    /// Minimum spread in APR percent
    #[arg(long)]
    pub min_apr: Option<f64>,

    /// Sort column
    #[arg(long, value_enum, default_value_t = SortArg::MaxArb)]
    pub sort: SortArg,

    /// Sort ascending instead of descending
    #[arg(long)]
    pub asc: bool,

    /// Market key to keep as one leg of every pair (e.g. binance)
    #[arg(long)]
    pub pin: Option<String>,

    /// Rows per page, or `all`
    #[arg(long, default_value = "20")]
    pub limit: PageLimit,

    /// Page to show, starting at 1
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Output as JSON instead of TSV
    #[arg(long)]
    pub json: bool,

    /// Re-print every N seconds
    #[arg(long, value_name = "SECS")]
    pub watch: Option<u64>,

    /// With --watch, re-read the snapshot once the loaded copy is older
    /// than this (defaults to the configured cache age)
    #[arg(long, value_name = "SECS")]
    pub max_age: Option<u64>,
}

/// Arguments for the `pair` subcommand.
#[derive(Parser, Debug)]
pub struct PairArgs {
    /// Screener payload saved from the dashboard API
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Token symbol as listed in the snapshot (e.g. ETH, 1000PEPE)
    pub token: String,

    /// Rate window (now, 1d, 3d, 7d, 15d, 30d)
    #[arg(long, default_value = "now")]
    pub window: TimeWindow,

    /// Only consider these exchanges (repeatable)
    #[arg(long = "exchange")]
    pub exchanges: Vec<String>,

    /// Market key to keep as one leg of the pair
    #[arg(long)]
    pub pin: Option<String>,

    /// Output as JSON instead of TSV
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `arb` subcommand.
#[derive(Parser, Debug)]
pub struct ArbArgs {
    /// Dashboard payload with an `arbitrage` table
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Windows to list (repeatable)
    #[arg(long = "window", default_value = "now")]
    pub windows: Vec<TimeWindow>,

    /// Base-asset prefix to search for
    #[arg(long)]
    pub search: Option<String>,

    /// Only list pairs with both legs on these exchanges (repeatable)
    #[arg(long = "exchange")]
    pub exchanges: Vec<String>,

    /// Sort by APR ascending instead of descending
    #[arg(long)]
    pub asc: bool,

    /// Rows per page, or `all`
    #[arg(long, default_value = "20")]
    pub limit: PageLimit,

    /// Page to show, starting at 1
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Output as JSON instead of TSV
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `funding` subcommand.
#[derive(Parser, Debug)]
pub struct FundingArgs {
    /// Dashboard payload with a `funding` table
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Market symbol prefix (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,

    /// Only list these exchanges (repeatable)
    #[arg(long = "exchange")]
    pub exchanges: Vec<String>,

    /// Sort column
    #[arg(long, value_enum, default_value_t = FundingSortArg::Volume)]
    pub sort: FundingSortArg,

    /// Window used by `--sort rate`
    #[arg(long, default_value = "now")]
    pub window: TimeWindow,

    /// Sort ascending instead of descending
    #[arg(long)]
    pub asc: bool,

    /// Rows to show, or `all`
    #[arg(long, default_value = "50")]
    pub limit: PageLimit,

    /// Output as JSON instead of TSV
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `chart` subcommand.
#[derive(Parser, Debug)]
pub struct ChartArgs {
    #[command(subcommand)]
    pub series: ChartCommand,
}

#[derive(Subcommand, Debug)]
pub enum ChartCommand {
    /// Funding history of one market
    Funding {
        #[command(flatten)]
        common: ChartCommon,

        /// Market id as listed in the funding table
        #[arg(long)]
        market_id: i64,
    },

    /// Spread history of one long/short pair
    Arb {
        #[command(flatten)]
        common: ChartCommon,

        /// Base asset (e.g. ETH)
        token: String,

        /// Exchange of the long leg
        #[arg(long)]
        long: String,

        /// Exchange of the short leg
        #[arg(long)]
        short: String,
    },
}

#[derive(Args, Debug)]
pub struct ChartCommon {
    /// Dashboard payload with recorded `rpc` responses
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Days of history to request
    #[arg(long, default_value_t = DEFAULT_CHART_DAYS)]
    pub days: u32,

    /// Output as JSON instead of TSV
    #[arg(long)]
    pub json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundingSortArg {
    Volume,
    Market,
    Rate,
}

impl From<FundingSortArg> for FundingSortKey {
    fn from(arg: FundingSortArg) -> Self {
        match arg {
            FundingSortArg::Volume => FundingSortKey::Volume,
            FundingSortArg::Market => FundingSortKey::Market,
            FundingSortArg::Rate => FundingSortKey::Rate,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortArg {
    Token,
    MaxArb,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Token => SortKey::Token,
            SortArg::MaxArb => SortKey::MaxArb,
        }
    }
}
