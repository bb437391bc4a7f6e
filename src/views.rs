use std::io::{self, BufWriter};
use std::sync::Arc;

use chrono::Utc;
use fundmatrix::chart::build_series;
use fundmatrix::funding_table::funding_exchanges;
use fundmatrix::opportunities::leg_exchanges;
use fundmatrix::screener::{paginate, total_pages};
use fundmatrix::{
    filter_opportunities, funding_table, load_arb_chart, load_funding_chart, load_funding_rows,
    load_opportunities_cached, ArbChartParams, ArbRow, ChartPoint, FundingChartParams,
    FundingQuery, OpportunityCache, OpportunityQuery, SnapshotSource, SortDirection, TimeWindow,
};
use tracing::{debug, info, warn};

use crate::cli::{ArbArgs, ChartArgs, ChartCommand, FundingArgs};
use crate::error::ScreenerError;
use crate::output::{self, ArbPage};
use crate::screen::Context;

fn direction(asc: bool) -> SortDirection {
    if asc {
        SortDirection::Asc
    } else {
        SortDirection::Desc
    }
}

fn warn_unknown_exchanges(selected: &[String], known: &[String]) {
    for exchange in selected.iter().filter(|e| !known.contains(e)) {
        warn!(exchange = %exchange, "exchange not in snapshot");
    }
}

/// Print the opportunities of every requested window.
///
/// Windows share one cache, so a window listed twice is read once.
pub async fn run_arb(args: &ArbArgs, ctx: &Context) -> Result<(), ScreenerError> {
    let source = SnapshotSource::open(&args.snapshot).await?;
    let cache = OpportunityCache::new();

    let mut loaded: Vec<(TimeWindow, Arc<Vec<ArbRow>>)> = Vec::with_capacity(args.windows.len());
    for &window in &args.windows {
        match load_opportunities_cached(&source, window, &ctx.config, &cache).await? {
            Some(rows) => loaded.push((window, rows)),
            None => debug!(window = %window, "superseded load dropped"),
        }
    }

    let known: Vec<String> = loaded
        .iter()
        .flat_map(|(_, rows)| leg_exchanges(rows))
        .collect();
    warn_unknown_exchanges(&args.exchanges, &known);

    let query = OpportunityQuery {
        search: args.search.clone().unwrap_or_default(),
        exchanges: args.exchanges.clone(),
        direction: direction(args.asc),
    };
    let filtered: Vec<(TimeWindow, Vec<&ArbRow>)> = loaded
        .iter()
        .map(|(window, rows)| (*window, filter_opportunities(rows, &query, &ctx.normalizer)))
        .collect();

    let mut pages = Vec::with_capacity(filtered.len());
    for (window, rows) in &filtered {
        let page_count = total_pages(rows.len(), args.limit);
        if args.page == 0 || args.page > page_count {
            return Err(ScreenerError::PageOutOfRange {
                page: args.page,
                pages: page_count,
            });
        }
        debug!(window = %window, total = rows.len(), "opportunities filtered");
        pages.push(ArbPage {
            window: *window,
            page: args.page,
            pages: page_count,
            total: rows.len(),
            rows: paginate(rows, args.limit, args.page - 1),
        });
    }

    let mut writer = BufWriter::new(io::stdout().lock());
    let mut buf = String::with_capacity(4096);
    output::write_opportunities(&pages, args.json, &mut buf, &mut writer)
}

/// Print the per-market funding table.
pub async fn run_funding(args: &FundingArgs, ctx: &Context) -> Result<(), ScreenerError> {
    let source = SnapshotSource::open(&args.snapshot).await?;
    let rows = load_funding_rows(&source, &ctx.config).await?;
    warn_unknown_exchanges(&args.exchanges, &funding_exchanges(&rows));

    let query = FundingQuery {
        search: args.search.clone().unwrap_or_default(),
        exchanges: args.exchanges.clone(),
        window: args.window,
        sort: args.sort.into(),
        direction: direction(args.asc),
        limit: args.limit,
    };
    let table = funding_table(&rows, &query);
    info!(shown = table.rows.len(), total = table.total, "funding table");

    let mut writer = BufWriter::new(io::stdout().lock());
    let mut buf = String::with_capacity(4096);
    output::write_funding(&table.rows, table.total, args.json, &mut buf, &mut writer)
}

/// Print a funding or spread series.
pub async fn run_chart(args: &ChartArgs, ctx: &Context) -> Result<(), ScreenerError> {
    let (common, points): (_, Vec<ChartPoint>) = match &args.series {
        ChartCommand::Funding { common, market_id } => {
            let source = SnapshotSource::open(&common.snapshot).await?;
            let params = FundingChartParams {
                p_market_id: *market_id,
                p_days: common.days,
            };
            (common, load_funding_chart(&source, &params, &ctx.config).await?)
        }
        ChartCommand::Arb {
            common,
            token,
            long,
            short,
        } => {
            let source = SnapshotSource::open(&common.snapshot).await?;
            let params = ArbChartParams {
                p_base_asset: token.trim().to_uppercase(),
                p_long_exchange: long.clone(),
                p_short_exchange: short.clone(),
                p_days: common.days,
            };
            (common, load_arb_chart(&source, &params, &ctx.config).await?)
        }
    };

    let series = build_series(&points, Utc::now());
    let dropped = points.len() - series.points.len();
    if dropped > 0 {
        debug!(dropped, "points without a finite value or valid time skipped");
    }
    info!(
        points = series.points.len(),
        min_x = series.min_x,
        max_x = series.max_x,
        "series built"
    );

    let mut writer = BufWriter::new(io::stdout().lock());
    let mut buf = String::with_capacity(4096);
    output::write_chart(&series, common.json, &mut buf, &mut writer)
}
