use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fundmatrix::columns::{allowed_keys, exchanges};
use fundmatrix::screener::{paginate, total_pages};
use fundmatrix::{
    find_best_pair_pinned, load_screener, screen, BacktestLinkBuilder, GenerationCache,
    ScreenerConfig, ScreenerQuery, ScreenerSnapshot, SnapshotSource, SortDirection,
    SymbolNormalizer, Ticket,
};
use tokio::task::JoinSet;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cli::{PairArgs, ScreenArgs};
use crate::error::ScreenerError;
use crate::output::{self, ScreenPage};

type SnapshotCache = GenerationCache<PathBuf, ScreenerSnapshot>;

/// Everything derived once from the configuration.
pub struct Context {
    pub config: Arc<ScreenerConfig>,
    pub normalizer: SymbolNormalizer,
    pub links: BacktestLinkBuilder,
}

impl Context {
    pub fn new(config: ScreenerConfig) -> Result<Self, ScreenerError> {
        let links = BacktestLinkBuilder::new(&config.backtester_url)?;
        let normalizer = SymbolNormalizer::new(&config.symbol_multipliers);
        Ok(Self {
            config: Arc::new(config),
            normalizer,
            links,
        })
    }
}

/// Read a snapshot file and load it through the paged loader.
async fn load_snapshot(path: &Path, config: &ScreenerConfig) -> Result<ScreenerSnapshot, ScreenerError> {
    let source = SnapshotSource::open(path).await?;
    Ok(load_screener(&source, config).await?)
}

/// What a watch tick does with the snapshot at `path`.
enum Tick {
    /// The loaded copy is still fresh; print it again.
    Render(Arc<ScreenerSnapshot>),
    /// Start a reload under this ticket.
    Reload(Ticket<PathBuf>),
}

fn on_tick(cache: &SnapshotCache, path: &Path, max_age: Duration) -> Tick {
    let key = path.to_path_buf();
    match cache.get(&key, Some(max_age)) {
        Some(snapshot) => Tick::Render(snapshot),
        None => Tick::Reload(cache.begin(key)),
    }
}

/// Print one screener page, or print again every `--watch` seconds until
/// cancelled.
///
/// In watch mode the loaded snapshot is reused until it is older than
/// `--max-age` (default `cache_max_age`), then a tick starts a reload. A
/// load that finishes after a newer one has started is dropped instead of
/// printed.
pub async fn run_screen(
    args: &ScreenArgs,
    ctx: &Context,
    cancel: CancellationToken,
) -> Result<(), ScreenerError> {
    let query = ScreenerQuery {
        search: args.search.clone().unwrap_or_default(),
        window: args.window,
        exchanges: args.exchanges.clone(),
        min_apr: args.min_apr,
        sort: args.sort.into(),
        direction: if args.asc {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        },
        pinned: args.pin.clone(),
    };

    let Some(secs) = args.watch else {
        let snapshot = load_snapshot(&args.snapshot, &ctx.config).await?;
        return render_screen(&snapshot, &query, args, ctx);
    };

    let cache: Arc<SnapshotCache> = Arc::new(GenerationCache::new());
    let max_age = args.max_age.map_or(ctx.config.cache_max_age, Duration::from_secs);
    let mut loads: JoinSet<(Ticket<PathBuf>, Result<ScreenerSnapshot, ScreenerError>)> = JoinSet::new();
    let mut interval = time::interval(Duration::from_secs(secs.max(1)));
    info!(
        path = %args.snapshot.display(),
        every_secs = secs,
        max_age_secs = max_age.as_secs(),
        "watching snapshot"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let ticket = match on_tick(&cache, &args.snapshot, max_age) {
                    Tick::Render(snapshot) => {
                        debug!("serving loaded snapshot");
                        if let Err(e) = render_screen(&snapshot, &query, args, ctx) {
                            error!(error = %e, "render failed");
                        }
                        continue;
                    }
                    Tick::Reload(ticket) => ticket,
                };
                let config = Arc::clone(&ctx.config);
                debug!(generation = ticket.generation(), "reload started");
                loads.spawn(async move {
                    let result = load_snapshot(ticket.key(), &config).await;
                    (ticket, result)
                });
            }
            Some(joined) = loads.join_next(), if !loads.is_empty() => {
                let (ticket, result) = match joined {
                    Ok(done) => done,
                    Err(e) => {
                        error!(error = %e, "reload task failed");
                        continue;
                    }
                };
                match result {
                    Ok(snapshot) => {
                        if !cache.complete(ticket, snapshot) {
                            continue;
                        }
                        let Some(snapshot) = cache.get(&args.snapshot, None) else {
                            continue;
                        };
                        if let Err(e) = render_screen(&snapshot, &query, args, ctx) {
                            error!(error = %e, "render failed");
                        }
                    }
                    Err(e) if cache.is_current(&ticket) => error!(error = %e, "reload failed"),
                    Err(e) => debug!(error = %e, "superseded reload failed"),
                }
            }
            _ = cancel.cancelled() => {
                loads.abort_all();
                info!("watch stopped");
                return Ok(());
            }
        }
    }
}

fn render_screen(
    snapshot: &ScreenerSnapshot,
    query: &ScreenerQuery,
    args: &ScreenArgs,
    ctx: &Context,
) -> Result<(), ScreenerError> {
    let known = exchanges(&snapshot.columns);
    for exchange in query.exchanges.iter().filter(|e| !known.contains(e)) {
        warn!(exchange = %exchange, "exchange not in snapshot");
    }

    let rows = screen(
        &snapshot.rows,
        &snapshot.columns,
        query,
        &ctx.normalizer,
        &ctx.links,
    );
    let pages = total_pages(rows.len(), args.limit);
    if args.page == 0 || args.page > pages {
        return Err(ScreenerError::PageOutOfRange {
            page: args.page,
            pages,
        });
    }

    let page = ScreenPage {
        generated_at: snapshot.generated_at.map(|t| t.to_rfc3339()),
        window: query.window,
        page: args.page,
        pages,
        total: rows.len(),
        rows: paginate(&rows, args.limit, args.page - 1),
    };
    debug!(total = page.total, shown = page.rows.len(), page = page.page, "screened");

    let mut writer = BufWriter::new(io::stdout().lock());
    let mut buf = String::with_capacity(4096);
    output::write_screen(&page, args.json, &mut buf, &mut writer)
}

/// Print the markets of one token and its best pair.
pub async fn run_pair(args: &PairArgs, ctx: &Context) -> Result<(), ScreenerError> {
    let snapshot = load_snapshot(&args.snapshot, &ctx.config).await?;
    let row = snapshot
        .rows
        .iter()
        .find(|r| r.token.eq_ignore_ascii_case(args.token.trim()))
        .ok_or_else(|| ScreenerError::TokenNotFound(args.token.clone()))?;

    let allowed = allowed_keys(&snapshot.columns, &args.exchanges);
    let pair = find_best_pair_pinned(
        &row.markets,
        args.window,
        allowed.as_ref(),
        args.pin.as_deref(),
    );
    let url = ctx.links.build(&row.token, pair.as_ref());

    let mut writer = BufWriter::new(io::stdout().lock());
    let mut buf = String::with_capacity(1024);
    output::write_pair(
        row,
        &snapshot.columns,
        args.window,
        pair.as_ref(),
        url.as_ref().map(|u| u.as_str()),
        args.json,
        &mut buf,
        &mut writer,
    )
}
