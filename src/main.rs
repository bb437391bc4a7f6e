mod cli;
mod error;
mod output;
mod screen;
mod views;

use clap::Parser;
use cli::Command;
use fundmatrix::ScreenerConfig;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Initialize tracing
    let filter = cli
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let _ = dotenvy::dotenv(); // load .env if present

    let ctx = match screen::Context::new(config_from_env()) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    info!(backtester = %ctx.links.base_url(), "configuration loaded");

    // Shared cancellation token + signal handlers.
    let cancel = setup_signal_handlers();

    let result = match cli.command {
        Command::Screen(args) => {
            info!(
                snapshot = %args.snapshot.display(),
                window = %args.window,
                json = args.json,
                "screen starting"
            );
            screen::run_screen(&args, &ctx, cancel).await
        }
        Command::Pair(args) => {
            info!(token = %args.token, window = %args.window, "pair starting");
            screen::run_pair(&args, &ctx).await
        }
        Command::Arb(args) => {
            info!(snapshot = %args.snapshot.display(), windows = args.windows.len(), "arb starting");
            views::run_arb(&args, &ctx).await
        }
        Command::Funding(args) => {
            info!(snapshot = %args.snapshot.display(), "funding starting");
            views::run_funding(&args, &ctx).await
        }
        Command::Chart(args) => views::run_chart(&args, &ctx).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "screener error");
        std::process::exit(1);
    }
}

/// Production defaults overridden by `BACKTESTER_URL` and
/// `SYMBOL_MULTIPLIERS` (comma-separated).
fn config_from_env() -> ScreenerConfig {
    let mut config = ScreenerConfig::default();
    if let Ok(url) = std::env::var("BACKTESTER_URL") {
        config.backtester_url = url;
    }
    if let Ok(raw) = std::env::var("SYMBOL_MULTIPLIERS") {
        config.symbol_multipliers = ScreenerConfig::parse_multipliers(&raw);
    }
    config
}

/// Register SIGINT and SIGTERM handlers that trigger the returned token.
fn setup_signal_handlers() -> CancellationToken {
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received SIGINT, shutting down");
        cancel_clone.cancel();
    });

    #[cfg(unix)]
    {
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            let mut sig =
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(sig) => sig,
                    Err(e) => {
                        warn!(error = %e, "failed to register SIGTERM handler");
                        return;
                    }
                };
            sig.recv().await;
            info!("received SIGTERM, shutting down");
            cancel_clone.cancel();
        });
    }

    cancel
}
