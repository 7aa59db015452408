use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;

use shelfpulse::app::router::{AppState, router};
use shelfpulse::app::service::ReadingService;
use shelfpulse::app::source::HttpFeedSource;
use shelfpulse::cli::FeedArgs;
use shelfpulse::config::FeedConfig;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct AppArgs {
    #[arg(long, env = "SHELFPULSE_ADDR", default_value = "0.0.0.0:5050")]
    addr: SocketAddr,

    #[command(flatten)]
    feed: FeedArgs,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    shelfpulse::logging::init()?;

    let args = AppArgs::parse();
    tracing::info!(addr = %args.addr, "starting shelfpulse-app");

    let config = FeedConfig::from_args(&args.feed);
    if config.is_configured() {
        tracing::info!(
            book_ttl_secs = config.book_ttl.as_secs(),
            challenge_ttl_secs = config.challenge_ttl.as_secs(),
            profile = config.profile_url.is_some(),
            "feed configured"
        );
    } else {
        tracing::warn!("feed not configured; /trmnl-data will answer 503 until it is");
    }

    let source = HttpFeedSource::new(config.timeout).context("build feed source")?;
    let service = Arc::new(ReadingService::new(config, Arc::new(source)));
    let app = router(AppState { service });

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
