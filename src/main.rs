use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    shelfpulse::logging::init().context("init logging")?;

    let cli = shelfpulse::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        shelfpulse::cli::Command::Snapshot(args) => {
            shelfpulse::snapshot::run(args).await.context("snapshot")?;
        }
        shelfpulse::cli::Command::Inspect(args) => {
            shelfpulse::inspect::run(args).context("inspect")?;
        }
    }

    Ok(())
}
