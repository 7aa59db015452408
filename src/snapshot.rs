use std::sync::Arc;

use anyhow::Context as _;

use crate::app::service::ReadingService;
use crate::app::source::HttpFeedSource;
use crate::cli::SnapshotArgs;
use crate::config::FeedConfig;
use crate::formats;

pub async fn run(args: SnapshotArgs) -> anyhow::Result<()> {
    let config = FeedConfig::from_args(&args.feed);
    config.feed_url()?;

    let source = HttpFeedSource::new(config.timeout).context("build feed source")?;
    let service = ReadingService::new(config, Arc::new(source));

    let snapshot = service.snapshot().await.context("load reading snapshot")?;
    let payload = formats::render_payload(
        snapshot.book(),
        snapshot.challenge(),
        chrono::Local::now().fixed_offset(),
    );

    let json = if args.pretty {
        serde_json::to_string_pretty(&payload)
    } else {
        serde_json::to_string(&payload)
    }
    .context("serialize payload")?;
    println!("{json}");
    Ok(())
}
