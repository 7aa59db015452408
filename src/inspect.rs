use std::path::PathBuf;

use anyhow::Context as _;

use crate::challenge::{self, ChallengeRecord};
use crate::cli::InspectArgs;
use crate::entry::FeedEntry;
use crate::formats::{ChallengeReport, EntryAnalysis, EntryReport, GroupReport};
use crate::fusion;
use crate::progress;
use crate::rss;

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let input = PathBuf::from(&args.input);
    let bytes =
        std::fs::read(&input).with_context(|| format!("read feed file: {}", input.display()))?;

    let entries = rss::parse_feed(&bytes);
    tracing::debug!(entries = entries.len(), input = %input.display(), "loaded feed");

    let analysis = analyze(entries, args.entry_window.max(1), args.challenge_goal);
    let json = serde_json::to_string_pretty(&analysis).context("serialize analysis")?;
    println!("{json}");
    Ok(())
}

/// Groups, the fused record and the challenge counts for one parsed feed.
/// Challenge text is read newest first so the latest count wins.
pub fn analyze(
    mut entries: Vec<FeedEntry>,
    window: usize,
    known_goal: Option<u32>,
) -> EntryAnalysis {
    let entries_total = entries.len();
    fusion::sort_newest_first(&mut entries);

    let text = entries
        .iter()
        .map(FeedEntry::plain_text)
        .collect::<Vec<_>>()
        .join("\n");
    let challenge = challenge::extract_challenge(&text, known_goal).and_then(|counts| {
        let record = ChallengeRecord::from_counts(&counts, chrono::Utc::now())?;
        Some(ChallengeReport {
            current_count: record.current_count,
            goal_count: record.goal_count,
            progress_percent: record.progress_percent,
            snippet: record.snippet,
        })
    });

    let window = fusion::recent_window(entries, window);
    let groups = fusion::group_entries(&window)
        .into_iter()
        .map(|group| GroupReport {
            identity: group.identity.to_string(),
            entries: group.entries.iter().map(entry_report).collect(),
        })
        .collect();

    EntryAnalysis {
        entries_total,
        entries_in_window: window.len(),
        groups,
        current: fusion::fuse(&window),
        challenge,
    }
}

fn entry_report(entry: &FeedEntry) -> EntryReport {
    EntryReport {
        guid: entry.guid.clone(),
        title: entry.title.clone(),
        author: entry.author.clone(),
        activity: entry.activity,
        headline: entry.headline.clone(),
        published_at: entry.published_at,
        progress: progress::extract_progress(&entry.progress_text()),
    }
}
