//! Fuses the recent feed window into one "currently reading" record.
//!
//! Entries are re-sorted newest first, grouped by [`BookIdentity`], the group
//! with the most recent activity wins, and its fields are merged with
//! per-field precedence.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::entry::{Activity, BookIdentity, FeedEntry};
use crate::progress::{self, ProgressReading};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadingRecord {
    pub title: String,
    pub author: String,
    pub progress_percent: Option<u8>,
    pub progress_snippet: Option<String>,
    pub start_date: Option<DateTime<FixedOffset>>,
    pub update_date: Option<DateTime<FixedOffset>>,
    pub entries_count: usize,
    pub source_entry_ids: BTreeSet<String>,
    pub cover_url: Option<String>,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone)]
pub struct BookGroup {
    pub identity: BookIdentity,
    /// Newest first.
    pub entries: Vec<FeedEntry>,
}

impl BookGroup {
    pub fn latest(&self) -> Option<DateTime<FixedOffset>> {
        self.entries.iter().filter_map(|e| e.published_at).max()
    }
}

/// Newest first; undated entries sort last. Stable, so ties keep feed order.
pub fn sort_newest_first(entries: &mut [FeedEntry]) {
    entries.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

/// The `limit` most recent entries.
pub fn recent_window(mut entries: Vec<FeedEntry>, limit: usize) -> Vec<FeedEntry> {
    sort_newest_first(&mut entries);
    entries.truncate(limit);
    entries
}

/// Reading-related entries grouped by identity, each group newest first.
pub fn group_entries(entries: &[FeedEntry]) -> Vec<BookGroup> {
    let mut sorted = entries
        .iter()
        .filter(|entry| entry.activity.is_reading())
        .cloned()
        .collect::<Vec<_>>();
    sort_newest_first(&mut sorted);

    let mut groups: BTreeMap<BookIdentity, Vec<FeedEntry>> = BTreeMap::new();
    for entry in sorted {
        let Some(identity) = entry.identity() else {
            tracing::trace!(headline = %entry.headline, "entry has no book identity");
            continue;
        };
        groups.entry(identity).or_default().push(entry);
    }

    groups
        .into_iter()
        .map(|(identity, entries)| BookGroup { identity, entries })
        .collect()
}

/// `None` means there is no current book, which is a normal outcome.
pub fn fuse(entries: &[FeedEntry]) -> Option<ReadingRecord> {
    let groups = group_entries(entries);
    let winner = groups.iter().max_by(|a, b| rank(a, b))?;
    tracing::debug!(
        identity = %winner.identity,
        entries = winner.entries.len(),
        candidates = groups.len(),
        "selected current book"
    );
    Some(merge(winner))
}

/// Later activity ranks higher, then more entries, then the smaller identity.
fn rank(a: &BookGroup, b: &BookGroup) -> Ordering {
    a.latest()
        .cmp(&b.latest())
        .then_with(|| a.entries.len().cmp(&b.entries.len()))
        .then_with(|| b.identity.cmp(&a.identity))
}

fn merge(group: &BookGroup) -> ReadingRecord {
    let entries = &group.entries;

    // max_by keeps the last maximum, so iterate oldest first to let the
    // newest of equally complete entries win.
    let names = entries
        .iter()
        .rev()
        .max_by_key(|entry| completeness(entry))
        .map(|entry| (entry.title.clone(), entry.author.clone()))
        .unwrap_or_default();

    let progress: Option<ProgressReading> = entries
        .iter()
        .find_map(|entry| progress::extract_progress(&entry.progress_text()));

    let dates = entries.iter().filter_map(|entry| entry.published_at);

    ReadingRecord {
        title: names.0,
        author: names.1,
        progress_percent: progress.as_ref().map(|p| p.percent),
        progress_snippet: progress.map(|p| p.snippet),
        start_date: dates.clone().min(),
        update_date: dates.max(),
        entries_count: entries.len(),
        source_entry_ids: entries.iter().map(|entry| entry.guid.clone()).collect(),
        cover_url: entries.iter().find_map(|entry| entry.cover_url.clone()),
        activities: entries.iter().map(|entry| entry.activity).collect(),
    }
}

fn completeness(entry: &FeedEntry) -> usize {
    [&entry.title, &entry.author]
        .into_iter()
        .filter(|value| !value.trim().is_empty())
        .count()
}
