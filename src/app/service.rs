use std::sync::Arc;

use anyhow::Context as _;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::app::cache::{CacheSlot, Cached, SlotStatus};
use crate::app::source::FeedSource;
use crate::challenge::{self, ChallengeRecord};
use crate::config::FeedConfig;
use crate::entry::FeedEntry;
use crate::error::FeedError;
use crate::formats::EntryAnalysis;
use crate::fusion::{self, ReadingRecord};
use crate::inspect;
use crate::rss;

/// Both records as served to one request. `challenge` is `None` both when no
/// challenge text exists and when its slot is cold and unreachable.
#[derive(Debug)]
pub struct Snapshot {
    pub book: Cached<Option<ReadingRecord>>,
    pub challenge: Option<Cached<Option<ChallengeRecord>>>,
}

impl Snapshot {
    pub fn book(&self) -> Option<&ReadingRecord> {
        Option::as_ref(&self.book.value)
    }

    pub fn challenge(&self) -> Option<&ChallengeRecord> {
        self.challenge
            .as_ref()
            .and_then(|cached| Option::as_ref(&cached.value))
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionNotes {
    pub feed_entries: Option<usize>,
    pub progress_snippet: Option<String>,
    pub challenge_snippet: Option<String>,
    pub known_goal: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub configured: bool,
    pub book_cache: SlotStatus,
    pub challenge_cache: SlotStatus,
    pub extraction: ExtractionNotes,
}

/// Created once at startup and shared behind an `Arc`; the two cache slots
/// are its only mutable state besides diagnostics.
pub struct ReadingService {
    config: FeedConfig,
    source: Arc<dyn FeedSource>,
    book: CacheSlot<Option<ReadingRecord>>,
    challenge: CacheSlot<Option<ChallengeRecord>>,
    notes: RwLock<ExtractionNotes>,
}

impl ReadingService {
    pub fn new(config: FeedConfig, source: Arc<dyn FeedSource>) -> Self {
        let notes = ExtractionNotes {
            known_goal: config.challenge_goal,
            ..ExtractionNotes::default()
        };
        Self {
            book: CacheSlot::new("book", config.book_ttl),
            challenge: CacheSlot::new("challenge", config.challenge_ttl),
            config,
            source,
            notes: RwLock::new(notes),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub async fn current_book(&self) -> Result<Cached<Option<ReadingRecord>>, FeedError> {
        self.config.feed_url()?;
        self.book.get_or_compute(|| self.compute_book()).await
    }

    pub async fn current_challenge(
        &self,
    ) -> Result<Cached<Option<ChallengeRecord>>, FeedError> {
        self.config.feed_url()?;
        self.challenge.get_or_compute(|| self.compute_challenge()).await
    }

    /// The book record is required; a cold, unreachable challenge slot only
    /// drops the challenge fields.
    pub async fn snapshot(&self) -> Result<Snapshot, FeedError> {
        let book = self.current_book().await?;
        let challenge = match self.current_challenge().await {
            Ok(challenge) => Some(challenge),
            Err(err) => {
                tracing::warn!(%err, "challenge unavailable; serving book only");
                None
            }
        };
        Ok(Snapshot { book, challenge })
    }

    pub async fn invalidate_all(&self) {
        self.book.invalidate().await;
        self.challenge.invalidate().await;
    }

    pub async fn invalidate_challenge(&self) {
        self.challenge.invalidate().await;
    }

    pub async fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            configured: self.config.is_configured(),
            book_cache: self.book.status().await,
            challenge_cache: self.challenge.status().await,
            extraction: self.notes.read().await.clone(),
        }
    }

    /// Fresh fetch and grouping, bypassing both cache slots.
    pub async fn analyze_entries(&self) -> anyhow::Result<EntryAnalysis> {
        let url = self.config.feed_url()?;
        let bytes = self.source.fetch_feed(url).await.context("fetch feed")?;
        let entries = rss::parse_feed(&bytes);
        let known_goal = self.notes.read().await.known_goal;
        Ok(inspect::analyze(entries, self.config.entry_window, known_goal))
    }

    async fn fetch_entries(&self) -> anyhow::Result<Vec<FeedEntry>> {
        let url = self.config.feed_url()?;
        let bytes = self.source.fetch_feed(url).await.context("fetch feed")?;
        let entries = rss::parse_feed(&bytes);
        self.notes.write().await.feed_entries = Some(entries.len());
        Ok(entries)
    }

    async fn compute_book(&self) -> anyhow::Result<Option<ReadingRecord>> {
        let entries = self.fetch_entries().await?;
        let window = fusion::recent_window(entries, self.config.entry_window);
        let record = fusion::fuse(&window);

        match &record {
            Some(record) => tracing::info!(
                title = %record.title,
                author = %record.author,
                progress = ?record.progress_percent,
                entries = record.entries_count,
                "fused current book"
            ),
            None => tracing::info!("no current book found"),
        }
        self.notes.write().await.progress_snippet =
            record.as_ref().and_then(|r| r.progress_snippet.clone());
        Ok(record)
    }

    /// Feed text newest first, then the profile page when a user id is
    /// configured. A failing profile fetch only narrows the input.
    async fn compute_challenge(&self) -> anyhow::Result<Option<ChallengeRecord>> {
        let mut entries = self.fetch_entries().await?;
        fusion::sort_newest_first(&mut entries);
        let mut text = entries
            .iter()
            .map(FeedEntry::plain_text)
            .collect::<Vec<_>>()
            .join("\n");

        if let Some(profile_url) = &self.config.profile_url {
            match self.source.fetch_page(profile_url).await {
                Ok(page) => {
                    text.push('\n');
                    text.push_str(&page);
                }
                Err(err) => tracing::warn!(%err, "profile page unavailable; using feed text only"),
            }
        }

        let known_goal = self.notes.read().await.known_goal;
        let counts = challenge::extract_challenge(&text, known_goal);
        let record = counts
            .as_ref()
            .and_then(|counts| ChallengeRecord::from_counts(counts, Utc::now()));

        let mut notes = self.notes.write().await;
        notes.challenge_snippet = counts.as_ref().map(|c| c.snippet.clone());
        if let Some(counts) = counts.as_ref().filter(|c| c.goal_from_text) {
            notes.known_goal = Some(counts.goal);
        }

        match &record {
            Some(record) => tracing::info!(challenge = %record.display(), "challenge extracted"),
            None => tracing::info!("no challenge data found"),
        }
        Ok(record)
    }
}
