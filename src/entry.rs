use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::html;

static SERIES_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^()]*\)\s*$").unwrap());
static SUBTITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s*:|\s+[-–—]\s+|[–—]).*$").unwrap());
static PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Started,
    Progress,
    CurrentlyReading,
    Finished,
    Other,
}

impl Activity {
    pub fn classify(headline: &str) -> Self {
        let lower = headline.to_lowercase();
        if lower.contains("finished reading") || lower.contains("has finished") {
            Self::Finished
        } else if lower.contains("started reading") {
            Self::Started
        } else if lower.contains("is on page")
            || lower.contains("% done")
            || lower.contains("percent done")
            || (lower.contains("updated") && lower.contains("progress"))
        {
            Self::Progress
        } else if lower.contains("currently reading") {
            Self::CurrentlyReading
        } else {
            Self::Other
        }
    }

    pub fn is_reading(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// One item of the activity feed after parsing. `title` and `author` are the
/// separated book fields and are empty when they could not be found.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedEntry {
    pub guid: String,
    pub title: String,
    pub author: String,
    pub activity: Activity,
    pub headline: String,
    pub description: String,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub cover_url: Option<String>,
}

impl FeedEntry {
    pub fn identity(&self) -> Option<BookIdentity> {
        BookIdentity::new(&self.title, &self.author)
    }

    /// Headline and description joined, as handed to the progress extractor.
    pub fn progress_text(&self) -> String {
        format!("{}\n{}", self.headline, self.description)
    }

    /// Headline and flattened description, as scanned for challenge counts.
    pub fn plain_text(&self) -> String {
        format!("{} {}", self.headline, html::to_text(&self.description))
    }
}

/// Grouping key. Two entries describe the same book only when both
/// normalized parts are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookIdentity {
    pub title: String,
    pub author: String,
}

impl BookIdentity {
    pub fn new(title: &str, author: &str) -> Option<Self> {
        let title = normalize_title(title);
        if title.is_empty() {
            return None;
        }
        Some(Self {
            title,
            author: normalize_author(author),
        })
    }
}

impl std::fmt::Display for BookIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.author.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{} / {}", self.title, self.author)
        }
    }
}

pub fn normalize_title(title: &str) -> String {
    let lower = title.to_lowercase();
    let without_series = SERIES_SUFFIX_RE.replace(&lower, "");
    let without_subtitle = SUBTITLE_RE.replace(&without_series, "");
    let without_punct = PUNCT_RE.replace_all(&without_subtitle, "");
    html::collapse_ws(&without_punct)
}

pub fn normalize_author(author: &str) -> String {
    let lower = author.to_lowercase();
    let without_punct = PUNCT_RE.replace_all(&lower, " ");
    html::collapse_ws(&without_punct)
}
