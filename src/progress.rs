//! Reading-progress extraction from one block of feed text or markup.
//!
//! Strategies run in order and the first hit wins; results are never blended.
//! `None` means "no progress found" and is distinct from 0%.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::html;

const KEYWORD_RADIUS: usize = 40;

static PAGE_OF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bpage\s+(\d{1,6})\s+of\s+(\d{1,6})\b").unwrap());
static SLASH_PAGES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,6})\s*/\s*(\d{1,6})\s*pages\b").unwrap());
static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,3})\s*(?:%|percent\b)").unwrap());
static PROGRESS_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:done|complete|read|progress|through|finished)\b").unwrap()
});
static FINISHED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:finished reading|has finished|completed|marked as read)\b").unwrap()
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStrategy {
    PageCount,
    Percent,
    Status,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressReading {
    pub percent: u8,
    pub strategy: ProgressStrategy,
    /// Literal text the value was derived from.
    pub snippet: String,
}

type Strategy = fn(&str) -> Option<ProgressReading>;

const STRATEGIES: &[Strategy] = &[page_count, percent_near_keyword, finished_status];

/// Quoted book titles are masked first so a number in a title ("'100% Wolf'")
/// is never read as progress.
pub fn extract_progress(raw: &str) -> Option<ProgressReading> {
    let text = html::to_text(&html::mask_quoted_titles(raw));
    STRATEGIES.iter().find_map(|strategy| strategy(&text))
}

fn page_count(text: &str) -> Option<ProgressReading> {
    PAGE_OF_RE
        .captures_iter(text)
        .chain(SLASH_PAGES_RE.captures_iter(text))
        .find_map(|caps| {
            let page = caps[1].parse::<u64>().ok()?;
            let total = caps[2].parse::<u64>().ok()?;
            Some(ProgressReading {
                percent: page_ratio(page, total)?,
                strategy: ProgressStrategy::PageCount,
                snippet: caps[0].to_owned(),
            })
        })
}

/// `round(100 * page / total)`, half away from zero. A zero total or a page
/// past the end is a miss.
pub fn page_ratio(page: u64, total: u64) -> Option<u8> {
    if total == 0 || page > total {
        return None;
    }
    let percent = (200 * page + total) / (2 * total);
    u8::try_from(percent.min(100)).ok()
}

fn percent_near_keyword(text: &str) -> Option<ProgressReading> {
    PERCENT_RE.captures_iter(text).find_map(|caps| {
        let value = caps[1].parse::<u8>().ok().filter(|v| *v <= 100)?;
        let whole = caps.get(0)?;
        let context = surrounding(text, whole.start(), whole.end(), KEYWORD_RADIUS);
        PROGRESS_KEYWORD_RE
            .is_match(context)
            .then(|| ProgressReading {
                percent: value,
                strategy: ProgressStrategy::Percent,
                snippet: context.trim().to_owned(),
            })
    })
}

/// "Finished" implies 100. "Started" or "currently reading" carry no number
/// and stay unknown.
fn finished_status(text: &str) -> Option<ProgressReading> {
    let found = FINISHED_RE.find(text)?;
    Some(ProgressReading {
        percent: 100,
        strategy: ProgressStrategy::Status,
        snippet: found.as_str().to_owned(),
    })
}

fn surrounding(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let mut from = start.saturating_sub(radius);
    while !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = end.saturating_add(radius).min(text.len());
    while !text.is_char_boundary(to) {
        to += 1;
    }
    &text[from..to]
}
