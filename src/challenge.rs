//! Annual reading-challenge counts from feed text and the profile page.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::html;

/// Goals above this are treated as a mismatched number, not a challenge.
pub const MAX_PLAUSIBLE_GOAL: u32 = 500;

static PAIR_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(\d{1,4})\s+of\s+(\d{1,4})\s+books?\b",
        r"(?i)\b(\d{1,4})\s*/\s*(\d{1,4})\s+books?\b",
        r"(?i)\bread\s+(\d{1,4})\s+books?\s+toward.*?goal\s+of\s+(\d{1,4})\s+books?\b",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});
static COUNT_ONLY_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(\d{1,4})\s+books?\s+read\b",
        r"(?i)\bread\s+(\d{1,4})\s+books?\b",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeCounts {
    pub current: u32,
    pub goal: u32,
    /// True when the goal came from the text rather than from `known_goal`.
    pub goal_from_text: bool,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChallengeRecord {
    pub current_count: u32,
    pub goal_count: u32,
    pub progress_percent: u8,
    pub as_of: DateTime<Utc>,
    pub snippet: String,
}

impl ChallengeRecord {
    pub fn from_counts(counts: &ChallengeCounts, as_of: DateTime<Utc>) -> Option<Self> {
        if counts.goal == 0 {
            return None;
        }
        let current = u64::from(counts.current);
        let goal = u64::from(counts.goal);
        let percent = ((200 * current + goal) / (2 * goal)).min(100);
        Some(Self {
            current_count: counts.current,
            goal_count: counts.goal,
            progress_percent: u8::try_from(percent).unwrap_or(100),
            as_of,
            snippet: counts.snippet.clone(),
        })
    }

    /// Human-readable form, e.g. "26 of 30 books".
    pub fn display(&self) -> String {
        format!("{} of {} books", self.current_count, self.goal_count)
    }
}

/// Explicit "X of Y books" pairs first; otherwise a bare "X books read"
/// count paired with `known_goal`. The count itself is only ever taken from
/// `text`.
pub fn extract_challenge(text: &str, known_goal: Option<u32>) -> Option<ChallengeCounts> {
    let text = html::to_text(text);
    explicit_pair(&text).or_else(|| count_with_known_goal(&text, known_goal?))
}

fn explicit_pair(text: &str) -> Option<ChallengeCounts> {
    PAIR_RES.iter().find_map(|re| {
        re.captures_iter(text).find_map(|caps| {
            let current = caps[1].parse::<u32>().ok()?;
            let goal = plausible_goal(caps[2].parse::<u32>().ok()?)?;
            Some(ChallengeCounts {
                current,
                goal,
                goal_from_text: true,
                snippet: caps[0].to_owned(),
            })
        })
    })
}

fn count_with_known_goal(text: &str, goal: u32) -> Option<ChallengeCounts> {
    let goal = plausible_goal(goal)?;
    COUNT_ONLY_RES.iter().find_map(|re| {
        let caps = re.captures(text)?;
        Some(ChallengeCounts {
            current: caps[1].parse::<u32>().ok()?,
            goal,
            goal_from_text: false,
            snippet: caps[0].to_owned(),
        })
    })
}

fn plausible_goal(goal: u32) -> Option<u32> {
    (goal > 0 && goal <= MAX_PLAUSIBLE_GOAL).then_some(goal)
}
