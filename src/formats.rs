use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::challenge::ChallengeRecord;
use crate::entry::Activity;
use crate::fusion::ReadingRecord;
use crate::progress::ProgressReading;

pub const UNKNOWN_DATE: &str = "Unknown";
const DATE_FORMAT: &str = "%b %d, %Y";
const CLOCK_FORMAT: &str = "%m/%d %H:%M";

/// JSON document served to the display client.
///
/// Absent optionals are omitted rather than written as `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrmnlPayload {
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    pub start_date: String,
    pub update_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_progress_percent: Option<u8>,
    pub entries_count: usize,
    pub current_time: String,
}

pub fn render_payload(
    book: Option<&ReadingRecord>,
    challenge: Option<&ChallengeRecord>,
    now: DateTime<FixedOffset>,
) -> TrmnlPayload {
    let (title, author) = match book {
        Some(book) => (book.title.clone(), display_author(&book.author)),
        None => (
            "No current book found".to_owned(),
            "Check Goodreads activity".to_owned(),
        ),
    };

    TrmnlPayload {
        title,
        author,
        progress: book.and_then(|b| b.progress_percent),
        cover_url: book.and_then(|b| b.cover_url.clone()),
        start_date: format_date(book.and_then(|b| b.start_date)),
        update_date: format_date(book.and_then(|b| b.update_date)),
        challenge: challenge.map(ChallengeRecord::display),
        challenge_progress_percent: challenge.map(|c| c.progress_percent),
        entries_count: book.map_or(0, |b| b.entries_count),
        current_time: now.format(CLOCK_FORMAT).to_string(),
    }
}

pub fn configuration_required_payload(reason: &str, now: DateTime<FixedOffset>) -> TrmnlPayload {
    status_payload("Configuration Required", reason, now)
}

pub fn unavailable_payload(now: DateTime<FixedOffset>) -> TrmnlPayload {
    status_payload(
        "Error Loading Data",
        "Please check configuration and connection",
        now,
    )
}

/// Fixed example document for wiring up a display template.
pub fn sample_payload(now: DateTime<FixedOffset>) -> TrmnlPayload {
    TrmnlPayload {
        title: "The Seven Husbands of Evelyn Hugo".to_owned(),
        author: "Taylor Jenkins Reid".to_owned(),
        progress: Some(68),
        cover_url: None,
        start_date: "Jun 15, 2025".to_owned(),
        update_date: "Jun 26, 2025".to_owned(),
        challenge: Some("15 of 25 books".to_owned()),
        challenge_progress_percent: Some(60),
        entries_count: 3,
        current_time: now.format(CLOCK_FORMAT).to_string(),
    }
}

fn status_payload(title: &str, author: &str, now: DateTime<FixedOffset>) -> TrmnlPayload {
    TrmnlPayload {
        title: title.to_owned(),
        author: author.to_owned(),
        progress: None,
        cover_url: None,
        start_date: UNKNOWN_DATE.to_owned(),
        update_date: UNKNOWN_DATE.to_owned(),
        challenge: None,
        challenge_progress_percent: None,
        entries_count: 0,
        current_time: now.format(CLOCK_FORMAT).to_string(),
    }
}

fn display_author(author: &str) -> String {
    if author.trim().is_empty() {
        "Unknown Author".to_owned()
    } else {
        author.to_owned()
    }
}

pub fn format_date(date: Option<DateTime<FixedOffset>>) -> String {
    date.map_or_else(
        || UNKNOWN_DATE.to_owned(),
        |date| date.format(DATE_FORMAT).to_string(),
    )
}

/// Per-entry view used by `/debug-entries` and `inspect`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryReport {
    pub guid: String,
    pub title: String,
    pub author: String,
    pub activity: Activity,
    pub headline: String,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub progress: Option<ProgressReading>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupReport {
    pub identity: String,
    pub entries: Vec<EntryReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeReport {
    pub current_count: u32,
    pub goal_count: u32,
    pub progress_percent: u8,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryAnalysis {
    pub entries_total: usize,
    pub entries_in_window: usize,
    pub groups: Vec<GroupReport>,
    pub current: Option<ReadingRecord>,
    pub challenge: Option<ChallengeReport>,
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{TimeZone as _, Utc};
    use serde_json::Value;

    use super::*;

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 6, 26, 14, 5, 0)
            .unwrap()
    }

    fn record() -> ReadingRecord {
        let tz = FixedOffset::west_opt(7 * 3600).unwrap();
        ReadingRecord {
            title: "Dune".to_owned(),
            author: "Frank Herbert".to_owned(),
            progress_percent: Some(41),
            progress_snippet: Some("page 41 of 100".to_owned()),
            start_date: Some(tz.with_ymd_and_hms(2025, 6, 16, 8, 0, 0).unwrap()),
            update_date: Some(tz.with_ymd_and_hms(2025, 6, 25, 8, 0, 0).unwrap()),
            entries_count: 3,
            source_entry_ids: BTreeSet::from(["a".to_owned(), "b".to_owned(), "c".to_owned()]),
            cover_url: None,
            activities: vec![Activity::Progress],
        }
    }

    fn challenge() -> ChallengeRecord {
        ChallengeRecord {
            current_count: 26,
            goal_count: 30,
            progress_percent: 87,
            as_of: Utc.with_ymd_and_hms(2025, 6, 26, 12, 0, 0).unwrap(),
            snippet: "26 of 30 books".to_owned(),
        }
    }

    #[test]
    fn payload_without_challenge_omits_challenge_keys() {
        let payload = render_payload(Some(&record()), None, now());
        let json = serde_json::to_value(&payload).unwrap();
        let object = json.as_object().unwrap();

        assert!(!object.contains_key("challenge"));
        assert!(!object.contains_key("challenge_progress_percent"));
        assert!(!object.contains_key("cover_url"));
        assert_eq!(json["title"], "Dune");
        assert_eq!(json["progress"], 41);
        assert_eq!(json["start_date"], "Jun 16, 2025");
        assert_eq!(json["update_date"], "Jun 25, 2025");
        assert_eq!(json["entries_count"], 3);
        assert_eq!(json["current_time"], "06/26 14:05");

        let back: TrmnlPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn payload_with_challenge_includes_both_keys() {
        let payload = render_payload(Some(&record()), Some(&challenge()), now());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["challenge"], "26 of 30 books");
        assert_eq!(json["challenge_progress_percent"], 87);

        let back: TrmnlPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn missing_book_and_progress_render_distinctly() {
        let payload = render_payload(None, Some(&challenge()), now());
        assert_eq!(payload.title, "No current book found");
        assert_eq!(payload.start_date, UNKNOWN_DATE);
        assert_eq!(payload.entries_count, 0);
        assert_eq!(payload.challenge.as_deref(), Some("26 of 30 books"));

        let mut no_progress = record();
        no_progress.progress_percent = None;
        no_progress.author = String::new();
        let json = serde_json::to_value(render_payload(Some(&no_progress), None, now())).unwrap();
        assert_eq!(json.get("progress"), None::<&Value>);
        assert_eq!(json["author"], "Unknown Author");
    }

    #[test]
    fn status_payloads_are_distinct() {
        let config = configuration_required_payload("set GOODREADS_RSS_URL", now());
        let unavailable = unavailable_payload(now());
        assert_eq!(config.title, "Configuration Required");
        assert_eq!(unavailable.title, "Error Loading Data");
        assert_ne!(config, unavailable);
    }
}
