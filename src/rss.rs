//! RSS 2.0 activity feed -> [`FeedEntry`] list.
//!
//! Malformed XML yields an empty list so that fusion can still answer
//! "no current book".

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;

use crate::entry::{Activity, FeedEntry};
use crate::html;

const MAX_NAME_LEN: usize = 100;

static VERB_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:is on page \d+ of \d+ of|is currently reading|started reading|finished reading|updated (?:her|his|their) progress on|% done with)\s*(.+?)(?:\s+by\s|\s*$)",
    )
    .unwrap()
});
static BY_AUTHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*by\s+([^(]+?)\s*(?:\(|$)").unwrap());

#[derive(Debug, Default)]
struct RawItem {
    title: String,
    description: String,
    guid: String,
    link: String,
    pub_date: String,
    author: String,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Title,
    Description,
    Guid,
    Link,
    PubDate,
    Author,
}

impl Field {
    fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"description" => Some(Self::Description),
            b"guid" => Some(Self::Guid),
            b"link" => Some(Self::Link),
            b"pubDate" => Some(Self::PubDate),
            b"author" | b"dc:creator" | b"author_name" => Some(Self::Author),
            _ => None,
        }
    }
}

impl RawItem {
    fn push(&mut self, field: Field, text: &str) {
        let target = match field {
            Field::Title => &mut self.title,
            Field::Description => &mut self.description,
            Field::Guid => &mut self.guid,
            Field::Link => &mut self.link,
            Field::PubDate => &mut self.pub_date,
            Field::Author => &mut self.author,
        };
        target.push_str(text);
    }
}

pub fn parse_feed(bytes: &[u8]) -> Vec<FeedEntry> {
    let xml = String::from_utf8_lossy(bytes);
    match read_items(&xml) {
        Ok(items) => {
            let entries = items.into_iter().map(entry_from_item).collect::<Vec<_>>();
            tracing::debug!(entries = entries.len(), "parsed feed");
            entries
        }
        Err(err) => {
            tracing::warn!(err = %format!("{err:#}"), "malformed feed; treating as empty");
            Vec::new()
        }
    }
}

fn read_items(xml: &str) -> anyhow::Result<Vec<RawItem>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current: Option<RawItem> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                if name.as_ref() == b"item" {
                    current = Some(RawItem::default());
                } else if current.is_some() {
                    field = Field::from_tag(name.as_ref());
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"item" {
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                }
                field = None;
            }
            Event::Text(e) => {
                if let (Some(item), Some(field)) = (current.as_mut(), field) {
                    item.push(field, &e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let (Some(item), Some(field)) = (current.as_mut(), field) {
                    item.push(field, &String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if current.is_some() {
        anyhow::bail!("feed ended inside an <item>");
    }

    Ok(items)
}

fn entry_from_item(item: RawItem) -> FeedEntry {
    let headline = html::collapse_ws(&item.title);
    let title = book_title(&headline).unwrap_or_default();
    let author = book_author(&headline, &item.description, &item.author).unwrap_or_default();
    let guid = if item.guid.trim().is_empty() {
        item.link.trim().to_owned()
    } else {
        item.guid.trim().to_owned()
    };

    FeedEntry {
        guid,
        title,
        author,
        activity: Activity::classify(&headline),
        cover_url: html::cover_url(&item.description),
        published_at: parse_timestamp(&item.pub_date),
        headline,
        description: item.description,
    }
}

fn book_title(headline: &str) -> Option<String> {
    let raw = match html::quoted_title(headline) {
        Some(range) => &headline[range],
        None => VERB_TITLE_RE.captures(headline)?.get(1)?.as_str(),
    };
    let title = html::collapse_ws(raw);
    (!title.is_empty()).then_some(title)
}

/// Author separation, in order: author link in the description, "'Title' by
/// Author" in the headline, an explicit author element.
fn book_author(headline: &str, description: &str, author_field: &str) -> Option<String> {
    if let Some(name) = html::author_link_text(description).and_then(plausible_name) {
        return Some(name);
    }

    if let Some(title) = html::quoted_title(headline) {
        // Skip the closing quote.
        if let Some(caps) = BY_AUTHOR_RE.captures(&headline[title.end + 1..]) {
            if let Some(name) = caps.get(1).and_then(|m| plausible_name(m.as_str().to_owned())) {
                return Some(name);
            }
        }
    }

    let field = html::to_text(author_field);
    let (_, name) = field.rsplit_once(" by ")?;
    plausible_name(name.to_owned())
}

fn plausible_name(name: String) -> Option<String> {
    let name = html::collapse_ws(&name);
    let len = name.chars().count();
    (len > 1 && len < MAX_NAME_LEN && name != "Unknown Author").then_some(name)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .inspect_err(|err| tracing::debug!(raw, ?err, "unparseable pubDate"))
        .ok()
}
