//! Small helpers for the HTML fragments Goodreads embeds in feed descriptions.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static AUTHOR_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*href\s*=\s*["'][^"']*/author/[^"']*["'][^>]*>(.*?)</a>"#).unwrap()
});
// The opening quote follows whitespace and the closing one precedes "by",
// "(" or the line end, so apostrophes inside names ("O'Neil", "Ender's")
// never delimit a title.
static QUOTED_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^|\s)'(.+?)'(?:\s+by\b|\s*\(|\s*$)").unwrap());
static COVER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"src\s*=\s*"(https://[^"]+\.jpg)""#).unwrap());

/// Flatten an HTML fragment to plain text: tags become spaces, entities are
/// decoded, whitespace collapses to single spaces.
pub fn to_text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    collapse_ws(&decoded)
}

pub fn collapse_ws(s: &str) -> String {
    WS_RE.replace_all(s, " ").trim().to_owned()
}

fn decode_entities(s: &str) -> String {
    // `&nbsp;` is HTML-only, the XML unescaper rejects it.
    let s = s.replace("&nbsp;", " ");
    match quick_xml::escape::unescape(&s) {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => {
            tracing::trace!(?err, "entity decoding failed; keeping raw text");
            s
        }
    }
}

/// Text of the first `<a href=".../author/...">` link, if any.
pub fn author_link_text(fragment: &str) -> Option<String> {
    let caps = AUTHOR_LINK_RE.captures(fragment)?;
    let text = to_text(caps.get(1)?.as_str());
    (!text.is_empty()).then_some(text)
}

/// Byte range of the first single-quoted book title, quotes excluded.
pub fn quoted_title(text: &str) -> Option<Range<usize>> {
    QUOTED_TITLE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.range())
}

/// `text` with every quoted book title replaced by a space.
pub fn mask_quoted_titles(text: &str) -> String {
    QUOTED_TITLE_RE.replace_all(text, " ").into_owned()
}

/// First `https://...jpg` image source in the fragment.
pub fn cover_url(fragment: &str) -> Option<String> {
    COVER_RE
        .captures(fragment)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}
