use std::time::Duration;

use url::Url;

use crate::cli::FeedArgs;
use crate::error::FeedError;

const PLACEHOLDER_MARKERS: &[&str] = &["YOUR_USER_ID", "YOUR_RSS_KEY"];

/// Validated process configuration. A missing feed URL is not rejected here:
/// it surfaces as [`FeedError::ConfigurationMissing`] on every request so the
/// server can still start and explain itself.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    feed_url: Result<Url, String>,
    pub profile_url: Option<Url>,
    pub challenge_goal: Option<u32>,
    pub book_ttl: Duration,
    pub challenge_ttl: Duration,
    pub entry_window: usize,
    pub timeout: Duration,
}

impl FeedConfig {
    pub fn from_args(args: &FeedArgs) -> Self {
        let feed_url = parse_feed_url(args.feed_url.as_deref());
        if let Err(reason) = &feed_url {
            tracing::warn!(%reason, "feed url not configured");
        }

        let profile_url = args
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && !is_placeholder(id))
            .and_then(|id| profile_url(&args.profile_base_url, id));

        Self {
            feed_url,
            profile_url,
            challenge_goal: args.challenge_goal.filter(|goal| *goal > 0),
            book_ttl: Duration::from_secs(args.book_ttl_secs),
            challenge_ttl: Duration::from_secs(args.challenge_ttl_secs),
            entry_window: args.entry_window.max(1),
            timeout: Duration::from_secs(args.timeout_secs.max(1)),
        }
    }

    pub fn feed_url(&self) -> Result<&Url, FeedError> {
        self.feed_url
            .as_ref()
            .map_err(|reason| FeedError::ConfigurationMissing(reason.clone()))
    }

    pub fn is_configured(&self) -> bool {
        self.feed_url.is_ok()
    }
}

fn parse_feed_url(raw: Option<&str>) -> Result<Url, String> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err("set GOODREADS_RSS_URL (or --feed-url) to your updates feed".to_owned());
    }
    if is_placeholder(raw) {
        return Err("GOODREADS_RSS_URL still holds the placeholder user id/key".to_owned());
    }
    let url = Url::parse(raw).map_err(|err| format!("invalid feed url {raw:?}: {err}"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(format!("feed url must be http/https: {url}"));
    }
    Ok(url)
}

fn is_placeholder(raw: &str) -> bool {
    PLACEHOLDER_MARKERS.iter().any(|marker| raw.contains(marker))
}

fn profile_url(base: &str, user_id: &str) -> Option<Url> {
    let base = Url::parse(base.trim_end_matches('/'))
        .inspect_err(|err| tracing::warn!(base, ?err, "invalid profile base url"))
        .ok()?;
    base.join(&format!("/user/show/{user_id}")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(feed_url: Option<&str>) -> FeedArgs {
        FeedArgs {
            feed_url: feed_url.map(str::to_owned),
            user_id: Some("12345".to_owned()),
            profile_base_url: "https://www.goodreads.com".to_owned(),
            challenge_goal: Some(0),
            book_ttl_secs: 300,
            challenge_ttl_secs: 1800,
            entry_window: 20,
            timeout_secs: 15,
        }
    }

    #[test]
    fn missing_or_placeholder_feed_url_is_configuration_missing() {
        for raw in [
            None,
            Some("  "),
            Some("https://www.goodreads.com/user/updates_rss/YOUR_USER_ID?key=YOUR_RSS_KEY"),
            Some("ftp://example.com/feed"),
            Some("not a url"),
        ] {
            let config = FeedConfig::from_args(&args(raw));
            assert!(!config.is_configured(), "{raw:?}");
            assert!(matches!(
                config.feed_url(),
                Err(FeedError::ConfigurationMissing(_))
            ));
        }
    }

    #[test]
    fn valid_config_builds_profile_url() {
        let config =
            FeedConfig::from_args(&args(Some("https://www.goodreads.com/user/updates_rss/1?key=k")));
        assert!(config.is_configured());
        assert_eq!(
            config.profile_url.as_ref().map(Url::as_str),
            Some("https://www.goodreads.com/user/show/12345")
        );
        assert_eq!(config.challenge_goal, None);
        assert_eq!(config.book_ttl, Duration::from_secs(300));
    }
}
