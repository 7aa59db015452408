//! Typed failures that reach the HTTP and CLI surfaces.
//!
//! Extraction misses are not errors: they are `None` values carried through the
//! records. "No current book" is `Option::None` out of fusion. Only the variants
//! below ever change what a caller sees.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    /// Required identifiers are missing or still hold placeholder values.
    #[error("configuration required: {0}")]
    ConfigurationMissing(String),

    /// Upstream fetch failed and the slot has never held a value.
    #[error("{slot} unavailable: {message}")]
    UpstreamUnavailable { slot: &'static str, message: String },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GET {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GET {url}: unexpected status {status}")]
    Status { url: String, status: u16 },

    #[error("GET {url}: read body: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}
