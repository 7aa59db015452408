use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL, USER_AGENT};
use url::Url;

use crate::error::FetchError;

const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;
const USER_AGENT_VALUE: &str = "shelfpulse/0.1";

/// Upstream retrieval. Implementations own timeouts; callers do not retry.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_feed(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build feed http client")?;
        Ok(Self { client })
    }

    async fn get(&self, url: &Url, accept: &'static str) -> Result<Vec<u8>, FetchError> {
        let resp = self
            .client
            .get(url.clone())
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(ACCEPT, accept)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        let (body, truncated) = read_body_limited(resp, MAX_BODY_BYTES)
            .await
            .map_err(|source| FetchError::Body {
                url: url.to_string(),
                source,
            })?;
        if truncated {
            tracing::warn!(%url, limit = MAX_BODY_BYTES, "response body truncated");
        }
        tracing::debug!(%url, bytes = body.len(), "fetched");
        Ok(body)
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_feed(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        self.get(
            url,
            "application/rss+xml,application/xml,text/xml;q=0.9,*/*;q=0.8",
        )
        .await
    }

    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        let body = self
            .get(url, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

async fn read_body_limited(
    mut resp: reqwest::Response,
    limit: usize,
) -> Result<(Vec<u8>, bool), reqwest::Error> {
    let mut out: Vec<u8> = Vec::new();
    let mut truncated = false;

    while let Some(chunk) = resp.chunk().await? {
        if out.len() + chunk.len() > limit {
            let remaining = limit.saturating_sub(out.len());
            out.extend_from_slice(&chunk[..remaining]);
            truncated = true;
            break;
        }
        out.extend_from_slice(&chunk);
    }

    Ok((out, truncated))
}
