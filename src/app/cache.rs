//! Time-bucketed cache slot with single-flight recomputation and
//! stale-if-error serving.
//!
//! A slot holds one `(value, computed_at)` pair that is only ever replaced as
//! a whole. Values are shared as `Arc<T>` so a fresh hit hands back the very
//! same object that was stored.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::error::FeedError;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Served from the slot, younger than the TTL.
    Fresh,
    /// Recomputed by this call.
    Computed,
    /// Recomputation failed; the previous value is served.
    Stale,
}

#[derive(Debug)]
pub struct Cached<T> {
    pub value: Arc<T>,
    pub freshness: Freshness,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotStatus {
    pub slot: &'static str,
    pub ttl_secs: u64,
    pub has_value: bool,
    pub fresh: bool,
    pub computed_at: Option<DateTime<Utc>>,
    pub age_secs: Option<u64>,
    pub last_error: Option<String>,
}

struct Stored<T> {
    value: Arc<T>,
    stored_at: Instant,
    computed_at: DateTime<Utc>,
}

struct SlotState<T> {
    stored: Option<Stored<T>>,
    last_error: Option<String>,
}

pub struct CacheSlot<T> {
    name: &'static str,
    ttl: Duration,
    state: RwLock<SlotState<T>>,
    flight: Mutex<()>,
}

impl<T> CacheSlot<T> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            state: RwLock::new(SlotState {
                stored: None,
                last_error: None,
            }),
            flight: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the stored value while it is younger than the TTL. Otherwise
    /// runs `compute` (at most one caller at a time; the others wait and
    /// then see its result) and stores whatever it yields, empty results
    /// included.
    ///
    /// A failing `compute` leaves the stored value untouched and serves it as
    /// [`Freshness::Stale`]. With nothing stored yet the failure becomes
    /// [`FeedError::UpstreamUnavailable`].
    pub async fn get_or_compute<F, Fut>(&self, compute: F) -> Result<Cached<T>, FeedError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if let Some(hit) = self.fresh().await {
            return Ok(hit);
        }

        let _flight = self.flight.lock().await;
        if let Some(hit) = self.fresh().await {
            tracing::debug!(slot = self.name, "served value computed by concurrent caller");
            return Ok(hit);
        }

        tracing::debug!(slot = self.name, "recomputing");
        match compute().await {
            Ok(value) => {
                let value = Arc::new(value);
                let computed_at = Utc::now();
                let mut state = self.state.write().await;
                state.stored = Some(Stored {
                    value: Arc::clone(&value),
                    stored_at: Instant::now(),
                    computed_at,
                });
                state.last_error = None;
                tracing::info!(slot = self.name, "cache updated");
                Ok(Cached {
                    value,
                    freshness: Freshness::Computed,
                    computed_at,
                })
            }
            Err(err) => {
                let message = format!("{err:#}");
                let mut state = self.state.write().await;
                state.last_error = Some(message.clone());
                match &state.stored {
                    Some(stored) => {
                        tracing::warn!(slot = self.name, err = %message, "recompute failed; serving stale value");
                        Ok(Cached {
                            value: Arc::clone(&stored.value),
                            freshness: Freshness::Stale,
                            computed_at: stored.computed_at,
                        })
                    }
                    None => {
                        tracing::error!(slot = self.name, err = %message, "recompute failed with empty cache");
                        Err(FeedError::UpstreamUnavailable {
                            slot: self.name,
                            message,
                        })
                    }
                }
            }
        }
    }

    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        state.stored = None;
        state.last_error = None;
        tracing::info!(slot = self.name, "cache invalidated");
    }

    pub async fn status(&self) -> SlotStatus {
        let state = self.state.read().await;
        let age = state.stored.as_ref().map(|s| s.stored_at.elapsed());
        SlotStatus {
            slot: self.name,
            ttl_secs: self.ttl.as_secs(),
            has_value: state.stored.is_some(),
            fresh: age.is_some_and(|age| age < self.ttl),
            computed_at: state.stored.as_ref().map(|s| s.computed_at),
            age_secs: age.map(|age| age.as_secs()),
            last_error: state.last_error.clone(),
        }
    }

    async fn fresh(&self) -> Option<Cached<T>> {
        let state = self.state.read().await;
        let stored = state.stored.as_ref()?;
        (stored.stored_at.elapsed() < self.ttl).then(|| Cached {
            value: Arc::clone(&stored.value),
            freshness: Freshness::Fresh,
            computed_at: stored.computed_at,
        })
    }
}
