//! Read-mostly cache in front of a [`KeySetSource`].
//!
//! Readers share an `RwLock`; a refresh swaps a whole new `Arc<JsonWebKeySet>`
//! in under the write lock, so a reader never observes a half-updated set.
//! Refreshes are serialised by `refresh_lock` (single writer) and re-check the
//! cache after acquiring it, so a burst of requests on a cold or expired cache
//! results in one fetch.
//!
//! Failures are shared the same way: requests that queued behind a failed
//! fetch, or that arrive within `min_refresh_interval` of it, get that error
//! back instead of fetching again.
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

use super::jwks::{JsonWebKeySet, KeySetError, KeySetSource};

struct CachedKeySet {
    keys: Arc<JsonWebKeySet>,
    fetched_at: Instant,
}

struct FailedRefresh {
    error: KeySetError,
    at: Instant,
}

// Only touched while `refresh_lock` is held.
#[derive(Default)]
struct RefreshState {
    last_failure: Option<FailedRefresh>,
}

pub struct KeySetCache {
    source: Arc<dyn KeySetSource>,
    ttl: Duration,
    min_refresh_interval: Duration,
    current: RwLock<Option<CachedKeySet>>,
    refresh_lock: Mutex<RefreshState>,
    // Completed fetches, successful or not.
    attempts: AtomicU64,
}

impl std::fmt::Debug for KeySetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySetCache")
            .field("source", &self.source.describe())
            .field("ttl", &self.ttl)
            .field("min_refresh_interval", &self.min_refresh_interval)
            .field("attempts", &self.attempts.load(Ordering::Relaxed))
            .finish()
    }
}

impl KeySetCache {
    pub fn new(source: Arc<dyn KeySetSource>, ttl: Duration, min_refresh_interval: Duration) -> Self {
        Self {
            source,
            ttl,
            min_refresh_interval,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(RefreshState::default()),
            attempts: AtomicU64::new(0),
        }
    }

    /// Current key set, fetching it when the cache is empty or older than the TTL.
    pub async fn keys(&self) -> Result<Arc<JsonWebKeySet>, KeySetError> {
        if let Some(keys) = self.fresh().await {
            return Ok(keys);
        }

        let attempts_seen = self.attempts.load(Ordering::Acquire);
        let mut state = self.refresh_lock.lock().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(keys) = self.fresh().await {
            return Ok(keys);
        }
        if let Some(err) = self.shared_failure(&state, attempts_seen) {
            return Err(err);
        }
        self.refresh_locked(&mut state).await
    }

    /// Called when `seen` had no key for a token's `kid`: the provider may have rotated keys.
    ///
    /// Returns a newer set without fetching if one was swapped in meanwhile, and
    /// returns the cached set unchanged while inside `min_refresh_interval`.
    pub async fn refresh_for_unknown_kid(
        &self,
        seen: &Arc<JsonWebKeySet>,
    ) -> Result<Arc<JsonWebKeySet>, KeySetError> {
        let attempts_seen = self.attempts.load(Ordering::Acquire);
        let mut state = self.refresh_lock.lock().await;

        {
            let current = self.current.read().await;
            if let Some(cached) = current.as_ref() {
                if !Arc::ptr_eq(&cached.keys, seen) {
                    return Ok(cached.keys.clone());
                }
                if cached.fetched_at.elapsed() < self.min_refresh_interval {
                    tracing::debug!("unknown kid inside minimum refresh interval; not refetching");
                    return Ok(cached.keys.clone());
                }
            }
        }

        if let Some(err) = self.shared_failure(&state, attempts_seen) {
            return Err(err);
        }
        self.refresh_locked(&mut state).await
    }

    async fn fresh(&self) -> Option<Arc<JsonWebKeySet>> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| cached.keys.clone())
    }

    // The latest fetch failed, and either finished while the caller was queued
    // or is still inside `min_refresh_interval`.
    fn shared_failure(&self, state: &RefreshState, attempts_seen: u64) -> Option<KeySetError> {
        let failure = state.last_failure.as_ref()?;
        let finished_while_queued = self.attempts.load(Ordering::Acquire) != attempts_seen;

        if finished_while_queued || failure.at.elapsed() < self.min_refresh_interval {
            tracing::debug!(error = %failure.error, "reusing recent key set failure");
            Some(failure.error.clone())
        } else {
            None
        }
    }

    async fn refresh_locked(
        &self,
        state: &mut RefreshState,
    ) -> Result<Arc<JsonWebKeySet>, KeySetError> {
        let result = self.source.fetch().await;

        let fetched = match result {
            Ok(set) => {
                state.last_failure = None;
                Arc::new(set)
            }
            Err(err) => {
                tracing::error!(source = %self.source.describe(), error = %err, "key set refresh failed");
                state.last_failure = Some(FailedRefresh {
                    error: err.clone(),
                    at: Instant::now(),
                });
                self.attempts.fetch_add(1, Ordering::AcqRel);
                return Err(err);
            }
        };

        tracing::info!(
            source = %self.source.describe(),
            keys = fetched.keys.len(),
            "key set refreshed"
        );

        *self.current.write().await = Some(CachedKeySet {
            keys: fetched.clone(),
            fetched_at: Instant::now(),
        });
        self.attempts.fetch_add(1, Ordering::AcqRel);

        Ok(fetched)
    }
}
