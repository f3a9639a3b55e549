//! Incremental trade-history sync
//!
//! First sync for a user pulls the full retention window; later syncs only
//! pull the gap since the stored watermark and append it to the cache.
//! Refresh failures degrade to the cached list instead of failing the caller.
//! Cache reads and writes run on tokio's blocking pool.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{info, warn};

use super::store::{CacheEntry, TradeCache};
use crate::error::{ApiError, CacheError};
use crate::history::{ExecutionSource, HistoryFetcher};
use crate::types::Execution;

/// One async lock per user id, created on first use.
///
/// Entries nobody holds or waits on are dropped on the next `acquire`, so the
/// map only tracks users with a sync in flight.
#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user_id`
    pub async fn acquire(&self, user_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // the map holds the only reference to an idle lock
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(user_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of users currently tracked
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Orchestrates cache reads, remote fetches and cache writes per user
pub struct TradeSync<C> {
    cache: Arc<C>,
    fetcher: HistoryFetcher,
    locks: UserLocks,
}

impl<C: TradeCache + 'static> TradeSync<C> {
    pub fn new(cache: C, fetcher: HistoryFetcher) -> Self {
        Self {
            cache: Arc::new(cache),
            fetcher,
            locks: UserLocks::new(),
        }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    async fn read_cache(&self, user_id: i64) -> Result<CacheEntry, CacheError> {
        let cache = Arc::clone(&self.cache);
        tokio::task::spawn_blocking(move || cache.read(user_id)).await?
    }

    async fn write_cache(
        &self,
        user_id: i64,
        executions: Vec<Execution>,
        last_update_ms: i64,
    ) -> Result<(), CacheError> {
        let cache = Arc::clone(&self.cache);
        tokio::task::spawn_blocking(move || cache.write(user_id, &executions, last_update_ms)).await?
    }

    /// Full execution history of `user_id`, refreshed up to the current time
    pub async fn get_trades_with_cache<S>(&self, source: &S, user_id: i64) -> Result<Vec<Execution>, ApiError>
    where
        S: ExecutionSource + ?Sized,
    {
        self.get_trades_with_cache_at(source, user_id, Utc::now().timestamp_millis())
            .await
    }

    /// Same as [`get_trades_with_cache`](Self::get_trades_with_cache) with an explicit "now".
    ///
    /// `now_ms` is both the upper bound of the fetch and the persisted watermark.
    /// Only the first-ever sync can fail; an incremental refresh failure returns
    /// the cached list and leaves the stored watermark untouched.
    pub async fn get_trades_with_cache_at<S>(
        &self,
        source: &S,
        user_id: i64,
        now_ms: i64,
    ) -> Result<Vec<Execution>, ApiError>
    where
        S: ExecutionSource + ?Sized,
    {
        let _guard = self.locks.acquire(user_id).await;

        let cached = self.read_cache(user_id).await.unwrap_or_else(|err| {
            warn!("[Cache] Read failed for user {}: {}", user_id, err);
            CacheEntry::default()
        });

        let (executions, watermark) = if cached.never_synced() {
            info!("[Cache] First sync for user {}", user_id);
            let executions = self.fetcher.fetch_full_history(source, now_ms).await?;
            (executions, now_ms)
        } else {
            let since = cached.last_update_ms;
            match self.fetcher.fetch_since(source, since, now_ms).await {
                Ok(fresh) => {
                    if !fresh.is_empty() {
                        info!("[Cache] User {}: {} new executions", user_id, fresh.len());
                    }
                    let mut executions = cached.executions;
                    executions.extend(fresh);
                    (executions, now_ms.max(since))
                }
                Err(err) => {
                    warn!(
                        "[Cache] Refresh failed for user {}: {}. Serving {} cached executions",
                        user_id,
                        err,
                        cached.executions.len()
                    );
                    return Ok(cached.executions);
                }
            }
        };

        if let Err(err) = self.write_cache(user_id, executions.clone(), watermark).await {
            warn!("[Cache] Write failed for user {}: {}", user_id, err);
        }

        Ok(executions)
    }
}
