//! Paginated execution history fetcher
//!
//! Walks a time range in fixed windows and, inside each window, follows the
//! exchange's pagination cursor until it comes back empty.

use futures::{pin_mut, stream, Stream, TryStreamExt};
use std::collections::HashSet;
use tracing::{debug, info};

use super::source::{ExecutionPage, ExecutionQuery, ExecutionSource};
use super::windows::{Direction, TimeWindow, TimeWindows};
use crate::config::FetchConfig;
use crate::error::ApiError;
use crate::types::Execution;

enum PageState {
    First,
    /// Cursor to send next, plus every cursor already followed in this window
    Next(String, HashSet<String>),
    Done,
}

/// Fetches execution history through any [`ExecutionSource`]
#[derive(Debug, Clone, Default)]
pub struct HistoryFetcher {
    config: FetchConfig,
}

impl HistoryFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn query(&self, window: TimeWindow, cursor: Option<String>) -> ExecutionQuery {
        ExecutionQuery {
            category: self.config.category.clone(),
            symbol: None,
            start_ms: window.start_ms,
            // the endpoint bound is inclusive, windows are half-open
            end_ms: window.end_ms - 1,
            limit: self.config.page_limit,
            cursor,
        }
    }

    /// Lazy stream of pages for a single window.
    ///
    /// Ends after the first page without a next cursor. A cursor that was already
    /// followed in this window is reported as a malformed response instead of
    /// looping forever.
    pub fn pages<'a, S>(
        &'a self,
        source: &'a S,
        window: TimeWindow,
    ) -> impl Stream<Item = Result<ExecutionPage, ApiError>> + 'a
    where
        S: ExecutionSource + ?Sized,
    {
        stream::try_unfold(PageState::First, move |state| async move {
            let (cursor, mut seen) = match state {
                PageState::First => (None, HashSet::new()),
                PageState::Next(cursor, seen) => {
                    tokio::time::sleep(self.config.page_delay).await;
                    (Some(cursor), seen)
                }
                PageState::Done => return Ok(None),
            };

            let query = self.query(window, cursor.clone());
            let page = source.execution_page(&query).await?;
            if let Some(cursor) = cursor {
                seen.insert(cursor);
            }

            let next = match &page.next_cursor {
                Some(next) if seen.contains(next) => {
                    return Err(ApiError::Malformed(format!(
                        "pagination cursor repeated: {}",
                        next
                    )));
                }
                Some(next) => PageState::Next(next.clone(), seen),
                None => PageState::Done,
            };

            Ok(Some((page, next)))
        })
    }

    /// Fetch every execution in `[start_ms, end_ms)`.
    ///
    /// The first error aborts the whole fetch; transport-level retries are the
    /// source's responsibility.
    pub async fn fetch_range<S>(
        &self,
        source: &S,
        start_ms: i64,
        end_ms: i64,
        direction: Direction,
    ) -> Result<Vec<Execution>, ApiError>
    where
        S: ExecutionSource + ?Sized,
    {
        let span_ms = self.config.window.num_milliseconds();
        let mut executions = Vec::new();

        for (index, window) in TimeWindows::new(start_ms, end_ms, span_ms, direction).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.page_delay).await;
            }

            let pages = self.pages(source, window);
            pin_mut!(pages);
            while let Some(page) = pages.try_next().await? {
                if !page.executions.is_empty() {
                    debug!(
                        "+{} executions in window {}..{}",
                        page.executions.len(),
                        window.start_ms,
                        window.end_ms
                    );
                }
                executions.extend(page.executions);
            }
        }

        if !executions.is_empty() {
            info!("Fetched {} executions", executions.len());
        }
        Ok(executions)
    }

    /// Full first-time history: exactly `lookback` back from `now_ms`, newest window first
    pub async fn fetch_full_history<S>(&self, source: &S, now_ms: i64) -> Result<Vec<Execution>, ApiError>
    where
        S: ExecutionSource + ?Sized,
    {
        let start_ms = now_ms - self.config.lookback.num_milliseconds();
        info!(
            "Fetching full history for the last {} days",
            self.config.lookback.num_days()
        );
        self.fetch_range(source, start_ms, now_ms, Direction::Backward).await
    }

    /// Gap since the last watermark, oldest window first
    pub async fn fetch_since<S>(
        &self,
        source: &S,
        since_ms: i64,
        now_ms: i64,
    ) -> Result<Vec<Execution>, ApiError>
    where
        S: ExecutionSource + ?Sized,
    {
        self.fetch_range(source, since_ms, now_ms, Direction::Forward).await
    }
}
