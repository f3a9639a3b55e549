//! In-process fakes shared by unit tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::ApiError;
use crate::history::{ExecutionPage, ExecutionQuery, ExecutionSource};
use crate::types::{Execution, Side};

/// Fetch config with no rate-limit pauses
pub(crate) fn fast_fetch_config() -> FetchConfig {
    FetchConfig {
        page_delay: Duration::ZERO,
        ..FetchConfig::default()
    }
}

/// `count` identical fills
pub(crate) fn fills(symbol: &str, count: usize, side: Side, price: &str, qty: &str) -> Vec<Execution> {
    (0..count)
        .map(|_| Execution::new(symbol, price, qty, side))
        .collect()
}

/// Execution source replaying a scripted sequence of responses.
///
/// Each request yields to the scheduler once, like a real network call would.
/// Once the script runs out every request returns an empty final page.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    script: Mutex<VecDeque<Result<ExecutionPage, ApiError>>>,
    queries: Mutex<Vec<ExecutionQuery>>,
}

impl ScriptedSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_page(&self, executions: Vec<Execution>, cursor: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(ExecutionPage::new(executions, cursor.to_string())));
    }

    pub(crate) fn push_error(&self, err: ApiError) {
        self.script.lock().unwrap().push_back(Err(err));
    }

    pub(crate) fn queries(&self) -> Vec<ExecutionQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExecutionSource for ScriptedSource {
    async fn execution_page(&self, query: &ExecutionQuery) -> Result<ExecutionPage, ApiError> {
        self.queries.lock().unwrap().push(query.clone());
        tokio::task::yield_now().await;
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ExecutionPage::default()))
    }
}
