//! Abstraction over a remote, cursor-paginated execution list

use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::Execution;

/// One page request against the execution list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionQuery {
    pub category: String,
    pub symbol: Option<String>,
    /// Inclusive lower bound, Unix ms
    pub start_ms: i64,
    /// Upper bound, Unix ms
    pub end_ms: i64,
    pub limit: u32,
    /// Opaque cursor from the previous page, `None` for the first page
    pub cursor: Option<String>,
}

/// One page of executions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionPage {
    pub executions: Vec<Execution>,
    /// Cursor for the next page; `None` once the window is exhausted
    pub next_cursor: Option<String>,
}

impl ExecutionPage {
    /// Build a page, treating an empty cursor string as "no more pages"
    pub fn new(executions: Vec<Execution>, cursor: String) -> Self {
        let next_cursor = if cursor.trim().is_empty() {
            None
        } else {
            Some(cursor)
        };
        Self {
            executions,
            next_cursor,
        }
    }
}

/// Anything that can serve a single page of execution history
#[async_trait]
pub trait ExecutionSource: Send + Sync {
    async fn execution_page(&self, query: &ExecutionQuery) -> Result<ExecutionPage, ApiError>;
}
