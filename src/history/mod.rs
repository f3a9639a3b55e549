//! Execution history retrieval
//!
//! # Components
//!
//! - [`source`] - the page-level seam implemented by the exchange client
//! - [`windows`] - fixed-size time windows over a history range
//! - [`fetcher`] - cursor pagination across all windows of a range

pub mod fetcher;
pub mod source;
pub mod windows;

pub use fetcher::HistoryFetcher;
pub use source::{ExecutionPage, ExecutionQuery, ExecutionSource};
pub use windows::{Direction, TimeWindow, TimeWindows};
