// Library crate - trade-history sync and cost-basis analytics

pub mod analytics;
pub mod bybit;
pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod portfolio;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use error::{ApiError, CacheError};
pub use types::*;
