//! Per-user trade cache and the incremental sync built on top of it

pub mod store;
pub mod sync;

pub use store::{CacheEntry, SqliteTradeCache, TradeCache};
pub use sync::{TradeSync, UserLocks};
