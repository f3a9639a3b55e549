//! SQLite-backed trade cache
//!
//! One row per user holding the full execution list as JSON plus the
//! watermark up to which history has been fetched.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

use crate::error::CacheError;
use crate::types::Execution;

/// Cached history of one user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheEntry {
    pub executions: Vec<Execution>,
    /// Unix ms before which all history has been fetched; 0 when never synced
    pub last_update_ms: i64,
}

impl CacheEntry {
    /// True until a first sync has stored a watermark, even if it fetched nothing
    pub fn never_synced(&self) -> bool {
        self.last_update_ms == 0
    }
}

/// Per-user persistence of execution history
pub trait TradeCache: Send + Sync {
    /// Stored entry, or an empty entry with watermark 0 if the user is unknown
    fn read(&self, user_id: i64) -> Result<CacheEntry, CacheError>;

    /// Replace the stored list and watermark for `user_id`
    fn write(&self, user_id: i64, executions: &[Execution], last_update_ms: i64) -> Result<(), CacheError>;
}

/// Trade cache in a SQLite database
pub struct SqliteTradeCache {
    conn: Mutex<Connection>,
}

impl SqliteTradeCache {
    /// Open (or create) the cache database at `db_path`
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, CacheError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.init_schema()?;
        Ok(cache)
    }

    /// In-memory cache, lost when dropped
    pub fn open_in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&self) -> Result<(), CacheError> {
        let conn = self.conn.lock().map_err(|_| CacheError::LockPoisoned)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS trade_history (
                user_id INTEGER PRIMARY KEY,
                trades TEXT NOT NULL,
                last_update INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}

impl TradeCache for SqliteTradeCache {
    fn read(&self, user_id: i64) -> Result<CacheEntry, CacheError> {
        let conn = self.conn.lock().map_err(|_| CacheError::LockPoisoned)?;
        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT trades, last_update FROM trade_history WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((trades_json, last_update_ms)) = row else {
            return Ok(CacheEntry::default());
        };

        let executions: Vec<Execution> = serde_json::from_str(&trades_json)?;
        debug!(
            "Cache hit for user {}: {} executions, watermark {}",
            user_id,
            executions.len(),
            last_update_ms
        );
        Ok(CacheEntry {
            executions,
            last_update_ms,
        })
    }

    fn write(&self, user_id: i64, executions: &[Execution], last_update_ms: i64) -> Result<(), CacheError> {
        let trades_json = serde_json::to_string(executions)?;
        let conn = self.conn.lock().map_err(|_| CacheError::LockPoisoned)?;
        conn.execute(
            "INSERT OR REPLACE INTO trade_history (user_id, trades, last_update) VALUES (?1, ?2, ?3)",
            params![user_id, trades_json, last_update_ms],
        )?;
        Ok(())
    }
}
