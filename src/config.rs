//! Configuration for the exchange client and history fetcher

use anyhow::{Context, Result};
use std::time::Duration;

use crate::bybit::retry::RetryPolicy;

/// Bybit mainnet REST endpoint
pub const MAINNET_BASE_URL: &str = "https://api.bybit.com";

/// Exchange-side history retention for the execution list
pub const HISTORY_RETENTION_DAYS: i64 = 725;

/// API key pair for private endpoints
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Load credentials from environment variables
    ///
    /// Expects:
    /// - `BYBIT_API_KEY` - API key
    /// - `BYBIT_API_SECRET` - API secret
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("BYBIT_API_KEY")
            .context("BYBIT_API_KEY environment variable not set")?;
        let api_secret = std::env::var("BYBIT_API_SECRET")
            .context("BYBIT_API_SECRET environment variable not set")?;
        Ok(Self::new(api_key, api_secret))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Configuration for the signed REST client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base URL without trailing slash
    pub base_url: String,

    /// Receive window tolerance sent with every signed request, in milliseconds
    pub recv_window_ms: u64,

    /// Per-request HTTP timeout
    pub timeout: Duration,

    /// Retry behaviour for transport and HTTP failures
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: MAINNET_BASE_URL.to_string(),
            recv_window_ms: 20_000,
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `BYBIT_BASE_URL` and `BYBIT_RECV_WINDOW` when set
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("BYBIT_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(window) = std::env::var("BYBIT_RECV_WINDOW") {
            config.recv_window_ms = window
                .parse()
                .context("BYBIT_RECV_WINDOW must be a valid integer")?;
        }
        Ok(config)
    }
}

/// Configuration for paginated history fetching
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Product category passed to the execution list endpoint
    pub category: String,

    /// Page size requested per call
    pub page_limit: u32,

    /// Maximum span of one time window (the endpoint rejects longer ranges)
    pub window: chrono::Duration,

    /// Pause between consecutive page requests and between windows
    pub page_delay: Duration,

    /// How far back a first-ever sync reaches
    pub lookback: chrono::Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            category: "spot".to_string(),
            page_limit: 100,
            window: chrono::Duration::days(7),
            page_delay: Duration::from_millis(100),
            lookback: chrono::Duration::days(HISTORY_RETENTION_DAYS),
        }
    }
}
