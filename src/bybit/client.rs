//! Bybit REST client
//!
//! Signed requests for private endpoints, with bounded retry on transport
//! failures, non-200 statuses and unparsable bodies.

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{debug, warn};

use super::models::*;
use crate::config::{ClientConfig, Credentials};
use crate::error::ApiError;
use crate::history::{ExecutionPage, ExecutionQuery, ExecutionSource};
use crate::types::BalanceSnapshot;

type HmacSha256 = Hmac<Sha256>;

/// Coins below this equity are treated as dust and left out of balances
pub const MIN_BALANCE: f64 = 0.01;

/// Bybit v5 API client bound to one set of credentials
pub struct BybitClient {
    http: Client,
    config: ClientConfig,
    credentials: Credentials,
    last_timestamp: AtomicI64,
}

impl BybitClient {
    /// Create a new client with explicit configuration
    pub fn new(config: ClientConfig, credentials: Credentials) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            credentials,
            last_timestamp: AtomicI64::new(0),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Millisecond timestamp that never repeats or goes backwards for this client
    fn next_timestamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut last = self.last_timestamp.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match self.last_timestamp.compare_exchange_weak(
                last,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }

    /// Hex HMAC-SHA256 over `timestamp ‖ api_key ‖ recv_window ‖ query`
    pub fn sign(&self, timestamp: i64, query: &str) -> Result<String, ApiError> {
        let payload = format!(
            "{}{}{}{}",
            timestamp, self.credentials.api_key, self.config.recv_window_ms, query
        );
        let mut mac = HmacSha256::new_from_slice(self.credentials.api_secret.as_bytes())
            .map_err(|e| ApiError::Signing(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn url(&self, path: &str, query: &str) -> String {
        let base = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        if query.is_empty() {
            base
        } else {
            format!("{}?{}", base, query)
        }
    }

    /// Send once and return the body of a 200 response
    async fn execute(&self, request: RequestBuilder, path: &str) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            warn!("GET {} returned 401", path);
            return Err(ApiError::Auth(
                "check API key/secret and IP whitelist".to_string(),
            ));
        }
        if status != StatusCode::OK {
            debug!("GET {} returned {}: {}", path, status, body);
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    /// Signed GET with retry, returning the typed `result` of the envelope
    pub async fn get_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let query = canonical_query(params)?;
        let url = self.url(path, &query);
        let (this, query, url) = (self, &query, &url);

        self.config
            .retry
            .run(path, move |_| async move {
                let timestamp = this.next_timestamp();
                let signature = this.sign(timestamp, query)?;
                let request = this
                    .http
                    .get(url)
                    .header("X-BAPI-API-KEY", &this.credentials.api_key)
                    .header("X-BAPI-TIMESTAMP", timestamp.to_string())
                    .header("X-BAPI-RECV-WINDOW", this.config.recv_window_ms.to_string())
                    .header("X-BAPI-SIGN", signature);
                let body = this.execute(request, path).await?;
                parse_envelope(&body)
            })
            .await
    }

    /// Unsigned GET with retry for public market data
    pub async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let query = canonical_query(params)?;
        let url = self.url(path, &query);
        let (this, url) = (self, &url);

        self.config
            .retry
            .run(path, move |_| async move {
                let body = this.execute(this.http.get(url), path).await?;
                parse_envelope(&body)
            })
            .await
    }

    // ========================================================================
    // Account
    // ========================================================================

    /// Spot coin balances of the unified account, dust removed
    pub async fn spot_balance(&self) -> Result<BalanceSnapshot, ApiError> {
        let result: WalletBalanceResult = self
            .get_signed(
                "/v5/account/wallet-balance",
                &[("accountType", "UNIFIED".to_string())],
            )
            .await?;

        let mut snapshot = BalanceSnapshot::default();
        let Some(account) = result.list.into_iter().next() else {
            return Ok(snapshot);
        };

        snapshot.total = account.total_wallet_balance.parse::<f64>().ok();
        for coin in account.coin {
            match coin.equity.parse::<f64>() {
                Ok(value) if value >= MIN_BALANCE => {
                    snapshot.coins.insert(coin.coin, value);
                }
                Ok(_) => {}
                Err(_) if coin.equity.is_empty() => {}
                Err(e) => warn!("Ignoring unparsable equity for {}: {}", coin.coin, e),
            }
        }

        debug!("Balance snapshot: {} coins", snapshot.coins.len());
        Ok(snapshot)
    }

    // ========================================================================
    // Market data
    // ========================================================================

    /// Last traded price of every spot symbol
    pub async fn market_prices(&self) -> Result<HashMap<String, f64>, ApiError> {
        let result: TickerListResult = self
            .get_public("/v5/market/tickers", &[("category", "spot".to_string())])
            .await?;

        Ok(result
            .list
            .into_iter()
            .filter_map(|ticker| {
                let price = ticker.last_price.parse::<f64>().ok()?;
                Some((ticker.symbol, price))
            })
            .collect())
    }

    /// Last traded price of a single spot symbol
    pub async fn current_price(&self, symbol: &str) -> Result<f64, ApiError> {
        let result: TickerListResult = self
            .get_public(
                "/v5/market/tickers",
                &[
                    ("category", "spot".to_string()),
                    ("symbol", symbol.to_string()),
                ],
            )
            .await?;

        let ticker = result
            .list
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Malformed(format!("no ticker returned for {}", symbol)))?;
        ticker
            .last_price
            .parse::<f64>()
            .map_err(|e| ApiError::Malformed(format!("bad price for {}: {}", symbol, e)))
    }
}

#[async_trait]
impl ExecutionSource for BybitClient {
    async fn execution_page(&self, query: &ExecutionQuery) -> Result<ExecutionPage, ApiError> {
        let mut params = vec![
            ("category", query.category.clone()),
            ("limit", query.limit.to_string()),
            ("startTime", query.start_ms.to_string()),
            ("endTime", query.end_ms.to_string()),
        ];
        if let Some(symbol) = &query.symbol {
            params.push(("symbol", symbol.clone()));
        }
        if let Some(cursor) = &query.cursor {
            params.push(("cursor", cursor.clone()));
        }

        let result: ExecutionListResult = self.get_signed("/v5/execution/list", &params).await?;
        Ok(ExecutionPage::new(result.list, result.next_page_cursor))
    }
}

/// Url-encoded query string with keys in sorted order
pub fn canonical_query(params: &[(&str, String)]) -> Result<String, ApiError> {
    let mut sorted: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    serde_urlencoded::to_string(&sorted).map_err(|e| ApiError::Signing(e.to_string()))
}

/// Decode an envelope, surfacing a non-zero `retCode` as [`ApiError::Remote`]
pub fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let envelope: Envelope = serde_json::from_str(body).map_err(|e| {
        debug!("Unparsable response body: {}", body);
        ApiError::Malformed(e.to_string())
    })?;

    if envelope.ret_code != 0 {
        return Err(ApiError::Remote {
            code: envelope.ret_code,
            message: envelope.ret_msg,
        });
    }

    serde_json::from_value(envelope.result).map_err(|e| ApiError::Malformed(e.to_string()))
}
