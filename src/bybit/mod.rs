//! Bybit API Integration
//!
//! This module provides the signed REST client used to pull spot execution
//! history, balances and prices from the Bybit v5 API.
//!
//! # Components
//!
//! - [`client`] - HTTP client with HMAC-SHA256 request signing
//! - [`models`] - Response envelope and payload types
//! - [`retry`] - Fixed-delay retry policy shared by all requests
//!
//! # Environment Variables
//!
//! - `BYBIT_API_KEY` - API key (read-only permissions are enough)
//! - `BYBIT_API_SECRET` - API secret
//! - `BYBIT_BASE_URL` (optional) - REST endpoint, defaults to mainnet
//! - `BYBIT_RECV_WINDOW` (optional) - receive window in milliseconds
//!
//! # API Endpoints Used
//!
//! - `GET /v5/execution/list` - Executed fills (signed, cursor paginated)
//! - `GET /v5/account/wallet-balance` - Coin balances (signed)
//! - `GET /v5/market/tickers` - Last traded prices (public)

pub mod client;
pub mod models;
pub mod retry;

pub use client::BybitClient;
pub use retry::RetryPolicy;
