//! REST client behaviour against a local mock of the v5 API

use axum::http::{HeaderMap, StatusCode, Uri};
use axum::{extract::State, Router};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use spot_pnl::bybit::{BybitClient, RetryPolicy};
use spot_pnl::cache::{SqliteTradeCache, TradeSync};
use spot_pnl::config::{ClientConfig, Credentials, FetchConfig};
use spot_pnl::history::{Direction, ExecutionQuery, ExecutionSource, HistoryFetcher};
use spot_pnl::portfolio::load_balance_view;
use spot_pnl::{ApiError, Side};

const API_KEY: &str = "test-key";
const API_SECRET: &str = "test-secret";
const RECV_WINDOW: u64 = 20_000;

type Responder = dyn Fn(u32, &str, &str) -> (u16, String) + Send + Sync;

struct RecordedRequest {
    path: String,
    query: String,
    headers: HeaderMap,
}

struct MockState {
    hits: AtomicU32,
    requests: Mutex<Vec<RecordedRequest>>,
    respond: Box<Responder>,
}

async fn handle(State(state): State<Arc<MockState>>, uri: Uri, headers: HeaderMap) -> (StatusCode, String) {
    let attempt = state.hits.fetch_add(1, Ordering::SeqCst);
    let path = uri.path().to_string();
    let query = uri.query().unwrap_or_default().to_string();
    let (status, body) = (state.respond)(attempt, &path, &query);
    state.requests.lock().unwrap().push(RecordedRequest { path, query, headers });
    (StatusCode::from_u16(status).unwrap(), body)
}

/// Serve `respond` on an ephemeral port and return a client pointed at it
async fn mock_exchange<F>(respond: F) -> (BybitClient, Arc<MockState>)
where
    F: Fn(u32, &str, &str) -> (u16, String) + Send + Sync + 'static,
{
    let state = Arc::new(MockState {
        hits: AtomicU32::new(0),
        requests: Mutex::new(Vec::new()),
        respond: Box::new(respond),
    });
    let app = Router::new().fallback(handle).with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ClientConfig {
        base_url: format!("http://{}", addr),
        recv_window_ms: RECV_WINDOW,
        timeout: Duration::from_secs(5),
        retry: RetryPolicy::new(3, Duration::ZERO),
    };
    let client = BybitClient::new(config, Credentials::new(API_KEY, API_SECRET)).unwrap();
    (client, state)
}

fn ok(result: serde_json::Value) -> (u16, String) {
    let body = serde_json::json!({ "retCode": 0, "retMsg": "OK", "result": result });
    (200, body.to_string())
}

fn execution_query(cursor: Option<&str>) -> ExecutionQuery {
    ExecutionQuery {
        category: "spot".to_string(),
        symbol: None,
        start_ms: 1_700_000_000_000,
        end_ms: 1_700_000_099_999,
        limit: 100,
        cursor: cursor.map(str::to_string),
    }
}

fn fill(symbol: &str, side: &str, price: &str, qty: &str) -> serde_json::Value {
    serde_json::json!({ "symbol": symbol, "side": side, "execPrice": price, "execQty": qty })
}

#[tokio::test]
async fn test_signed_request_headers_verify() {
    let (client, state) = mock_exchange(|_, _, _| ok(serde_json::json!({ "list": [] }))).await;

    client.spot_balance().await.unwrap();

    let requests = state.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.path, "/v5/account/wallet-balance");
    assert_eq!(request.query, "accountType=UNIFIED");

    let header = |name: &str| request.headers.get(name).unwrap().to_str().unwrap().to_string();
    assert_eq!(header("X-BAPI-API-KEY"), API_KEY);
    assert_eq!(header("X-BAPI-RECV-WINDOW"), RECV_WINDOW.to_string());

    let timestamp = header("X-BAPI-TIMESTAMP");
    let payload = format!("{}{}{}{}", timestamp, API_KEY, RECV_WINDOW, request.query);
    let mut mac = Hmac::<Sha256>::new_from_slice(API_SECRET.as_bytes()).unwrap();
    mac.update(payload.as_bytes());
    assert_eq!(header("X-BAPI-SIGN"), hex::encode(mac.finalize().into_bytes()));
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let (client, state) = mock_exchange(|_, _, _| (401, String::new())).await;

    let err = client.execution_page(&execution_query(None)).await.unwrap_err();

    assert!(matches!(err, ApiError::Auth(_)));
    assert_eq!(state.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let (client, state) = mock_exchange(|attempt, _, _| {
        if attempt == 0 {
            (500, "upstream down".to_string())
        } else {
            ok(serde_json::json!({
                "list": [fill("BTCUSDT", "Buy", "100", "1")],
                "nextPageCursor": ""
            }))
        }
    })
    .await;

    let page = client.execution_page(&execution_query(None)).await.unwrap();

    assert_eq!(page.executions.len(), 1);
    assert_eq!(page.next_cursor, None);
    assert_eq!(state.hits.load(Ordering::SeqCst), 2);

    // each attempt is signed with its own timestamp
    let requests = state.requests.lock().unwrap();
    let ts = |i: usize| requests[i].headers.get("X-BAPI-TIMESTAMP").unwrap().to_str().unwrap().parse::<i64>().unwrap();
    assert!(ts(1) > ts(0));
}

#[tokio::test]
async fn test_retries_exhausted() {
    let (client, state) = mock_exchange(|_, _, _| (503, "busy".to_string())).await;

    let err = client.market_prices().await.unwrap_err();

    assert!(matches!(err, ApiError::HttpStatus { status: 503, .. }));
    assert_eq!(state.hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_remote_error_is_not_retried() {
    let (client, state) = mock_exchange(|_, _, _| {
        let body = serde_json::json!({ "retCode": 10003, "retMsg": "API key is invalid.", "result": {} });
        (200, body.to_string())
    })
    .await;

    let err = client.execution_page(&execution_query(None)).await.unwrap_err();

    match err {
        ApiError::Remote { code, message } => {
            assert_eq!(code, 10003);
            assert_eq!(message, "API key is invalid.");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(state.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_fetcher_paginates_through_client() {
    let (client, state) = mock_exchange(|_, _, query| {
        if query.contains("cursor=next-1") {
            ok(serde_json::json!({
                "list": [fill("ETHUSDT", "Sell", "2100", "0.5")],
                "nextPageCursor": ""
            }))
        } else {
            ok(serde_json::json!({
                "list": [fill("ETHUSDT", "Buy", "2000", "1"), fill("ETHUSDT", "Buy", "1900", "1")],
                "nextPageCursor": "next-1"
            }))
        }
    })
    .await;

    let fetcher = HistoryFetcher::new(FetchConfig {
        page_delay: Duration::ZERO,
        ..FetchConfig::default()
    });
    let start = 1_700_000_000_000;
    let end = start + 60_000;
    let executions = fetcher.fetch_range(&client, start, end, Direction::Forward).await.unwrap();

    assert_eq!(executions.len(), 3);
    assert_eq!(executions[2].side, Side::Sell);

    let requests = state.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].query.contains(&format!("startTime={}", start)));
    assert!(requests[0].query.contains(&format!("endTime={}", end - 1)));
    assert!(requests[0].query.contains("category=spot"));
    assert!(requests[0].query.contains("limit=100"));
    assert!(!requests[0].query.contains("cursor"));
    assert!(requests[1].query.contains("cursor=next-1"));
}

#[tokio::test]
async fn test_balance_view_with_price_fallback() {
    let (client, _state) = mock_exchange(|_, path, query| match path {
        "/v5/execution/list" => ok(serde_json::json!({
            "list": [fill("BTCUSDT", "Buy", "50000", "0.5")],
            "nextPageCursor": ""
        })),
        "/v5/account/wallet-balance" => ok(serde_json::json!({
            "list": [{
                "totalWalletBalance": "1234.5",
                "coin": [
                    { "coin": "BTC", "equity": "0.5" },
                    { "coin": "SOL", "equity": "2" },
                    { "coin": "PEPE", "equity": "1000" },
                    { "coin": "USDT", "equity": "100" },
                    { "coin": "SHIB", "equity": "0.001" }
                ]
            }]
        })),
        "/v5/market/tickers" if query.contains("symbol=SOLUSDT") => ok(serde_json::json!({
            "list": [{ "symbol": "SOLUSDT", "lastPrice": "150" }]
        })),
        "/v5/market/tickers" if query.contains("symbol=") => {
            let body = serde_json::json!({ "retCode": 10001, "retMsg": "Not supported symbols", "result": {} });
            (200, body.to_string())
        }
        "/v5/market/tickers" => ok(serde_json::json!({
            "list": [{ "symbol": "BTCUSDT", "lastPrice": "60000" }]
        })),
        _ => (404, String::new()),
    })
    .await;

    let fetcher = HistoryFetcher::new(FetchConfig {
        page_delay: Duration::ZERO,
        lookback: chrono::Duration::days(7),
        ..FetchConfig::default()
    });
    let sync = TradeSync::new(SqliteTradeCache::open_in_memory().unwrap(), fetcher);

    let view = load_balance_view(&client, &sync, 1).await.unwrap();

    assert_eq!(view.total_wallet_balance, Some(1234.5));
    assert_eq!(view.assets.len(), 3);

    let btc = view.assets.iter().find(|a| a.name == "BTC").unwrap();
    assert!((btc.unrealized_pnl - 5_000.0).abs() < 1e-9);
    assert!((btc.pnl_percentage - 20.0).abs() < 1e-9);

    let sol = view.assets.iter().find(|a| a.name == "SOL").unwrap();
    assert!((sol.current_value - 300.0).abs() < 1e-9);
    assert_eq!(sol.unrealized_pnl, 0.0);

    assert_eq!(view.missing_prices, vec!["PEPE".to_string()]);
}
