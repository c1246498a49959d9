//! CoinGecko provider against a local stand-in for the upstream API.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use coinfeed_market_data::{
    CoinGeckoConfig, CoinGeckoProvider, MarketDataError, MarketDataProvider, RetryPolicy,
    SkipReason,
};

/// Scripted upstream: hit `n` gets `responses[n]`, the last entry repeats.
struct Upstream {
    responses: Vec<(u16, String)>,
    hits: AtomicUsize,
    last_query: Mutex<Option<HashMap<String, String>>>,
}

impl Upstream {
    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn markets(
    State(upstream): State<Arc<Upstream>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let n = upstream.hits.fetch_add(1, Ordering::SeqCst);
    *upstream.last_query.lock().unwrap() = Some(params);

    let (code, body) = upstream
        .responses
        .get(n)
        .or_else(|| upstream.responses.last())
        .cloned()
        .unwrap_or((500, String::new()));

    (
        StatusCode::from_u16(code).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

async fn spawn_upstream(responses: Vec<(u16, &str)>) -> (SocketAddr, Arc<Upstream>) {
    let upstream = Arc::new(Upstream {
        responses: responses
            .into_iter()
            .map(|(code, body)| (code, body.to_string()))
            .collect(),
        hits: AtomicUsize::new(0),
        last_query: Mutex::new(None),
    });

    let app = Router::new()
        .route("/api/v3/coins/markets", get(markets))
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, upstream)
}

fn provider_for(addr: SocketAddr) -> CoinGeckoProvider {
    CoinGeckoProvider::new(CoinGeckoConfig {
        base_url: format!("http://{addr}/api/v3/"),
        request_timeout: Duration::from_secs(5),
        requests_per_minute: 6000,
        retry: RetryPolicy {
            backoff_factor: 0.0,
            ..RetryPolicy::default()
        },
    })
    .unwrap()
}

const TWO_COINS: &str = r#"[
    {"id": "bitcoin", "symbol": "btc", "name": "Bitcoin", "current_price": 50000, "total_volume": 30000000000, "price_change_percentage_7d_in_currency": 2.5},
    {"id": "ethereum", "symbol": "eth", "name": "Ethereum", "current_price": "3000.5", "total_volume": null}
]"#;

#[tokio::test]
async fn test_fetch_top_success_sends_expected_query() {
    let (addr, upstream) = spawn_upstream(vec![(200, TWO_COINS)]).await;
    let provider = provider_for(addr);

    let records = provider.fetch_top(2, "eur").await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].symbol, "BTC");
    assert_eq!(records[0].price_change_percentage_7d, Some(2.5));
    assert_eq!(records[1].symbol, "ETH");
    assert_eq!(records[1].current_price, Some(3000.5));
    assert_eq!(records[1].total_volume, None);
    assert_eq!(upstream.hits(), 1);

    let query = upstream.last_query.lock().unwrap().clone().unwrap();
    assert_eq!(query.get("vs_currency").map(String::as_str), Some("eur"));
    assert_eq!(query.get("order").map(String::as_str), Some("volume_desc"));
    assert_eq!(query.get("per_page").map(String::as_str), Some("2"));
    assert_eq!(query.get("page").map(String::as_str), Some("1"));
    assert_eq!(query.get("sparkline").map(String::as_str), Some("false"));
    assert_eq!(
        query.get("price_change_percentage").map(String::as_str),
        Some("24h,7d")
    );
}

#[tokio::test]
async fn test_malformed_items_are_skipped_not_fatal() {
    let body = r#"[
        {"id": "bitcoin", "symbol": "btc"},
        {"symbol": "nox"},
        {"id": "ghost", "symbol": ""},
        "garbage"
    ]"#;
    let (addr, _upstream) = spawn_upstream(vec![(200, body)]).await;
    let provider = provider_for(addr);

    let batch = provider.fetch_batch(4, "usd").await.unwrap();

    assert_eq!(batch.records.len(), 1);
    assert_eq!(batch.records[0].id, "bitcoin");
    let reasons: Vec<_> = batch.skipped.iter().map(|s| s.reason.clone()).collect();
    assert_eq!(
        reasons,
        vec![
            SkipReason::MissingId,
            SkipReason::MissingSymbol,
            SkipReason::NotAnObject
        ]
    );
}

#[tokio::test]
async fn test_retries_transient_status_then_succeeds() {
    let (addr, upstream) = spawn_upstream(vec![(503, "{}"), (200, TWO_COINS)]).await;
    let provider = provider_for(addr);

    let records = provider.fetch_top(2, "usd").await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(upstream.hits(), 2);
}

#[tokio::test]
async fn test_persistent_rate_limit_exhausts_retries() {
    let (addr, upstream) = spawn_upstream(vec![(429, "{}")]).await;
    let provider = provider_for(addr);

    let err = provider.fetch_top(10, "usd").await.unwrap_err();

    assert!(err.is_rate_limited(), "unexpected error: {err:?}");
    // One initial attempt plus three retries
    assert_eq!(upstream.hits(), 4);
}

#[tokio::test]
async fn test_non_retryable_status_fails_immediately() {
    let (addr, upstream) = spawn_upstream(vec![(404, "{}")]).await;
    let provider = provider_for(addr);

    let err = provider.fetch_top(10, "usd").await.unwrap_err();

    match err {
        MarketDataError::Http { provider, status } => {
            assert_eq!(provider, "COINGECKO");
            assert_eq!(status, 404);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(upstream.hits(), 1);
}

#[tokio::test]
async fn test_non_array_payload_is_decode_error() {
    let (addr, upstream) = spawn_upstream(vec![(200, r#"{"status": "ok"}"#)]).await;
    let provider = provider_for(addr);

    let err = provider.fetch_top(10, "usd").await.unwrap_err();

    assert!(
        matches!(err, MarketDataError::Decode { .. }),
        "unexpected error: {err:?}"
    );
    assert_eq!(upstream.hits(), 1);
}

#[tokio::test]
async fn test_invalid_json_is_decode_error() {
    let (addr, _upstream) = spawn_upstream(vec![(200, "[{not json")]).await;
    let provider = provider_for(addr);

    let err = provider.fetch_top(10, "usd").await.unwrap_err();

    assert!(
        matches!(err, MarketDataError::Decode { .. }),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_empty_array_is_empty_success() {
    let (addr, _upstream) = spawn_upstream(vec![(200, "[]")]).await;
    let provider = provider_for(addr);

    let records = provider.fetch_top(10, "usd").await.unwrap();

    assert!(records.is_empty());
}
