// =============================================================================
// Binance REST client — public klines endpoint
// =============================================================================
//
// Only the unsigned market-data endpoint is used, so no API key is needed.
// The underlying `reqwest::Client` (and its connection pool) is shared by all
// concurrent fetch tasks through `Arc<BinanceClient>`.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, instrument};

use super::rate_limit::RateLimitTracker;
use crate::market_data::candle::{decode_klines, Candle};
use crate::market_data::source::{FetchError, KlineSource, PageRequest};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Binance public market-data client.
#[derive(Clone)]
pub struct BinanceClient {
    base_url: String,
    client: reqwest::Client,
    rate_limits: Arc<RateLimitTracker>,
}

impl BinanceClient {
    /// Create a client with its own connection pool.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client that re-uses an existing HTTP client.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "BinanceClient initialised");
        Self {
            base_url,
            client,
            rate_limits: Arc::new(RateLimitTracker::new()),
        }
    }

    pub fn rate_limits(&self) -> &RateLimitTracker {
        &self.rate_limits
    }

    /// Query parameters of a klines request.
    fn klines_query(request: &PageRequest) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("symbol", request.symbol.clone()),
            ("interval", request.interval.clone()),
            ("limit", request.limit.to_string()),
        ];
        if let Some(end) = request.end_time {
            query.push(("endTime", end.to_string()));
        }
        query
    }
}

#[async_trait]
impl KlineSource for BinanceClient {
    /// GET /api/v3/klines (public — no signature required).
    #[instrument(skip(self), fields(symbol = %request.symbol, end_time = ?request.end_time), name = "binance::fetch_page")]
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Candle>, FetchError> {
        let url = format!("{}/api/v3/klines", self.base_url);

        self.rate_limits.record_request();
        let resp = self
            .client
            .get(&url)
            .query(&Self::klines_query(request))
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("GET /api/v3/klines failed: {e}")))?;

        self.rate_limits.update_from_headers(resp.headers());

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = status_error(status, &body);
            if err == FetchError::RateLimited {
                self.rate_limits.record_throttled();
            }
            return Err(err);
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| FetchError::Transport(format!("failed to parse klines response: {e}")))?;

        let candles = decode_klines(&request.symbol, &body)
            .map_err(|e| FetchError::Transport(format!("{e:#}")))?;

        debug!(count = candles.len(), "klines page fetched");
        Ok(candles)
    }
}

/// Map a non-success klines status to the fetch error the history walk
/// understands: 429 is retryable, everything else ends the symbol.
fn status_error(status: StatusCode, body: &str) -> FetchError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        FetchError::RateLimited
    } else {
        FetchError::Transport(format!(
            "Binance GET /api/v3/klines returned {status}: {body}"
        ))
    }
}

impl std::fmt::Debug for BinanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceClient")
            .field("base_url", &self.base_url)
            .field("rate_limits", &self.rate_limits)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one canned HTTP response on a random local port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 X-MBX-USED-WEIGHT-1M: 42\r\n\
                 Connection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}")
    }

    fn request(end_time: Option<i64>) -> PageRequest {
        PageRequest {
            symbol: "BTCUSDT".into(),
            interval: "1h".into(),
            limit: 1000,
            end_time,
        }
    }

    #[test]
    fn query_without_cursor() {
        let q = BinanceClient::klines_query(&request(None));
        assert_eq!(
            q,
            vec![
                ("symbol", "BTCUSDT".to_string()),
                ("interval", "1h".to_string()),
                ("limit", "1000".to_string()),
            ]
        );
    }

    #[test]
    fn query_with_cursor() {
        let q = BinanceClient::klines_query(&request(Some(1_700_000_000_000)));
        assert_eq!(q.last(), Some(&("endTime", "1700000000000".to_string())));
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = BinanceClient::with_client(reqwest::Client::new(), "http://127.0.0.1:9/");
        assert_eq!(client.base_url, "http://127.0.0.1:9");
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        // Port 9 (discard) on localhost is closed on test machines.
        let client = BinanceClient::new("http://127.0.0.1:9").unwrap();
        let err = client.fetch_page(&request(None)).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
        assert_eq!(client.rate_limits().snapshot().requests_sent, 1);
    }

    #[test]
    fn status_429_is_rate_limited() {
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "{\"code\":-1003}"),
            FetchError::RateLimited
        );
    }

    #[test]
    fn other_failures_are_transport_errors() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::IM_A_TEAPOT,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            match status_error(status, "boom") {
                FetchError::Transport(msg) => {
                    assert!(msg.contains(status.as_str()), "{msg}");
                    assert!(msg.contains("boom"));
                }
                other => panic!("{status} mapped to {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn throttled_response_is_rate_limited_and_counted() {
        let base = serve_once("429 Too Many Requests", r#"{"code":-1003,"msg":"Too many requests"}"#).await;
        let client = BinanceClient::new(base).unwrap();

        let err = client.fetch_page(&request(None)).await.unwrap_err();

        assert_eq!(err, FetchError::RateLimited);
        let snapshot = client.rate_limits().snapshot();
        assert_eq!(snapshot.throttled_responses, 1);
        assert_eq!(snapshot.used_weight_1m, 42);
    }

    #[tokio::test]
    async fn server_error_is_transport_error() {
        let base = serve_once("500 Internal Server Error", r#"{"msg":"oops"}"#).await;
        let client = BinanceClient::new(base).unwrap();

        let err = client.fetch_page(&request(None)).await.unwrap_err();

        assert!(matches!(err, FetchError::Transport(ref msg) if msg.contains("500")), "{err:?}");
        assert_eq!(client.rate_limits().snapshot().throttled_responses, 0);
    }

    #[tokio::test]
    async fn success_decodes_candles() {
        let base = serve_once(
            "200 OK",
            r#"[[1700000000000,"100.0","110.0","95.0","105.0","12.5",1700003599999,"0",10,"0","0","0"]]"#,
        )
        .await;
        let client = BinanceClient::new(base).unwrap();

        let candles = client.fetch_page(&request(None)).await.unwrap();

        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].open_time, 1_700_000_000_000);
        assert_eq!(candles[0].close, 105.0);
    }
}
