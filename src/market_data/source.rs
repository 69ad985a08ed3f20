// =============================================================================
// Candle source seam — one page of klines per request
// =============================================================================
//
// The history fetcher only talks to a `KlineSource`.  The production
// implementation is `BinanceClient`; tests substitute scripted sources.
// =============================================================================

use async_trait::async_trait;
use thiserror::Error;

use super::candle::Candle;

/// Parameters of a single page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub symbol: String,
    /// Exchange interval string, e.g. "1h".
    pub interval: String,
    /// Page size, capped by the exchange (1000 on Binance).
    pub limit: u32,
    /// Upper bound cursor in epoch milliseconds. `None` means "most recent".
    pub end_time: Option<i64>,
}

/// Failure of a page request or of a whole symbol fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The source asked us to back off (HTTP 429). Retry the same request.
    #[error("rate limited by candle source")]
    RateLimited,

    /// Network, HTTP status or decoding failure. Terminal for the symbol.
    #[error("transport error: {0}")]
    Transport(String),

    /// Too many consecutive rate-limited attempts on one page.
    #[error("retry budget exhausted after {attempts} rate-limited attempts")]
    Exhausted { attempts: u32 },
}

/// Anything that can serve one page of candles.
///
/// An empty `Ok` page means the source has nothing older to offer.
#[async_trait]
pub trait KlineSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Candle>, FetchError>;
}

#[async_trait]
impl<S: KlineSource + ?Sized> KlineSource for std::sync::Arc<S> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Candle>, FetchError> {
        (**self).fetch_page(request).await
    }
}
