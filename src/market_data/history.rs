// =============================================================================
// Symbol History Fetcher — paginated backward walk over the klines endpoint
// =============================================================================
//
// Starting from the most recent page, the end-time cursor is walked backward
// one page at a time until one of:
//   - the oldest candle reaches `anchor - lookback`,
//   - a page comes back empty,
//   - a page makes no backward progress,
//   - a transport error occurs (partial history is kept),
//   - the rate-limit retry budget for a single page is used up.
//
// A 429 never advances the cursor: the same request is retried after a fixed
// cooldown.
// =============================================================================

use std::time::Duration;

use tracing::{debug, warn};

use super::candle::{Candle, SymbolSeries};
use super::source::{FetchError, KlineSource, PageRequest};
use crate::types::Granularity;

const DAY_MS: i64 = 86_400_000;

/// Shared fetch parameters for every symbol of a run.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Exchange interval string of the base granularity.
    pub interval: String,
    pub page_size: u32,
    pub lookback_days: u32,
    /// Sleep after a rate-limited response.
    pub rate_limit_cooldown: Duration,
    /// Consecutive rate-limited attempts tolerated on one page.
    pub max_rate_limit_retries: u32,
    pub max_concurrency: usize,
    /// Deadline for one symbol's whole history fetch.
    pub symbol_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            interval: "1h".to_string(),
            page_size: 1000,
            lookback_days: 365,
            rate_limit_cooldown: Duration::from_secs(60),
            max_rate_limit_retries: 5,
            max_concurrency: 8,
            symbol_timeout: Duration::from_secs(900),
        }
    }
}

/// Counters of a cursor walk, without the candles themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchProgress {
    pub failure: Option<FetchError>,
    pub pages: u32,
    pub rate_limit_waits: u32,
}

/// Drives a [`KlineSource`] to assemble one symbol's bounded history.
pub struct HistoryFetcher<'a, S: ?Sized> {
    source: &'a S,
    config: &'a FetchConfig,
}

impl<'a, S: KlineSource + ?Sized> HistoryFetcher<'a, S> {
    pub fn new(source: &'a S, config: &'a FetchConfig) -> Self {
        Self { source, config }
    }

    /// Walk the cursor backward, appending every received page to `collected`.
    ///
    /// Pages land in `collected` as soon as they arrive, so a caller that
    /// drops this future (e.g. on a deadline) still owns the partial history.
    pub async fn fetch_into(
        &self,
        symbol: &str,
        anchor_ms: i64,
        collected: &mut Vec<Candle>,
    ) -> FetchProgress {
        let cutoff = self.cutoff(anchor_ms);

        let mut cursor: Option<i64> = None;
        let mut pages = 0u32;
        let mut waits = 0u32;
        let mut throttled = 0u32;
        let mut failure = None;

        loop {
            let request = PageRequest {
                symbol: symbol.to_string(),
                interval: self.config.interval.clone(),
                limit: self.config.page_size,
                end_time: cursor,
            };

            let page = match self.source.fetch_page(&request).await {
                Ok(page) => page,
                Err(FetchError::RateLimited) => {
                    throttled += 1;
                    if throttled > self.config.max_rate_limit_retries {
                        warn!(symbol, attempts = throttled, "rate-limit retry budget exhausted");
                        failure = Some(FetchError::Exhausted { attempts: throttled });
                        break;
                    }
                    warn!(
                        symbol,
                        attempt = throttled,
                        cooldown_secs = self.config.rate_limit_cooldown.as_secs(),
                        "rate limited — backing off before retrying the same page"
                    );
                    waits += 1;
                    tokio::time::sleep(self.config.rate_limit_cooldown).await;
                    continue;
                }
                Err(e) => {
                    warn!(symbol, error = %e, pages, "aborting history fetch, keeping partial data");
                    failure = Some(e);
                    break;
                }
            };
            throttled = 0;

            let Some(oldest) = page.iter().map(|c| c.open_time).min() else {
                debug!(symbol, pages, "empty page — source exhausted");
                break;
            };
            pages += 1;
            collected.extend(page);

            if oldest <= cutoff {
                debug!(symbol, pages, "lookback window covered");
                break;
            }
            if cursor.is_some_and(|c| oldest > c) {
                warn!(symbol, oldest, "page did not move the cursor backward — stopping");
                break;
            }
            cursor = Some(oldest - 1);
        }

        FetchProgress {
            failure,
            pages,
            rate_limit_waits: waits,
        }
    }

    /// Trim raw pages to `[anchor - lookback, anchor]`, sorted and deduplicated.
    pub fn window(&self, symbol: &str, anchor_ms: i64, mut collected: Vec<Candle>) -> SymbolSeries {
        let cutoff = self.cutoff(anchor_ms);
        collected.retain(|c| c.open_time >= cutoff && c.open_time <= anchor_ms);
        SymbolSeries::from_unordered(symbol, Granularity::Hourly, collected)
    }

    fn cutoff(&self, anchor_ms: i64) -> i64 {
        anchor_ms - i64::from(self.config.lookback_days) * DAY_MS
    }
}
