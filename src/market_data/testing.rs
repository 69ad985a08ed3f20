// In-memory candle sources for unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::candle::Candle;
use super::source::{FetchError, KlineSource, PageRequest};

pub const HOUR_MS: i64 = 3_600_000;

/// Hourly candle with a rising close; consistent by construction.
pub fn hourly(index: i64, close: f64) -> Candle {
    Candle::new(index * HOUR_MS, close, close + 1.0, close - 1.0, close, 1.0)
}

/// Replays a fixed list of responses per symbol, then returns empty pages.
#[derive(Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<String, VecDeque<Result<Vec<Candle>, FetchError>>>>,
    requests: Mutex<Vec<PageRequest>>,
    hanging: HashSet<String>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(
        self,
        symbol: &str,
        responses: Vec<Result<Vec<Candle>, FetchError>>,
    ) -> Self {
        self.scripts
            .lock()
            .insert(symbol.to_string(), responses.into_iter().collect());
        self
    }

    /// Requests for `symbol` never complete.
    pub fn hang(mut self, symbol: &str) -> Self {
        self.hanging.insert(symbol.to_string());
        self
    }

    /// Every request takes `delay` of (tokio) time.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_for(&self, symbol: &str) -> Vec<PageRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.symbol == symbol)
            .cloned()
            .collect()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KlineSource for ScriptedSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Candle>, FetchError> {
        self.requests.lock().push(request.clone());

        if self.hanging.contains(&request.symbol) {
            std::future::pending::<()>().await;
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.scripts
            .lock()
            .get_mut(&request.symbol)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Serves pages out of a full candle history the way Binance does: the newest
/// `limit` candles whose `open_time <= end_time` (inclusive bound).
pub struct SyntheticExchange {
    history: HashMap<String, Vec<Candle>>,
}

impl SyntheticExchange {
    pub fn new() -> Self {
        Self {
            history: HashMap::new(),
        }
    }

    pub fn with_symbol(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.history.insert(symbol.to_string(), candles);
        self
    }
}

#[async_trait]
impl KlineSource for SyntheticExchange {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Candle>, FetchError> {
        let Some(all) = self.history.get(&request.symbol) else {
            return Err(FetchError::Transport(format!(
                "HTTP 400: unknown symbol {}",
                request.symbol
            )));
        };
        let eligible: Vec<Candle> = all
            .iter()
            .filter(|c| request.end_time.map_or(true, |end| c.open_time <= end))
            .copied()
            .collect();
        let start = eligible.len().saturating_sub(request.limit as usize);
        Ok(eligible[start..].to_vec())
    }
}
