// =============================================================================
// Fetch Orchestrator — bounded concurrent history fetch across many symbols
// =============================================================================
//
// Every requested symbol gets exactly one entry in the resulting dataset.  A
// symbol whose fetch failed maps to whatever partial history was recovered
// (possibly empty) and its error is reported separately in `failures`.
//
// Concurrency is capped at `max_concurrency` in-flight symbols and each
// symbol's fetch runs under its own deadline so one stalled symbol cannot hold
// the batch hostage.  Pages received before a deadline expires are kept.
// =============================================================================

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use super::candle::SymbolSeries;
use super::history::{FetchConfig, HistoryFetcher};
use super::source::{FetchError, KlineSource};

/// Symbol-keyed base-granularity candles of one run.
pub type Dataset = BTreeMap<String, SymbolSeries>;

/// Outcome of an orchestration run.
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub dataset: Dataset,
    /// Symbols whose fetch stopped early, with the reason.
    pub failures: BTreeMap<String, FetchError>,
}

impl FetchReport {
    pub fn succeeded(&self) -> usize {
        self.dataset.len() - self.failures.len()
    }
}

/// Runs [`HistoryFetcher`] for a set of symbols against one shared source.
pub struct FetchOrchestrator<S: ?Sized> {
    source: Arc<S>,
    config: FetchConfig,
}

impl<S: KlineSource + ?Sized> FetchOrchestrator<S> {
    pub fn new(source: Arc<S>, config: FetchConfig) -> Self {
        Self { source, config }
    }

    /// Fetch history for every symbol, ending at `anchor_ms`.
    ///
    /// Duplicate symbols are collapsed; input order is irrelevant.
    pub async fn run<I, T>(&self, symbols: I, anchor_ms: i64) -> FetchReport
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let unique: BTreeSet<String> = symbols.into_iter().map(Into::into).collect();
        let limit = self.config.max_concurrency.max(1);

        info!(
            symbols = unique.len(),
            max_concurrency = limit,
            lookback_days = self.config.lookback_days,
            "starting candle fetch"
        );

        let results: Vec<(String, SymbolSeries, Option<FetchError>)> =
            stream::iter(unique.into_iter())
                .map(|symbol| self.fetch_one(symbol, anchor_ms))
                .buffer_unordered(limit)
                .collect()
                .await;

        let mut dataset = Dataset::new();
        let mut failures = BTreeMap::new();
        for (symbol, series, failure) in results {
            if let Some(err) = failure {
                failures.insert(symbol.clone(), err);
            }
            dataset.insert(symbol, series);
        }

        info!(
            symbols = dataset.len(),
            failed = failures.len(),
            "candle fetch complete"
        );

        FetchReport { dataset, failures }
    }

    async fn fetch_one(
        &self,
        symbol: String,
        anchor_ms: i64,
    ) -> (String, SymbolSeries, Option<FetchError>) {
        let fetcher = HistoryFetcher::new(self.source.as_ref(), &self.config);
        let mut collected = Vec::new();

        let outcome = tokio::time::timeout(
            self.config.symbol_timeout,
            fetcher.fetch_into(&symbol, anchor_ms, &mut collected),
        )
        .await;

        let failure = match outcome {
            Ok(progress) => {
                debug!(
                    symbol = %symbol,
                    pages = progress.pages,
                    rate_limit_waits = progress.rate_limit_waits,
                    "cursor walk finished"
                );
                progress.failure
            }
            Err(_) => {
                let secs = self.config.symbol_timeout.as_secs();
                warn!(
                    symbol = %symbol,
                    timeout_secs = secs,
                    candles = collected.len(),
                    "symbol fetch deadline exceeded, keeping partial data"
                );
                Some(FetchError::Transport(format!("deadline of {secs}s exceeded")))
            }
        };

        let series = fetcher.window(&symbol, anchor_ms, collected);
        if series.is_empty() {
            warn!(symbol = %symbol, "no candles in lookback window");
        } else {
            info!(
                symbol = %symbol,
                candles = series.len(),
                first_open_time = series.first_open_time(),
                last_open_time = series.last_open_time(),
                failed = failure.is_some(),
                "history fetch finished"
            );
        }

        (symbol, series, failure)
    }
}
