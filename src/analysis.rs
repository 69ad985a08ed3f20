// =============================================================================
// Multi-Timeframe Analysis
// =============================================================================
//
// Runs the trend and momentum classifiers over every granularity of one
// symbol's aggregated series.  A symbol whose fetch failed still gets an entry
// for every granularity, with Unknown states.
// =============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregation::{aggregate, AggregatedSeries};
use crate::indicators::{analyze_momentum, analyze_trend, MomentumResult, TrendResult};
use crate::market_data::{Dataset, SymbolSeries};
use crate::types::Granularity;

/// Indicator results of one symbol at one granularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    pub candles: usize,
    pub trend: TrendResult,
    pub momentum: MomentumResult,
    /// `"RSI: <state> MACD: <state>"`
    pub momentum_overview: String,
}

/// Full snapshot of the analysis for a single symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolAnalysis {
    pub symbol: String,
    pub frames: BTreeMap<Granularity, FrameAnalysis>,
}

impl SymbolAnalysis {
    pub fn frame(&self, granularity: Granularity) -> Option<&FrameAnalysis> {
        self.frames.get(&granularity)
    }
}

pub fn analyze_frame(series: &SymbolSeries) -> FrameAnalysis {
    let closes = series.closes();
    let momentum = analyze_momentum(&closes);
    FrameAnalysis {
        candles: closes.len(),
        trend: analyze_trend(&closes),
        momentum_overview: momentum.overview(),
        momentum,
    }
}

/// Analyse every granularity of one symbol.
pub fn analyze_symbol(symbol: &str, aggregated: &AggregatedSeries) -> SymbolAnalysis {
    let frames: BTreeMap<Granularity, FrameAnalysis> = aggregated
        .iter()
        .map(|(&g, series)| (g, analyze_frame(series)))
        .collect();

    for (g, frame) in &frames {
        debug!(
            symbol,
            granularity = %g,
            candles = frame.candles,
            trend = %frame.trend.state,
            momentum = %frame.momentum_overview,
            "frame analysed"
        );
    }

    SymbolAnalysis {
        symbol: symbol.to_string(),
        frames,
    }
}

/// Aggregate and analyse every symbol of a dataset.
///
/// Returns the aggregated series as well so callers can export them.
pub fn analyze_dataset(
    dataset: &Dataset,
    granularities: &[Granularity],
) -> (BTreeMap<String, AggregatedSeries>, BTreeMap<String, SymbolAnalysis>) {
    let mut aggregated = BTreeMap::new();
    let mut analyses = BTreeMap::new();

    for (symbol, series) in dataset {
        let frames = aggregate(series, granularities);
        analyses.insert(symbol.clone(), analyze_symbol(symbol, &frames));
        aggregated.insert(symbol.clone(), frames);
    }

    (aggregated, analyses)
}
