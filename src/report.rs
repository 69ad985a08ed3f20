// =============================================================================
// Write-back payloads for the watch-list database
// =============================================================================
//
// For each watch-list entry a property bag keyed by human-readable field
// names is produced:
//
//   numeric  — Price, Market Cap, FDV, Volume 24h, 24h/7d/30d Change %
//   select   — {Short,Medium,Long} Term Trend / Momentum for
//              hourly / daily / weekly, using the classifier labels verbatim
//
// The payloads are written to disk; pushing them to the database is left to
// the caller.
// =============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::analysis::SymbolAnalysis;
use crate::coingecko::MarketSnapshot;
use crate::types::{Granularity, TrendState};
use crate::watchlist::WatchlistEntry;

/// One page update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageUpdate {
    pub page_id: String,
    pub display_symbol: String,
    pub properties: Value,
}

fn number(value: Option<f64>) -> Value {
    json!({ "number": value })
}

fn select(name: &str) -> Value {
    json!({ "select": { "name": name } })
}

/// Build the property bag for one entry; `None` when there is nothing to write.
pub fn build_properties(
    snapshot: Option<&MarketSnapshot>,
    analysis: Option<&SymbolAnalysis>,
) -> Option<Value> {
    let mut props = Map::new();

    if let Some(m) = snapshot {
        props.insert("Price".into(), number(m.current_price));
        props.insert("Market Cap".into(), number(m.market_cap));
        props.insert("FDV".into(), number(m.fully_diluted_valuation));
        props.insert("Volume 24h".into(), number(m.total_volume));
        props.insert("24h Change %".into(), number(m.price_change_percentage_24h));
        props.insert("7d Change %".into(), number(m.price_change_percentage_7d_in_currency));
        props.insert("30d Change %".into(), number(m.price_change_percentage_30d_in_currency));
    }

    if let Some(a) = analysis {
        for g in Granularity::all() {
            let (trend, momentum) = match a.frame(g) {
                Some(frame) => (frame.trend.state.to_string(), frame.momentum_overview.clone()),
                None => (TrendState::Unknown.to_string(), "RSI: Unknown MACD: Unknown".to_string()),
            };
            props.insert(format!("{} Trend", g.horizon()), select(&trend));
            props.insert(format!("{} Momentum", g.horizon()), select(&momentum));
        }
    }

    (!props.is_empty()).then_some(Value::Object(props))
}

/// Build updates for every entry that has market data or an analysis.
pub fn build_updates(
    entries: &[WatchlistEntry],
    markets: &BTreeMap<String, MarketSnapshot>,
    analyses: &BTreeMap<String, SymbolAnalysis>,
) -> Vec<PageUpdate> {
    entries
        .iter()
        .filter_map(|entry| {
            let snapshot = entry
                .coingecko_id
                .as_ref()
                .filter(|_| entry.watch_general)
                .and_then(|id| markets.get(id));
            let analysis = entry
                .binance_id
                .as_ref()
                .filter(|_| entry.watch_ohlc)
                .and_then(|id| analyses.get(id));

            let properties = build_properties(snapshot, analysis)?;
            Some(PageUpdate {
                page_id: entry.id.clone(),
                display_symbol: entry.display_symbol.clone(),
                properties,
            })
        })
        .collect()
}
