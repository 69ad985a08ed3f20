// =============================================================================
// Watch-list schema — typed view of an exported watch-list database
// =============================================================================
//
// The watch-list lives in a third-party database; we consume a JSON export of
// its pages.  Only the properties below are read:
//
//   "Symbol"             title       display symbol (required)
//   "ID API Binance"     rich_text   candle-source symbol, e.g. "BTCUSDT"
//   "ID API Coingecko"   rich_text   market-aggregator id, e.g. "bitcoin"
//   "Watchlist OHLC"     formula     include in the candle pipeline
//   "Watchlist General"  formula     include in market enrichment
//
// A missing inclusion flag means "not included".
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Raw page shape
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub properties: PageProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageProperties {
    #[serde(rename = "Symbol")]
    pub symbol: Option<TextProperty>,
    #[serde(rename = "ID API Binance")]
    pub binance_id: Option<TextProperty>,
    #[serde(rename = "ID API Coingecko")]
    pub coingecko_id: Option<TextProperty>,
    #[serde(rename = "Watchlist OHLC")]
    pub watch_ohlc: Option<FormulaProperty>,
    #[serde(rename = "Watchlist General")]
    pub watch_general: Option<FormulaProperty>,
}

/// Either a `title` or a `rich_text` property: a list of text fragments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextProperty {
    #[serde(default, alias = "rich_text")]
    pub title: Vec<TextFragment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextFragment {
    /// Absent for mention/equation fragments.
    pub text: Option<TextContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormulaProperty {
    pub formula: Option<FormulaValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormulaValue {
    pub boolean: Option<bool>,
}

impl TextProperty {
    /// First fragment's content, trimmed; `None` when absent or blank.
    fn first_text(&self) -> Option<String> {
        self.title
            .first()
            .and_then(|f| f.text.as_ref())
            .map(|t| t.content.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

impl FormulaProperty {
    fn is_true(&self) -> bool {
        self.formula
            .as_ref()
            .and_then(|f| f.boolean)
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Typed entries
// ---------------------------------------------------------------------------

/// One tracked instrument with required and optional fields made explicit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub id: String,
    pub display_symbol: String,
    pub binance_id: Option<String>,
    pub coingecko_id: Option<String>,
    pub watch_ohlc: bool,
    pub watch_general: bool,
}

/// `{id, display_symbol, source_symbol}` tuple handed to a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    pub display_symbol: String,
    pub source_symbol: String,
}

impl WatchlistEntry {
    /// Convert a raw page; `None` when the id or display symbol is missing.
    pub fn from_page(page: &Page) -> Option<Self> {
        if page.id.trim().is_empty() {
            return None;
        }
        let props = &page.properties;
        let display_symbol = props.symbol.as_ref().and_then(TextProperty::first_text)?;

        Some(Self {
            id: page.id.clone(),
            display_symbol,
            binance_id: props.binance_id.as_ref().and_then(TextProperty::first_text),
            coingecko_id: props.coingecko_id.as_ref().and_then(TextProperty::first_text),
            watch_ohlc: props.watch_ohlc.as_ref().is_some_and(FormulaProperty::is_true),
            watch_general: props.watch_general.as_ref().is_some_and(FormulaProperty::is_true),
        })
    }
}

/// Parse a JSON array of pages into entries, skipping unusable pages.
pub fn parse_watchlist(json: &str) -> Result<Vec<WatchlistEntry>> {
    let pages: Vec<Page> = serde_json::from_str(json).context("watch-list is not a JSON array of pages")?;

    let mut entries = Vec::with_capacity(pages.len());
    for page in &pages {
        match WatchlistEntry::from_page(page) {
            Some(entry) => entries.push(entry),
            None => warn!(page_id = %page.id, "watch-list page has no id or display symbol — skipped"),
        }
    }
    Ok(entries)
}

/// Load a watch-list export from disk.
pub fn load_watchlist(path: impl AsRef<Path>) -> Result<Vec<WatchlistEntry>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read watch-list from {}", path.display()))?;
    let entries = parse_watchlist(&content)
        .with_context(|| format!("failed to parse watch-list from {}", path.display()))?;
    info!(path = %path.display(), entries = entries.len(), "watch-list loaded");
    Ok(entries)
}

/// Entries flagged for the candle pipeline that carry a Binance symbol.
pub fn candle_targets(entries: &[WatchlistEntry]) -> Vec<Target> {
    entries
        .iter()
        .filter(|e| e.watch_ohlc)
        .filter_map(|e| {
            Some(Target {
                id: e.id.clone(),
                display_symbol: e.display_symbol.clone(),
                source_symbol: e.binance_id.clone()?,
            })
        })
        .collect()
}

/// Entries flagged for market enrichment that carry a CoinGecko id.
pub fn market_targets(entries: &[WatchlistEntry]) -> Vec<Target> {
    entries
        .iter()
        .filter(|e| e.watch_general)
        .filter_map(|e| {
            Some(Target {
                id: e.id.clone(),
                display_symbol: e.display_symbol.clone(),
                source_symbol: e.coingecko_id.clone()?,
            })
        })
        .collect()
}
