// =============================================================================
// Pipeline Configuration — JSON file with per-field defaults and atomic save
// =============================================================================
//
// Every field carries `#[serde(default)]` so that adding new fields never
// breaks loading an older config file.  Persistence uses an atomic tmp +
// rename pattern to prevent corruption on crash.
// =============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::market_data::FetchConfig;
use crate::types::Granularity;
use crate::{binance, coingecko};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbols() -> Vec<String> {
    vec![
        "BTCUSDT".to_string(),
        "ETHUSDT".to_string(),
        "BNBUSDT".to_string(),
        "XRPUSDT".to_string(),
        "SOLUSDT".to_string(),
    ]
}

fn default_interval() -> String {
    "1h".to_string()
}

fn default_page_size() -> u32 {
    1000
}

fn default_lookback_days() -> u32 {
    365
}

fn default_max_concurrency() -> usize {
    8
}

fn default_rate_limit_cooldown_secs() -> u64 {
    60
}

fn default_max_rate_limit_retries() -> u32 {
    5
}

fn default_symbol_timeout_secs() -> u64 {
    900
}

fn default_binance_base_url() -> String {
    binance::client::DEFAULT_BASE_URL.to_string()
}

fn default_coingecko_base_url() -> String {
    coingecko::DEFAULT_BASE_URL.to_string()
}

fn default_vs_currency() -> String {
    "usd".to_string()
}

fn default_granularities() -> Vec<Granularity> {
    Granularity::all().to_vec()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_file_prefix() -> String {
    "crypto_ohlc".to_string()
}

// =============================================================================
// PipelineConfig
// =============================================================================

/// Top-level configuration of one scanner run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    // --- Symbols ------------------------------------------------------------

    /// Exchange symbols to scan when no watch-list is configured.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// JSON export of the watch-list database.  When set, the symbols come
    /// from its OHLC-flagged entries instead of `symbols`.
    #[serde(default)]
    pub watchlist_path: Option<PathBuf>,

    // --- Candle fetch -------------------------------------------------------

    /// Base interval requested from the exchange.
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Candles per page (Binance maximum: 1000).
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Maximum number of symbols fetched at the same time.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Sleep after a 429 before retrying the same page.
    #[serde(default = "default_rate_limit_cooldown_secs")]
    pub rate_limit_cooldown_secs: u64,

    /// Consecutive 429s tolerated on a single page.
    #[serde(default = "default_max_rate_limit_retries")]
    pub max_rate_limit_retries: u32,

    /// Deadline for one symbol's whole history fetch.
    #[serde(default = "default_symbol_timeout_secs")]
    pub symbol_timeout_secs: u64,

    // --- Endpoints ----------------------------------------------------------

    #[serde(default = "default_binance_base_url")]
    pub binance_base_url: String,

    #[serde(default = "default_coingecko_base_url")]
    pub coingecko_base_url: String,

    /// Quote currency for market enrichment.
    #[serde(default = "default_vs_currency")]
    pub vs_currency: String,

    // --- Output -------------------------------------------------------------

    #[serde(default = "default_granularities")]
    pub granularities: Vec<Granularity>,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            watchlist_path: None,
            interval: default_interval(),
            page_size: default_page_size(),
            lookback_days: default_lookback_days(),
            max_concurrency: default_max_concurrency(),
            rate_limit_cooldown_secs: default_rate_limit_cooldown_secs(),
            max_rate_limit_retries: default_max_rate_limit_retries(),
            symbol_timeout_secs: default_symbol_timeout_secs(),
            binance_base_url: default_binance_base_url(),
            coingecko_base_url: default_coingecko_base_url(),
            vs_currency: default_vs_currency(),
            granularities: default_granularities(),
            output_dir: default_output_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pipeline config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse pipeline config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbols = ?config.symbols,
            lookback_days = config.lookback_days,
            "pipeline config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise pipeline config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "pipeline config saved (atomic)");
        Ok(())
    }

    /// Replace `symbols` with a comma-separated list (upper-cased, blanks
    /// dropped).  An empty list leaves the current symbols untouched.
    pub fn override_symbols(&mut self, list: &str) {
        let symbols: Vec<String> = list
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if !symbols.is_empty() {
            self.symbols = symbols;
        }
    }

    /// Fetch parameters shared by every symbol of the run.
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            interval: self.interval.clone(),
            page_size: self.page_size.clamp(1, 1000),
            lookback_days: self.lookback_days,
            rate_limit_cooldown: Duration::from_secs(self.rate_limit_cooldown_secs),
            max_rate_limit_retries: self.max_rate_limit_retries,
            max_concurrency: self.max_concurrency.max(1),
            symbol_timeout: Duration::from_secs(self.symbol_timeout_secs),
        }
    }

    /// Granularities with the hourly base always present, finest first.
    pub fn effective_granularities(&self) -> Vec<Granularity> {
        let mut out = self.granularities.clone();
        out.push(Granularity::Hourly);
        out.sort();
        out.dedup();
        out
    }
}
