// =============================================================================
// Kline Trends — Main Entry Point
// =============================================================================
//
// One run: resolve symbols, fetch a year of hourly candles per symbol,
// resample to daily/weekly, classify trend and momentum, then write the
// candle CSVs and the JSON result files.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod aggregation;
mod analysis;
mod binance;
mod coingecko;
mod export;
mod indicators;
mod market_data;
mod report;
mod runtime_config;
mod types;
mod watchlist;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::binance::BinanceClient;
use crate::coingecko::CoinGeckoClient;
use crate::market_data::FetchOrchestrator;
use crate::runtime_config::PipelineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Kline Trends — Starting Run                      ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let config_path = std::env::var("KLINE_TRENDS_CONFIG")
        .unwrap_or_else(|_| "pipeline_config.json".to_string());

    let mut config = PipelineConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        let defaults = PipelineConfig::default();
        if !std::path::Path::new(&config_path).exists() {
            // Seed an editable config file for the next run.
            if let Err(e) = defaults.save(&config_path) {
                warn!(error = %e, path = %config_path, "Failed to write default config");
            }
        }
        defaults
    });

    // Override symbols from env if available.
    if let Ok(syms) = std::env::var("KLINE_TRENDS_SYMBOLS") {
        config.override_symbols(&syms);
    }

    // ── 2. Resolve targets ───────────────────────────────────────────────
    let entries = match &config.watchlist_path {
        Some(path) => Some(watchlist::load_watchlist(path)?),
        None => None,
    };

    let (symbols, coin_ids): (Vec<String>, Vec<String>) = match &entries {
        Some(entries) => (
            watchlist::candle_targets(entries)
                .into_iter()
                .map(|t| t.source_symbol)
                .collect(),
            watchlist::market_targets(entries)
                .into_iter()
                .map(|t| t.source_symbol)
                .collect(),
        ),
        None => (config.symbols.clone(), Vec::new()),
    };

    let granularities = config.effective_granularities();
    info!(
        symbols = symbols.len(),
        coins = coin_ids.len(),
        granularities = ?granularities,
        lookback_days = config.lookback_days,
        "Targets resolved"
    );

    // ── 3. Market enrichment (optional) ──────────────────────────────────
    let markets = if coin_ids.is_empty() {
        BTreeMap::new()
    } else {
        let coingecko = CoinGeckoClient::new(config.coingecko_base_url.clone())?;
        coingecko
            .fetch_markets(&coin_ids, &config.vs_currency)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Market enrichment failed, continuing without it");
                BTreeMap::new()
            })
    };

    // ── 4. Fetch candle histories ────────────────────────────────────────
    let binance_client = Arc::new(BinanceClient::new(config.binance_base_url.clone())?);
    let orchestrator = FetchOrchestrator::new(binance_client.clone(), config.fetch_config());

    let anchor_ms = chrono::Utc::now().timestamp_millis();
    let fetch = orchestrator.run(symbols, anchor_ms).await;

    for (symbol, failure) in &fetch.failures {
        error!(symbol = %symbol, error = %failure, "Symbol history incomplete");
    }
    let limits = binance_client.rate_limits().snapshot();
    info!(
        succeeded = fetch.succeeded(),
        failed = fetch.failures.len(),
        requests = limits.requests_sent,
        throttled = limits.throttled_responses,
        used_weight_1m = limits.used_weight_1m,
        "Fetch complete"
    );

    // ── 5. Aggregate & analyse ───────────────────────────────────────────
    let (aggregated, analyses) = analysis::analyze_dataset(&fetch.dataset, &granularities);

    for (symbol, result) in &analyses {
        for (granularity, frame) in &result.frames {
            info!(
                symbol = %symbol,
                granularity = %granularity,
                candles = frame.candles,
                trend = %frame.trend.state,
                momentum = %frame.momentum_overview,
                "Frame classified"
            );
        }
    }

    // ── 6. Outputs ───────────────────────────────────────────────────────
    let out_dir = &config.output_dir;
    let prefix = &config.file_prefix;

    export::export_candles(out_dir, prefix, &aggregated, &granularities)?;
    export::write_json_atomic(out_dir.join(format!("{prefix}_analysis.json")), &analyses)?;

    if let Some(entries) = &entries {
        let updates = report::build_updates(entries, &markets, &analyses);
        export::write_json_atomic(out_dir.join(format!("{prefix}_updates.json")), &updates)?;
        info!(updates = updates.len(), "Write-back payloads prepared");
    }

    info!("Run finished");
    Ok(())
}
