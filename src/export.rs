// =============================================================================
// Flat-file output — CSV candles per granularity and JSON result files
// =============================================================================
//
// <dir>/<prefix>_<granularity>.csv   timestamp,symbol,open,high,low,close,volume
// <dir>/<prefix>_analysis.json       per-symbol indicator results
// <dir>/<prefix>_updates.json        write-back payloads
//
// JSON files are written atomically (tmp + rename).
// =============================================================================

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat};
use serde::Serialize;
use tracing::info;

use crate::aggregation::AggregatedSeries;
use crate::types::Granularity;

/// Write all symbols' candles at `granularity` into one CSV file.
///
/// Rows are grouped by symbol (alphabetical), then ascending by time.
/// Returns the number of rows written.
pub fn write_granularity_csv(
    path: impl AsRef<Path>,
    aggregated: &BTreeMap<String, AggregatedSeries>,
    granularity: Granularity,
) -> Result<usize> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record(["timestamp", "symbol", "open", "high", "low", "close", "volume"])?;

    let mut rows = 0usize;
    for (symbol, frames) in aggregated {
        let Some(series) = frames.get(&granularity) else {
            continue;
        };
        for candle in &series.candles {
            let timestamp = DateTime::from_timestamp_millis(candle.open_time)
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                .with_context(|| format!("open_time {} out of range", candle.open_time))?;
            writer.write_record([
                timestamp,
                symbol.clone(),
                candle.open.to_string(),
                candle.high.to_string(),
                candle.low.to_string(),
                candle.close.to_string(),
                candle.volume.to_string(),
            ])?;
            rows += 1;
        }
    }

    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;

    info!(path = %path.display(), granularity = %granularity, rows, "candles exported");
    Ok(rows)
}

/// Write every granularity into `<dir>/<prefix>_<granularity>.csv`.
pub fn export_candles(
    dir: impl AsRef<Path>,
    prefix: &str,
    aggregated: &BTreeMap<String, AggregatedSeries>,
    granularities: &[Granularity],
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    granularities
        .iter()
        .map(|&g| {
            let path = dir.join(format!("{prefix}_{}.csv", g.tag()));
            write_granularity_csv(&path, aggregated, g)?;
            Ok(path)
        })
        .collect()
}

/// Serialise `value` as pretty JSON to `path` using an atomic write.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    let content = serde_json::to_string_pretty(value).context("failed to serialise JSON output")?;

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &content)
        .with_context(|| format!("failed to write tmp file {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to rename tmp file to {}", path.display()))?;

    info!(path = %path.display(), "JSON written (atomic)");
    Ok(())
}
