// =============================================================================
// Shared types used across the kline trend scanner
// =============================================================================

use serde::{Deserialize, Serialize};

/// Bucket width of a candle series.
///
/// `Hourly` is the canonical base granularity fetched from the exchange; the
/// coarser ones are derived by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hourly,
    Daily,
    Weekly,
}

impl Granularity {
    /// Lowercase tag used in file names and JSON keys.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    /// Horizon prefix used for the write-back field names.
    pub fn horizon(self) -> &'static str {
        match self {
            Self::Hourly => "Short Term",
            Self::Daily => "Medium Term",
            Self::Weekly => "Long Term",
        }
    }

    pub fn all() -> [Granularity; 3] {
        [Self::Hourly, Self::Daily, Self::Weekly]
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Moving-average trend classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendState {
    Bullish,
    Bearish,
    Range,
    Unknown,
}

impl std::fmt::Display for TrendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "Bullish"),
            Self::Bearish => write!(f, "Bearish"),
            Self::Range => write!(f, "Range"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// RSI zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiState {
    Overbought,
    Oversold,
    Neutral,
    Unknown,
}

impl std::fmt::Display for RsiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overbought => write!(f, "Overbought"),
            Self::Oversold => write!(f, "Oversold"),
            Self::Neutral => write!(f, "Neutral"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// MACD line position relative to its signal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacdState {
    Bullish,
    Bearish,
    Neutral,
    Unknown,
}

impl std::fmt::Display for MacdState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "Bullish"),
            Self::Bearish => write!(f, "Bearish"),
            Self::Neutral => write!(f, "Neutral"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}
