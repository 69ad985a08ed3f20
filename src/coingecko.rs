// =============================================================================
// CoinGecko market snapshot — one enrichment call per run
// =============================================================================
//
// GET /api/v3/coins/markets?vs_currency=usd&ids=a,b,c&price_change_percentage=7d,30d
//
// Numeric fields may be null upstream (e.g. no FDV for uncapped supplies), so
// every value is optional.  A failed call is not fatal for the run: the
// caller logs it and continues without enrichment.
// =============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com";

/// Market data for one coin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub id: String,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub fully_diluted_valuation: Option<f64>,
    pub total_volume: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub price_change_percentage_7d_in_currency: Option<f64>,
    pub price_change_percentage_30d_in_currency: Option<f64>,
}

/// Fetches market snapshots from the CoinGecko public API.
pub struct CoinGeckoClient {
    base_url: String,
    client: reqwest::Client,
}

impl CoinGeckoClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("failed to build reqwest client for CoinGeckoClient")?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client that re-uses an existing HTTP client.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Fetch snapshots for `ids`, keyed by coin id.
    #[instrument(skip(self, ids), fields(count = ids.len()), name = "coingecko::fetch_markets")]
    pub async fn fetch_markets(
        &self,
        ids: &[String],
        vs_currency: &str,
    ) -> Result<BTreeMap<String, MarketSnapshot>> {
        if ids.is_empty() {
            return Ok(BTreeMap::new());
        }

        let url = format!("{}/api/v3/coins/markets", self.base_url);
        let per_page = ids.len().to_string();
        let joined = ids.join(",");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("vs_currency", vs_currency),
                ("ids", joined.as_str()),
                ("order", "market_cap_desc"),
                ("per_page", per_page.as_str()),
                ("page", "1"),
                ("price_change_percentage", "7d,30d"),
            ])
            .send()
            .await
            .context("GET /api/v3/coins/markets request failed")?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .context("failed to read coins/markets response")?;

        if !status.is_success() {
            anyhow::bail!("CoinGecko GET /api/v3/coins/markets returned {}: {}", status, body);
        }

        let snapshots = parse_markets(&body)?;
        debug!(count = snapshots.len(), "market snapshots fetched");
        Ok(snapshots)
    }
}

/// Decode a `coins/markets` response body.
pub fn parse_markets(body: &str) -> Result<BTreeMap<String, MarketSnapshot>> {
    let items: Vec<MarketSnapshot> =
        serde_json::from_str(body).context("failed to parse coins/markets response")?;
    Ok(items.into_iter().map(|m| (m.id.clone(), m)).collect())
}
