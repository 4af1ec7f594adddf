//! Best-effort gas price oracle: node first, external API second, fixed default last

use anyhow::{Context, Result};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::time::Duration;
use tracing::{info, warn};
use crate::{
    network::client::ChainClient,
    types::{GasPrice, GasPriceSource},
    utils::{gwei_to_wei, wei_to_gwei},
};

pub const DEFAULT_GAS_API_URL: &str = "https://ethgasstation.info/api/ethgasAPI.json";

#[derive(Debug, Clone)]
pub struct GasOracleConfig {
    /// `None` skips the external source.
    pub api_url: Option<String>,
    /// The API's `fast` field is expressed in 1/`api_units_per_gwei` gwei.
    pub api_units_per_gwei: Decimal,
    pub api_timeout: Duration,
    pub default_gwei: Decimal,
    /// Optional ceiling; `None` passes every resolved price through unchanged.
    pub max_gwei: Option<Decimal>,
}

impl Default for GasOracleConfig {
    fn default() -> Self {
        Self {
            api_url: Some(DEFAULT_GAS_API_URL.to_string()),
            api_units_per_gwei: dec!(10),
            api_timeout: Duration::from_secs(3),
            default_gwei: dec!(20),
            max_gwei: None,
        }
    }
}

pub struct GasPriceOracle {
    config: GasOracleConfig,
    http: reqwest::Client,
}

impl GasPriceOracle {
    pub fn new(config: GasOracleConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.api_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("⚠️ Failed to build gas API HTTP client, using defaults: {}", e);
                reqwest::Client::new()
            });
        Self { config, http }
    }

    /// Never fails: each failed source is logged and the next one is tried.
    pub async fn current_price<C: ChainClient>(&self, client: &C) -> GasPrice {
        let price = match self.from_node(client).await {
            Ok(wei) => GasPrice { wei, source: GasPriceSource::NativeNode },
            Err(e) => {
                warn!(source = "native-node", endpoint = client.endpoint(), "Gas price unavailable: {:#}", e);
                match self.from_external_api().await {
                    Ok(wei) => GasPrice { wei, source: GasPriceSource::ExternalApi },
                    Err(e) => {
                        warn!(source = "external-api", "Gas price unavailable: {:#}", e);
                        self.default_price()
                    }
                }
            }
        };

        let price = self.apply_cap(price);
        info!(
            source = %price.source,
            "⛽ Gas price: {} gwei", wei_to_gwei(price.wei)
        );
        price
    }

    pub fn default_price(&self) -> GasPrice {
        GasPrice {
            wei: gwei_to_wei(self.config.default_gwei).unwrap_or(20_000_000_000),
            source: GasPriceSource::DefaultFallback,
        }
    }

    async fn from_node<C: ChainClient>(&self, client: &C) -> Result<u128> {
        let wei = client.gas_price().await?;
        if wei == 0 {
            anyhow::bail!("node returned a zero gas price");
        }
        Ok(wei)
    }

    async fn from_external_api(&self) -> Result<u128> {
        let url = self.config.api_url.as_deref()
            .ok_or_else(|| anyhow::anyhow!("no external gas API configured"))?;

        let response = self.http.get(url).send().await
            .context("HTTP request failed")?;

        if response.status() != reqwest::StatusCode::OK {
            anyhow::bail!("gas API returned status {}", response.status());
        }

        let json: serde_json::Value = response.json().await
            .context("Failed to parse JSON response")?;

        let fast = parse_fast_field(&json)
            .ok_or_else(|| anyhow::anyhow!("Missing or non-numeric 'fast' field in response"))?;

        if fast <= Decimal::ZERO {
            anyhow::bail!("gas API returned non-positive price {}", fast);
        }
        if self.config.api_units_per_gwei <= Decimal::ZERO {
            anyhow::bail!("invalid API unit divisor {}", self.config.api_units_per_gwei);
        }

        let gwei = fast / self.config.api_units_per_gwei;
        let wei = gwei_to_wei(gwei)
            .ok_or_else(|| anyhow::anyhow!("gas price {} gwei out of range", gwei))?;
        if wei == 0 {
            anyhow::bail!("gas API price {} gwei rounds to zero wei", gwei);
        }
        Ok(wei)
    }

    fn apply_cap(&self, price: GasPrice) -> GasPrice {
        let Some(max_gwei) = self.config.max_gwei else { return price };
        match gwei_to_wei(max_gwei) {
            Some(cap) if cap > 0 && price.wei > cap => {
                warn!(
                    source = %price.source,
                    "Gas price {} gwei above cap, clamping to {} gwei",
                    wei_to_gwei(price.wei), max_gwei
                );
                GasPrice { wei: cap, ..price }
            }
            _ => price,
        }
    }
}

/// Accepts the field as a JSON number or a numeric string.
fn parse_fast_field(json: &serde_json::Value) -> Option<Decimal> {
    match json.get("fast")? {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                n.as_f64().and_then(Decimal::from_f64)
            }
        }
        serde_json::Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_fast_field_variants() {
        assert_eq!(parse_fast_field(&json!({"fast": 300})), Some(dec!(300)));
        assert_eq!(parse_fast_field(&json!({"fast": "250.5"})), Some(dec!(250.5)));
        assert_eq!(parse_fast_field(&json!({"fast": 12.5})), Some(dec!(12.5)));
        assert_eq!(parse_fast_field(&json!({"fast": null})), None);
        assert_eq!(parse_fast_field(&json!({"average": 100})), None);
    }

    #[test]
    fn default_price_is_twenty_gwei() {
        let oracle = GasPriceOracle::new(GasOracleConfig::default());
        let price = oracle.default_price();
        assert_eq!(price.wei, 20_000_000_000);
        assert_eq!(price.source, GasPriceSource::DefaultFallback);
    }

    #[test]
    fn cap_clamps_but_keeps_source() {
        let oracle = GasPriceOracle::new(GasOracleConfig {
            max_gwei: Some(dec!(100)),
            ..Default::default()
        });
        let capped = oracle.apply_cap(GasPrice { wei: 150_000_000_000, source: GasPriceSource::NativeNode });
        assert_eq!(capped.wei, 100_000_000_000);
        assert_eq!(capped.source, GasPriceSource::NativeNode);
    }
}
