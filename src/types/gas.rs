//! Gas price types

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GasPriceSource {
    NativeNode,
    ExternalApi,
    DefaultFallback,
}

impl fmt::Display for GasPriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            GasPriceSource::NativeNode => "native-node",
            GasPriceSource::ExternalApi => "external-api",
            GasPriceSource::DefaultFallback => "default-fallback",
        };
        f.write_str(tag)
    }
}

/// Positive gas price in wei, tagged with where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GasPrice {
    pub wei: u128,
    pub source: GasPriceSource,
}
