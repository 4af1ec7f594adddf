//! Orchestrator configuration settings and environment variable handling

use alloy::primitives::Address;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;
use crate::{
    errors::{BotError, BotResult},
    execution::ExecutionConfig,
    network::{EndpointPool, GasOracleConfig, RetryConfig, DEFAULT_GAS_API_URL},
    sizing::DEFAULT_SAFETY_FRACTION,
    snapshot::DEFAULT_SNAPSHOT_FILE,
    storage::{DEFAULT_DEPLOYMENT_LOG, DEFAULT_EXECUTIONS_DIR},
    types::{BufferPolicy, NetworkAddresses, NetworkKind},
};

// RPC endpoint variables, in rotation order
pub const RPC_URL_VARS: &[&str] = &[
    "ETH_MAINNET_RPC_URL",
    "OPTIMISM_RPC_URL",
    "ARBITRUM_RPC_URL",
    "SEPOLIA_RPC_URL",
    "FORK_RPC_URL",
];

// Sizing
pub const DEFAULT_BUFFER_FRACTION: Decimal = dec!(0.1);

// Gas
pub const DEFAULT_GAS_PRICE_GWEI: Decimal = dec!(20);
pub const DEFAULT_FLASHLOAN_GAS_LIMIT: u64 = 8_000_000;
pub const DEFAULT_DEPLOY_GAS_LIMIT: u64 = 6_000_000;
pub const DEFAULT_APPROVE_GAS_LIMIT: u64 = 100_000;
pub const DEFAULT_DEPOSIT_GAS_LIMIT: u64 = 200_000;
pub const DEFAULT_WRAP_GAS_LIMIT: u64 = 60_000;

// Confirmation
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 120;
pub const MAX_CONFIRMATION_TIMEOUT_SECS: u64 = 3600;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, Default)]
pub struct AddressOverrides {
    pub weth: Option<String>,
    pub dai: Option<String>,
    pub uniswap_router: Option<String>,
    pub sushiswap_router: Option<String>,
    pub lending_pool_provider: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub network: String,
    /// `(label, url)` pairs; unset or blank entries are dropped when the pool is built.
    pub rpc_urls: Vec<(String, Option<String>)>,
    pub private_key: Option<String>,
    pub account_index: usize,
    // Contract
    pub flashloan_contract: Option<String>,
    pub bytecode_path: Option<PathBuf>,
    pub address_overrides: AddressOverrides,
    // Workflow amounts
    pub deposit_amount_eth: Decimal,
    pub wrap_amount_eth: Decimal,
    // Gas limits
    pub flashloan_gas_limit: u64,
    pub deploy_gas_limit: u64,
    pub approve_gas_limit: u64,
    pub deposit_gas_limit: u64,
    pub wrap_gas_limit: u64,
    // Sizing
    pub sizing_buffer: BufferPolicy,
    pub safety_fraction: Decimal,
    // Gas oracle
    pub default_gas_price_gwei: Decimal,
    pub max_gas_price_gwei: Option<Decimal>,
    pub gas_api_url: Option<String>,
    pub gas_api_units_per_gwei: Decimal,
    pub gas_api_timeout_ms: u64,
    // Execution
    pub min_confirmations: u64,
    pub confirmation_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub max_submission_attempts: Option<u32>,
    // Files
    pub snapshot_file: PathBuf,
    pub deployment_log: PathBuf,
    pub executions_dir: PathBuf,
    /// Settings that were present but unusable.
    pub rejected: Vec<RejectedSetting>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedSetting {
    pub key: String,
    pub value: String,
}

/// Reads trimmed, non-empty variables and records the ones that fail to parse.
struct EnvReader<'a, F> {
    lookup: &'a F,
    rejected: Vec<RejectedSetting>,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<'_, F> {
    fn text(&self, key: &str) -> Option<String> {
        (self.lookup)(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn parsed<T>(&mut self, key: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
        let raw = self.text(key)?;
        let value = parse(&raw);
        if value.is_none() {
            warn!(key, value = %raw, "Ignoring invalid setting, using default");
            self.rejected.push(RejectedSetting { key: key.to_string(), value: raw });
        }
        value
    }

    fn decimal(&mut self, key: &str, valid: impl Fn(&Decimal) -> bool) -> Option<Decimal> {
        self.parsed(key, |raw| Decimal::from_str(raw).ok().filter(|d| valid(d)))
    }

    fn number(&mut self, key: &str, valid: impl Fn(&u64) -> bool) -> Option<u64> {
        self.parsed(key, |raw| raw.parse::<u64>().ok().filter(|n| valid(n)))
    }
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    ///
    /// Values that are set but unusable fall back to their defaults, are logged, and are
    /// kept in `rejected` so `validate` refuses to start with them.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut vars = EnvReader { lookup: &lookup, rejected: Vec::new() };

        let mut config = Self {
            network: vars.text("NETWORK").unwrap_or_else(|| "mainnet-fork".to_string()),
            rpc_urls: rpc_url_entries(&lookup),
            private_key: vars.text("PRIVATE_KEY"),
            account_index: vars.number("ACCOUNT_INDEX", |_| true).unwrap_or(0) as usize,
            flashloan_contract: vars.text("FLASHLOAN_CONTRACT"),
            bytecode_path: vars.text("FLASHLOAN_BYTECODE_PATH").map(PathBuf::from),
            address_overrides: AddressOverrides {
                weth: vars.text("WETH_TOKEN"),
                dai: vars.text("DAI_TOKEN"),
                uniswap_router: vars.text("UNISWAP_ROUTER"),
                sushiswap_router: vars.text("SUSHISWAP_ROUTER"),
                lending_pool_provider: vars.text("LENDING_POOL_PROVIDER"),
            },
            deposit_amount_eth: vars.decimal("DEPOSIT_AMOUNT_ETH", |d| *d > Decimal::ZERO)
                .unwrap_or(dec!(5)),
            wrap_amount_eth: vars.decimal("WRAP_AMOUNT_ETH", |d| !d.is_sign_negative())
                .unwrap_or(dec!(10)),
            flashloan_gas_limit: vars.number("FLASHLOAN_GAS_LIMIT", |n| *n > 0)
                .unwrap_or(DEFAULT_FLASHLOAN_GAS_LIMIT),
            deploy_gas_limit: vars.number("DEPLOY_GAS_LIMIT", |n| *n > 0)
                .unwrap_or(DEFAULT_DEPLOY_GAS_LIMIT),
            approve_gas_limit: vars.number("APPROVE_GAS_LIMIT", |n| *n > 0)
                .unwrap_or(DEFAULT_APPROVE_GAS_LIMIT),
            deposit_gas_limit: vars.number("DEPOSIT_GAS_LIMIT", |n| *n > 0)
                .unwrap_or(DEFAULT_DEPOSIT_GAS_LIMIT),
            wrap_gas_limit: vars.number("WRAP_GAS_LIMIT", |n| *n > 0)
                .unwrap_or(DEFAULT_WRAP_GAS_LIMIT),
            sizing_buffer: vars.parsed("SIZING_BUFFER", parse_buffer)
                .unwrap_or(BufferPolicy::Fraction(DEFAULT_BUFFER_FRACTION)),
            safety_fraction: vars.decimal("SAFETY_FRACTION", |d| *d > Decimal::ZERO && *d <= Decimal::ONE)
                .unwrap_or(DEFAULT_SAFETY_FRACTION),
            default_gas_price_gwei: vars.decimal("DEFAULT_GAS_PRICE_GWEI", |d| *d > Decimal::ZERO)
                .unwrap_or(DEFAULT_GAS_PRICE_GWEI),
            max_gas_price_gwei: vars.decimal("MAX_GAS_PRICE_GWEI", |d| *d > Decimal::ZERO),
            gas_api_url: match vars.text("GAS_API_URL") {
                Some(url) if url.eq_ignore_ascii_case("none") => None,
                Some(url) => Some(url),
                None => Some(DEFAULT_GAS_API_URL.to_string()),
            },
            gas_api_units_per_gwei: vars.decimal("GAS_API_UNITS_PER_GWEI", |d| *d > Decimal::ZERO)
                .unwrap_or(dec!(10)),
            gas_api_timeout_ms: vars.number("GAS_API_TIMEOUT_MS", |n| *n > 0).unwrap_or(3000),
            min_confirmations: vars.number("MIN_CONFIRMATIONS", |n| *n > 0).unwrap_or(1),
            confirmation_timeout_secs: vars
                .number("CONFIRMATION_TIMEOUT_SECS", |n| (1..=MAX_CONFIRMATION_TIMEOUT_SECS).contains(n))
                .unwrap_or(DEFAULT_CONFIRMATION_TIMEOUT_SECS),
            poll_interval_ms: vars.number("POLL_INTERVAL_MS", |n| *n >= 10)
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            max_submission_attempts: vars
                .number("MAX_SUBMISSION_ATTEMPTS", |n| (1..=u32::MAX as u64).contains(n))
                .map(|n| n as u32),
            snapshot_file: vars.text("SNAPSHOT_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_FILE)),
            deployment_log: vars.text("DEPLOYMENT_LOG")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DEPLOYMENT_LOG)),
            executions_dir: vars.text("EXECUTIONS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_EXECUTIONS_DIR)),
            rejected: Vec::new(),
        };
        config.rejected = vars.rejected;
        config
    }

    /// Fails fast on everything the workflow cannot run without.
    pub fn validate(&self) -> BotResult<()> {
        if !self.rejected.is_empty() {
            let keys: Vec<String> = self.rejected.iter().map(|r| format!("{}={:?}", r.key, r.value)).collect();
            return Err(BotError::config(format!("Invalid settings: {}", keys.join(", "))));
        }
        self.endpoint_pool()?;
        self.network_addresses()?;
        self.flashloan_contract_address()?;
        if self.network_kind() == NetworkKind::Live && self.private_key.is_none() {
            return Err(BotError::config(format!(
                "PRIVATE_KEY is required on live network {}", self.network
            )));
        }
        Ok(())
    }

    pub fn network_kind(&self) -> NetworkKind {
        NetworkKind::classify(&self.network)
    }

    pub fn endpoint_pool(&self) -> BotResult<EndpointPool> {
        EndpointPool::from_urls(self.rpc_urls.iter().map(|(label, url)| (label.clone(), url.clone())))
    }

    /// Built-in addresses for the network with overrides applied.
    pub fn network_addresses(&self) -> BotResult<NetworkAddresses> {
        let builtin = NetworkAddresses::builtin(&self.network);
        let o = &self.address_overrides;
        let pick = |name: &str, raw: &Option<String>, fallback: Option<Address>| -> BotResult<Address> {
            match raw {
                Some(raw) => parse_address(name, raw),
                None => fallback.ok_or_else(|| BotError::config(format!(
                    "No {} address mapped for network {}", name, self.network
                ))),
            }
        };

        Ok(NetworkAddresses {
            weth: pick("WETH_TOKEN", &o.weth, builtin.map(|b| b.weth))?,
            dai: pick("DAI_TOKEN", &o.dai, builtin.map(|b| b.dai))?,
            uniswap_router: pick("UNISWAP_ROUTER", &o.uniswap_router, builtin.map(|b| b.uniswap_router))?,
            sushiswap_router: pick("SUSHISWAP_ROUTER", &o.sushiswap_router, builtin.map(|b| b.sushiswap_router))?,
            lending_pool_provider: pick(
                "LENDING_POOL_PROVIDER",
                &o.lending_pool_provider,
                builtin.map(|b| b.lending_pool_provider),
            )?,
        })
    }

    pub fn flashloan_contract_address(&self) -> BotResult<Option<Address>> {
        self.flashloan_contract
            .as_deref()
            .map(|raw| parse_address("FLASHLOAN_CONTRACT", raw))
            .transpose()
    }

    pub fn gas_oracle_config(&self) -> GasOracleConfig {
        GasOracleConfig {
            api_url: self.gas_api_url.clone(),
            api_units_per_gwei: self.gas_api_units_per_gwei,
            api_timeout: Duration::from_millis(self.gas_api_timeout_ms),
            default_gwei: self.default_gas_price_gwei,
            max_gwei: self.max_gas_price_gwei,
        }
    }

    pub fn execution_config(&self) -> ExecutionConfig {
        let defaults = ExecutionConfig::default();
        ExecutionConfig {
            min_confirmations: self.min_confirmations,
            confirmation_timeout: Duration::from_secs(self.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            submission: RetryConfig {
                max_attempts: self.max_submission_attempts.unwrap_or(u32::MAX),
                ..defaults.submission
            },
        }
    }
}

/// `RPC_URLS` (comma separated) wins over the individual variables.
fn rpc_url_entries<F>(lookup: &F) -> Vec<(String, Option<String>)>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(list) = lookup("RPC_URLS").filter(|v| !v.trim().is_empty()) {
        return list
            .split(',')
            .enumerate()
            .map(|(i, url)| (format!("RPC_URLS[{}]", i), Some(url.trim().to_string())))
            .collect();
    }

    RPC_URL_VARS
        .iter()
        .map(|key| (key.to_string(), lookup(key)))
        .collect()
}

/// `"10%"` is a fraction of the balance, a bare number is a flat ETH amount.
pub fn parse_buffer(raw: &str) -> Option<BufferPolicy> {
    let raw = raw.trim();
    if let Some(pct) = raw.strip_suffix('%') {
        let pct = Decimal::from_str(pct.trim()).ok()?;
        if pct.is_sign_negative() {
            return None;
        }
        return Some(BufferPolicy::Fraction(pct / dec!(100)));
    }
    let amount = Decimal::from_str(raw).ok()?;
    if amount.is_sign_negative() {
        return None;
    }
    Some(BufferPolicy::Fixed(amount))
}

fn parse_address(name: &str, raw: &str) -> BotResult<Address> {
    Address::from_str(raw.trim())
        .map_err(|e| BotError::config(format!("Invalid {} address {}: {}", name, raw, e)))
}
