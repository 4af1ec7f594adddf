//! Unit conversion helpers between wei and decimal ETH

use alloy::primitives::U256;
use anyhow::{Context, Result};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::str::FromStr;

pub const WEI_PER_GWEI: u128 = 1_000_000_000;

const WEI_PER_GWEI_DEC: Decimal = dec!(1_000_000_000);
const WEI_PER_ETH: Decimal = dec!(1_000_000_000_000_000_000);

pub fn wei_to_eth(wei: U256) -> Result<Decimal> {
    let raw = Decimal::from_str(&wei.to_string())
        .with_context(|| format!("wei amount {} exceeds decimal range", wei))?;
    Ok(raw / WEI_PER_ETH)
}

/// Truncates below one wei.
pub fn eth_to_wei(eth: Decimal) -> Result<U256> {
    if eth.is_sign_negative() {
        anyhow::bail!("negative ETH amount {}", eth);
    }
    let wei = eth
        .checked_mul(WEI_PER_ETH)
        .with_context(|| format!("ETH amount {} overflows wei", eth))?
        .trunc();
    let wei = wei
        .to_u128()
        .with_context(|| format!("ETH amount {} does not fit in u128 wei", eth))?;
    Ok(U256::from(wei))
}

pub fn gwei_to_wei(gwei: Decimal) -> Option<u128> {
    gwei.checked_mul(WEI_PER_GWEI_DEC)?.trunc().to_u128()
}

pub fn wei_to_gwei(wei: u128) -> Decimal {
    Decimal::from(wei) / WEI_PER_GWEI_DEC
}

/// Gas cost in ETH for `gas_limit` units at `gas_price_wei`; `None` past the decimal range.
pub fn gas_cost_eth(gas_price_wei: u128, gas_limit: u64) -> Option<Decimal> {
    Decimal::from_u128(gas_price_wei)?
        .checked_mul(Decimal::from(gas_limit))?
        .checked_div(WEI_PER_ETH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_between_wei_and_eth() {
        let wei = U256::from(1_500_000_000_000_000_000u128);
        assert_eq!(wei_to_eth(wei).unwrap(), dec!(1.5));
        assert_eq!(eth_to_wei(dec!(1.5)).unwrap(), wei);
    }

    #[test]
    fn eth_to_wei_rejects_negative() {
        assert!(eth_to_wei(dec!(-0.1)).is_err());
    }

    #[test]
    fn gas_cost_is_exact() {
        assert_eq!(gas_cost_eth(50 * WEI_PER_GWEI, 8_000_000), Some(dec!(0.4)));
        assert_eq!(gwei_to_wei(dec!(20)), Some(20 * WEI_PER_GWEI));
        assert_eq!(wei_to_gwei(30 * WEI_PER_GWEI), dec!(30));
    }

    #[test]
    fn gas_cost_overflow_is_reported() {
        assert_eq!(gas_cost_eth(u128::MAX / 2, u64::MAX), None);
        assert_eq!(gwei_to_wei(Decimal::MAX), None);
    }
}
