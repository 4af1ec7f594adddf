//! Trade sizing inputs

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// How much of the balance is held back before sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BufferPolicy {
    /// Flat amount in ETH.
    Fixed(Decimal),
    /// Fraction of the balance, in `[0, 1)`.
    Fraction(Decimal),
}

impl Default for BufferPolicy {
    fn default() -> Self {
        BufferPolicy::Fraction(dec!(0.1))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TradeSizeRequest {
    /// Wallet balance in ETH.
    pub balance: Decimal,
    pub gas_price_wei: u128,
    pub gas_limit: u64,
    pub buffer: BufferPolicy,
    pub safety_fraction: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeSize {
    pub amount: Decimal,
    pub gas_cost: Decimal,
    pub buffer: Decimal,
    pub usable: Decimal,
}
