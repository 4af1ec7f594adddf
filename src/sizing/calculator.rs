//! Flashloan sizing against wallet balance and gas cost

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use crate::{
    errors::SizingError,
    types::{BufferPolicy, TradeSize, TradeSizeRequest},
    utils::gas_cost_eth,
};

pub const DEFAULT_SAFETY_FRACTION: Decimal = dec!(0.9);

/// `(balance - gas_cost - buffer) * safety_fraction`, all in exact decimal.
///
/// Fails with `InsufficientBalance` unless the usable amount is strictly positive.
pub fn size_trade(request: &TradeSizeRequest) -> Result<TradeSize, SizingError> {
    validate(request)?;

    let balance = request.balance;
    let gas_cost = gas_cost_eth(request.gas_price_wei, request.gas_limit).ok_or(
        SizingError::GasCostOverflow {
            gas_price_wei: request.gas_price_wei,
            gas_limit: request.gas_limit,
        },
    )?;
    let buffer = match request.buffer {
        BufferPolicy::Fixed(amount) => amount,
        BufferPolicy::Fraction(fraction) => balance * fraction,
    };
    let usable = balance - gas_cost - buffer;

    if usable <= Decimal::ZERO {
        return Err(SizingError::InsufficientBalance {
            balance,
            gas_cost,
            buffer,
            usable,
        });
    }

    Ok(TradeSize {
        amount: usable * request.safety_fraction,
        gas_cost,
        buffer,
        usable,
    })
}

fn validate(request: &TradeSizeRequest) -> Result<(), SizingError> {
    if request.balance.is_sign_negative() {
        return Err(SizingError::InvalidParameter { name: "balance", value: request.balance });
    }
    match request.buffer {
        BufferPolicy::Fixed(amount) if amount.is_sign_negative() => {
            return Err(SizingError::InvalidParameter { name: "buffer_amount", value: amount });
        }
        // Fractions of 1 or more fall through to InsufficientBalance
        BufferPolicy::Fraction(f) if f.is_sign_negative() => {
            return Err(SizingError::InvalidParameter { name: "buffer_fraction", value: f });
        }
        _ => {}
    }
    let safety = request.safety_fraction;
    if safety <= Decimal::ZERO || safety > Decimal::ONE {
        return Err(SizingError::InvalidParameter { name: "safety_fraction", value: safety });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(balance: Decimal, gas_gwei: u128, gas_limit: u64, buffer: BufferPolicy) -> TradeSizeRequest {
        TradeSizeRequest {
            balance,
            gas_price_wei: gas_gwei * 1_000_000_000,
            gas_limit,
            buffer,
            safety_fraction: DEFAULT_SAFETY_FRACTION,
        }
    }

    #[test]
    fn sizes_ten_eth_wallet() {
        let size = size_trade(&request(dec!(10), 50, 8_000_000, BufferPolicy::Fraction(dec!(0.1)))).unwrap();
        assert_eq!(size.gas_cost, dec!(0.4));
        assert_eq!(size.buffer, dec!(1.0));
        assert_eq!(size.usable, dec!(8.6));
        assert_eq!(size.amount, dec!(7.74));
    }

    #[test]
    fn fixed_buffer_matches_flat_reserve() {
        let size = size_trade(&request(dec!(1), 20, 6_000_000, BufferPolicy::Fixed(dec!(0.02)))).unwrap();
        // 1 - 0.12 - 0.02 = 0.86
        assert_eq!(size.usable, dec!(0.86));
        assert_eq!(size.amount, dec!(0.774));
    }

    #[test]
    fn exact_zero_usable_is_rejected() {
        // gas 0.4 + buffer 0.6 == balance 1.0
        let err = size_trade(&request(dec!(1), 50, 8_000_000, BufferPolicy::Fixed(dec!(0.6)))).unwrap_err();
        assert!(matches!(err, SizingError::InsufficientBalance { usable, .. } if usable == Decimal::ZERO));
    }

    #[test]
    fn gas_above_balance_is_rejected() {
        let err = size_trade(&request(dec!(0.1), 50, 8_000_000, BufferPolicy::default())).unwrap_err();
        assert!(matches!(err, SizingError::InsufficientBalance { .. }));
    }

    #[test]
    fn whole_balance_buffer_is_insufficient() {
        for fraction in [dec!(1), dec!(1.5)] {
            let err = size_trade(&request(dec!(10), 50, 8_000_000, BufferPolicy::Fraction(fraction))).unwrap_err();
            assert!(
                matches!(err, SizingError::InsufficientBalance { buffer, .. } if buffer == dec!(10) * fraction),
                "fraction {} gave {:?}", fraction, err
            );
        }
    }

    #[test]
    fn oversized_gas_cost_is_an_error_not_a_panic() {
        let err = size_trade(&TradeSizeRequest {
            gas_price_wei: u128::MAX / 2,
            ..request(dec!(10), 1, u64::MAX, BufferPolicy::default())
        })
        .unwrap_err();
        assert!(matches!(err, SizingError::GasCostOverflow { gas_limit: u64::MAX, .. }));
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let mut req = request(dec!(10), 50, 21_000, BufferPolicy::Fraction(dec!(-0.1)));
        assert!(matches!(size_trade(&req), Err(SizingError::InvalidParameter { name: "buffer_fraction", .. })));

        req.buffer = BufferPolicy::Fraction(dec!(0.1));
        req.safety_fraction = dec!(1.5);
        assert!(matches!(size_trade(&req), Err(SizingError::InvalidParameter { name: "safety_fraction", .. })));

        req.safety_fraction = dec!(0.9);
        req.buffer = BufferPolicy::Fixed(dec!(-1));
        assert!(matches!(size_trade(&req), Err(SizingError::InvalidParameter { name: "buffer_amount", .. })));
    }
}
