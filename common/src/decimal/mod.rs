//! Fixed-point helpers for deterministic price arithmetic
//!
//! Prices travel on the wire as scaled integers together with a price
//! precision. They are stored as exact decimals, and every amount derived from
//! them is rounded back to an integer number of base units with banker's
//! rounding so that all replicas agree on the result.

use std::cmp::Ordering;

use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

use crate::error::{Error, Result};

/// Price type with exact precision
pub type Price = Decimal;

/// Quantity of stock, in base units
pub type Quantity = i64;

/// Amount of a token, in base units
pub type Amount = i64;

/// Precision helpers for market prices
pub mod precision {
    /// Smallest price precision a market may use
    pub const MIN_PRICE_PRECISION: u8 = 8;

    /// Largest price precision a market may use
    pub const MAX_PRICE_PRECISION: u8 = 18;

    /// Check a precision against the market bounds
    pub fn is_valid(precision: u8) -> bool {
        (MIN_PRICE_PRECISION..=MAX_PRICE_PRECISION).contains(&precision)
    }
}

/// Convert a scaled integer price into its exact decimal value
pub fn scaled_price(price: i64, price_precision: u8) -> Price {
    Decimal::new(price, u32::from(price_precision))
}

/// Divide with the quotient rounded half to even; `divisor` must be positive
fn div_half_even(numerator: i128, divisor: i128) -> i128 {
    let quotient = numerator / divisor;
    let twice_remainder = (numerator % divisor).unsigned_abs() * 2;
    match twice_remainder.cmp(&divisor.unsigned_abs()) {
        Ordering::Less => quotient,
        Ordering::Greater => quotient + numerator.signum(),
        Ordering::Equal if quotient % 2 == 0 => quotient,
        Ordering::Equal => quotient + numerator.signum(),
    }
}

/// Amount owed for `quantity` units at an exact `price`
///
/// The product is formed exactly on the price's mantissa and then rounded
/// half to even to whole base units.
pub fn obligation(price: Price, quantity: Quantity) -> Result<Amount> {
    let overflow = || Error::InvalidOrder(format!("{} * {} overflows", price, quantity));
    let numerator = price
        .mantissa()
        .checked_mul(i128::from(quantity))
        .ok_or_else(overflow)?;
    let divisor = 10i128.checked_pow(price.scale()).ok_or_else(overflow)?;
    Amount::try_from(div_half_even(numerator, divisor)).map_err(|_| overflow())
}

/// `round(price * quantity / 10^price_precision)` for a scaled integer price
pub fn calculate_amount(price: i64, quantity: Quantity, price_precision: u8) -> Result<Amount> {
    if !precision::is_valid(price_precision) {
        return Err(Error::InvalidPricePrecision(format!(
            "price precision {} not in [{}, {}]",
            price_precision,
            precision::MIN_PRICE_PRECISION,
            precision::MAX_PRICE_PRECISION
        )));
    }
    obligation(scaled_price(price, price_precision), quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_whole_price() {
        // 1.0 at precision 8, ten units
        assert_eq!(calculate_amount(100_000_000, 10, 8).unwrap(), 10);
    }

    #[test]
    fn test_bankers_rounding() {
        // 0.5 rounds to 0, 1.5 and 2.5 both round to 2
        assert_eq!(calculate_amount(50_000_000, 1, 8).unwrap(), 0);
        assert_eq!(calculate_amount(150_000_000, 1, 8).unwrap(), 2);
        assert_eq!(calculate_amount(250_000_000, 1, 8).unwrap(), 2);
        assert_eq!(calculate_amount(250_000_001, 1, 8).unwrap(), 3);
    }

    #[test]
    fn test_rejects_out_of_range_precision() {
        assert!(matches!(
            calculate_amount(1, 1, 7),
            Err(Error::InvalidPricePrecision(_))
        ));
        assert!(matches!(
            calculate_amount(1, 1, 19),
            Err(Error::InvalidPricePrecision(_))
        ));
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert!(matches!(
            calculate_amount(i64::MAX, i64::MAX, 8),
            Err(Error::InvalidOrder(_))
        ));
    }

    #[test]
    fn test_large_product_is_exact() {
        // 127777776670.500000000000000001 lies just above the midpoint
        assert_eq!(
            calculate_amount(1_277_777_766_666_666_667, 100_000_000_003, 18).unwrap(),
            127_777_776_671
        );
        // An exact midpoint far beyond 96 bits still rounds to even
        assert_eq!(
            calculate_amount(1_500_000_000_000_000_000, 100_000_000_001, 18).unwrap(),
            150_000_000_002
        );
    }

    #[test]
    fn test_negative_amounts_round_half_to_even() {
        assert_eq!(obligation(dec!(-2.5), 1).unwrap(), -2);
        assert_eq!(obligation(dec!(-3.5), 1).unwrap(), -4);
        assert_eq!(obligation(dec!(0.5), -3).unwrap(), -2);
    }

    #[test]
    fn test_obligation_ignores_trailing_zeros() {
        assert_eq!(obligation(dec!(0.50), 7).unwrap(), obligation(dec!(0.5), 7).unwrap());
        assert_eq!(obligation(dec!(0.5), 7).unwrap(), 4);
    }

    /// Half-to-even of `price * quantity / 10^precision` in plain integers
    fn reference_amount(price: i64, quantity: i64, precision: u8) -> i128 {
        let numerator = i128::from(price) * i128::from(quantity);
        let divisor = 10i128.pow(u32::from(precision));
        let quotient = numerator / divisor;
        let remainder = numerator % divisor;
        match (remainder * 2).cmp(&divisor) {
            Ordering::Less => quotient,
            Ordering::Greater => quotient + 1,
            Ordering::Equal => quotient + (quotient & 1),
        }
    }

    proptest! {
        #[test]
        fn prop_amount_is_pure(
            price in 1i64..=i64::MAX,
            quantity in 1i64..=i64::MAX,
            precision in 8u8..=18,
        ) {
            let first = calculate_amount(price, quantity, precision);
            let second = calculate_amount(price, quantity, precision);
            let expected = reference_amount(price, quantity, precision);
            match i64::try_from(expected) {
                Ok(expected) => {
                    prop_assert_eq!(first.unwrap(), expected);
                    prop_assert_eq!(second.unwrap(), expected);
                }
                Err(_) => {
                    prop_assert!(matches!(first, Err(Error::InvalidOrder(_))));
                    prop_assert!(matches!(second, Err(Error::InvalidOrder(_))));
                }
            }
        }
    }
}
