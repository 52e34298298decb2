//! Fixed-point helpers for monetary values.
//!
//! Every value that is persisted or returned goes through [`round_money`], so
//! receipts and payments always carry exactly two decimal places.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{ComputeError, Result};

/// Number of decimal places kept for every monetary value.
pub const MONEY_SCALE: u32 = 2;

/// Exclusive upper bound for stored money: fourteen integer digits, the
/// capacity of a `numeric(16,2)` column.
pub const MAX_MONEY: Decimal = Decimal::from_parts(276447232, 23283, 0, false, 0);

/// Round half away from zero to two decimals and pad the scale, so `20`
/// becomes `20.00`.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Clamp negative values to zero.
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Reject amounts that cannot be remitted. Amounts that round to zero count
/// as zero.
pub fn validate_amount(amount: Decimal) -> Result<Decimal> {
    let rounded = round_money(amount);
    if rounded <= Decimal::ZERO {
        return Err(ComputeError::InvalidAmount(format!(
            "amount must be greater than zero, got {}",
            amount
        )));
    }
    ensure_storable(rounded)
}

/// Reject values a money column cannot hold.
pub fn ensure_storable(value: Decimal) -> Result<Decimal> {
    if value.abs() >= MAX_MONEY {
        return Err(ComputeError::InvalidAmount(format!(
            "amount must be below {}, got {}",
            MAX_MONEY, value
        )));
    }
    Ok(value)
}
