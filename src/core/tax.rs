//! IVA arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::AfipError;
use super::tables::{self, IvaCondition};

/// Resolve the IVA `(code, multiplier)` pair for a seller/buyer pair.
pub fn applicable_iva(
    own: IvaCondition,
    buyer: IvaCondition,
) -> Result<(&'static str, Decimal), AfipError> {
    let alic = tables::alic_iva(own, buyer)?;
    Ok((alic.code(), alic.multiplier()))
}

/// IVA amount for `net` at `multiplier`, rounded half-up to cents.
pub fn calculate_iva_sum(net: Decimal, multiplier: Decimal) -> Decimal {
    round_half_up(net * multiplier, 2)
}

pub fn calculate_total(net: Decimal, iva_sum: Decimal) -> Decimal {
    net + iva_sum
}

/// Round a Decimal to `dp` decimal places using half-up (commercial rounding).
pub(crate) fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}
