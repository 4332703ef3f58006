//! Exact fixed-point arithmetic for settlement.
//!
//! ## Why integer-only?
//!
//! Every amount the engine computes must be bit-exact across hosts: a single
//! unit of rounding drift is an economic exploit. All rates are basis points
//! (1/10000) applied to `U256` amounts with floor division; leftover dust is
//! absorbed by an explicit residual step downstream, never rounded up here.

use alloy_primitives::U256;

use crate::error::ExchangeError;
use crate::types::asset::BP_DENOMINATOR;

/// `floor(a * b / c)` with overflow and zero-divisor checks.
///
/// The cross-product comparison in fill computation and every proportional
/// share in the fee cascade reduce to this one primitive.
///
/// # Example
///
/// ```
/// use alloy_primitives::U256;
/// use tideswap::types::math::mul_div_floor;
///
/// // 70 * 2000 / 1000 = 140
/// let v = mul_div_floor(U256::from(70u64), U256::from(2000u64), U256::from(1000u64)).unwrap();
/// assert_eq!(v, U256::from(140u64));
/// ```
pub fn mul_div_floor(a: U256, b: U256, c: U256) -> Result<U256, ExchangeError> {
    if c.is_zero() {
        return Err(ExchangeError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(ExchangeError::NumericOverflow)?;
    Ok(product / c)
}

/// `floor(value * bp / 10000)`: a basis-point share of an amount.
///
/// # Example
///
/// ```
/// use alloy_primitives::U256;
/// use tideswap::types::math::bp_share;
///
/// // 300bp of 10000 = 300
/// let fee = bp_share(U256::from(10_000u64), 300).unwrap();
/// assert_eq!(fee, U256::from(300u64));
/// ```
pub fn bp_share(value: U256, bp: u64) -> Result<U256, ExchangeError> {
    mul_div_floor(value, U256::from(bp), U256::from(BP_DENOMINATOR))
}

// ============================================================================
// Unit Tests
// ============================================================================
