//! Fill computation for a pair of compatible orders.
//!
//! ## Algorithm
//!
//! 1. Project each order's remaining make/take amounts from its nominal
//!    amounts and its cumulative fill counter (see
//!    [`Order::remaining`](crate::types::Order::remaining)).
//! 2. Compare cross-products of the remaining amounts, never divide, to
//!    find the binding constraint. If the right order's remaining take
//!    exceeds the left order's remaining make, the left order is the
//!    constraint and fills fully; otherwise the right order (or both, when
//!    the remainders balance exactly) fills fully.
//! 3. The fully-filled side trades at its own declared price; the check that
//!    the counterparty's nominal price covers that amount guarantees the
//!    fill never worsens either order's declared price.
//!
//! All divisions floor. Dust below one unit is absorbed, never rounded up.

use alloy_primitives::U256;

use crate::error::ExchangeError;
use crate::types::math::mul_div_floor;
use crate::types::order::Order;

/// Fill amounts for one match, expressed on the left order's axes.
///
/// `left_value` is the quantity of the left order's make asset moved
/// (equally the right order's take asset); `right_value` is the quantity of
/// the left order's take asset moved (the right order's make asset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillResult {
    /// Amount of left.make / right.take transferred
    pub left_value: U256,
    /// Amount of left.take / right.make transferred
    pub right_value: U256,
}

/// Compute the fill for two compatible orders given their current
/// cumulative fill counters and declared fill bases.
pub fn fill_orders(
    left: &Order,
    right: &Order,
    left_fill: U256,
    right_fill: U256,
    left_is_make_fill: bool,
    right_is_make_fill: bool,
) -> Result<FillResult, ExchangeError> {
    let (left_make, left_take) = left.remaining(left_fill, left_is_make_fill)?;
    let (right_make, right_take) = right.remaining(right_fill, right_is_make_fill)?;

    if right_take > left_make {
        fill_left(
            left_make,
            left_take,
            right.make_asset.value,
            right.take_asset.value,
        )
    } else {
        fill_right(
            left.make_asset.value,
            left.take_asset.value,
            right_make,
            right_take,
        )
    }
}

/// Left order fills fully; the right order's nominal price must cover it.
fn fill_left(
    left_make_rem: U256,
    left_take_rem: U256,
    right_make_nom: U256,
    right_take_nom: U256,
) -> Result<FillResult, ExchangeError> {
    // What the right order would demand back for paying left_take_rem,
    // at its own declared price.
    let right_take = mul_div_floor(left_take_rem, right_take_nom, right_make_nom)?;
    if right_take > left_make_rem {
        return Err(ExchangeError::BadFillLeft);
    }
    Ok(FillResult {
        left_value: left_make_rem,
        right_value: left_take_rem,
    })
}

/// Right order (or both) fills fully; the right order must hold enough of
/// its make asset to pay the left order's declared price.
fn fill_right(
    left_make_nom: U256,
    left_take_nom: U256,
    right_make_rem: U256,
    right_take_rem: U256,
) -> Result<FillResult, ExchangeError> {
    // What the left order charges for right_take_rem of its make asset.
    let maker_value = mul_div_floor(right_take_rem, left_take_nom, left_make_nom)?;
    if maker_value > right_make_rem {
        return Err(ExchangeError::BadFillRight);
    }
    Ok(FillResult {
        left_value: right_take_rem,
        right_value: maker_value,
    })
}

// ============================================================================
// Unit Tests
// ============================================================================
