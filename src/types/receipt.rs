//! Match receipt and accounting events.
//!
//! Every money/asset movement performed during settlement emits a
//! [`TransferEvent`]: recipient, amount, direction and purpose. Events are
//! informational only (they never influence control flow) but they are the
//! host's accounting trail, so their order matches execution order exactly.

use alloy_primitives::{Address, B256, U256};

use crate::types::asset::AssetType;

/// Which party a movement flows toward, relative to the left order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Asset flowing toward the left order's maker
    ToMaker,
    /// Asset flowing toward the right order's maker (the taker side)
    ToTaker,
}

/// Why a movement happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    /// Protocol fee deduction
    ProtocolFee,
    /// Creator royalty deduction
    Royalty,
    /// Origin (referral) fee deduction
    OriginFee,
    /// Payout to a beneficiary
    Payout,
}

/// One asset movement performed during settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    /// Who received the asset
    pub recipient: Address,
    /// What was moved
    pub asset_type: AssetType,
    /// How much was moved
    pub amount: U256,
    /// Which side of the trade it flowed toward
    pub direction: Direction,
    /// Purpose tag for accounting
    pub purpose: Purpose,
}

/// Summary of one successful `match_orders` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchReceipt {
    /// Hash key of the left order
    pub left_hash: B256,
    /// Hash key of the right order
    pub right_hash: B256,
    /// Left order's new cumulative fill counter (on its declared basis)
    pub left_fill: U256,
    /// Right order's new cumulative fill counter (on its declared basis)
    pub right_fill: U256,
    /// Every movement, in execution order
    pub events: Vec<TransferEvent>,
}

impl MatchReceipt {
    /// Total amount moved to `recipient` for a given purpose.
    ///
    /// Convenience for tests and reconciliation; sums across asset types,
    /// so callers filtering by asset should walk `events` directly.
    pub fn total_for(&self, recipient: Address, purpose: Purpose) -> U256 {
        self.events
            .iter()
            .filter(|ev| ev.recipient == recipient && ev.purpose == purpose)
            .fold(U256::ZERO, |acc, ev| acc + ev.amount)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
