//! The settlement cascade: protocol fee → royalties → origin fees → payouts.
//!
//! ## Ordering and bases
//!
//! For a fee-bearing leg of total amount `T`:
//!
//! 1. **Protocol fee**: `floor(rate * T / 10000)`, rate = the configured
//!    default or a lower payer-specific discount. Routed to the receiver
//!    registered for the asset (native currency keys on the zero address),
//!    falling back to the default receiver.
//! 2. **Royalties**: each part takes `floor(bp * rest / 10000)` where
//!    `rest` is the remainder *after* all prior deductions. Declared basis
//!    points summing over 5000 abort before any movement.
//! 3. **Origin fees**: same running-remainder pattern; the paying order's
//!    list first, then the counterpart's.
//! 4. **Payouts**: the remainder splits over the receiving order's payout
//!    list on a fixed basis, where each beneficiary gets
//!    `floor(rest * bp / 10000)` except the last, which takes the true
//!    residual and thereby absorbs all rounding dust. An empty list pays
//!    100% to the receiving order's maker; a non-empty list must sum to
//!    exactly 10000 bp.
//!
//! Non-fee legs run step 4 only. Every movement emits one accounting event.

use alloy_primitives::{Address, U256};
use tracing::debug;

use crate::error::ExchangeError;
use crate::settlement::config::{FeeConfig, ProtocolFeeProvider};
use crate::settlement::transfer::{NativeEscrow, TransferExecutor};
use crate::types::asset::{total_bp, Asset, AssetType, Part, BP_DENOMINATOR};
use crate::types::math::bp_share;
use crate::types::order::OrderDataV1;
use crate::types::receipt::{Direction, Purpose, TransferEvent};

/// Executes the monetary side of settlement legs and records events.
pub struct CashierManager<'a> {
    config: &'a FeeConfig,
    fee_provider: Option<&'a dyn ProtocolFeeProvider>,
    executor: &'a mut TransferExecutor,
    escrow: &'a mut NativeEscrow,
    events: Vec<TransferEvent>,
}

impl<'a> CashierManager<'a> {
    /// Wire a cashier for one settlement call.
    pub fn new(
        config: &'a FeeConfig,
        fee_provider: Option<&'a dyn ProtocolFeeProvider>,
        executor: &'a mut TransferExecutor,
        escrow: &'a mut NativeEscrow,
    ) -> Self {
        Self {
            config,
            fee_provider,
            executor,
            escrow,
            events: Vec::new(),
        }
    }

    /// The accounting trail, in execution order.
    pub fn into_events(self) -> Vec<TransferEvent> {
        self.events
    }

    /// Run the full cascade over a fee-bearing leg.
    ///
    /// `from` pays the leg; `payer_data` is that order's parsed data;
    /// `receiver_maker`/`receiver_data` belong to the order being paid.
    #[allow(clippy::too_many_arguments)]
    pub fn transfer_with_fees(
        &mut self,
        asset_type: &AssetType,
        amount: U256,
        from: Address,
        payer_data: &OrderDataV1,
        receiver_maker: Address,
        receiver_data: &OrderDataV1,
        royalties: &[Part],
        direction: Direction,
    ) -> Result<(), ExchangeError> {
        // Economic validation first, against declared basis points,
        // independent of realized rounding.
        if total_bp(royalties) > BP_DENOMINATOR / 2 {
            return Err(ExchangeError::RoyaltiesTooHigh);
        }
        validate_payouts(&receiver_data.payouts)?;

        let mut rest = amount;
        rest = self.transfer_protocol_fee(asset_type, rest, from, direction)?;
        rest = self.transfer_fees(asset_type, rest, from, royalties, Purpose::Royalty, direction)?;
        rest = self.transfer_fees(
            asset_type,
            rest,
            from,
            &payer_data.origin_fees,
            Purpose::OriginFee,
            direction,
        )?;
        rest = self.transfer_fees(
            asset_type,
            rest,
            from,
            &receiver_data.origin_fees,
            Purpose::OriginFee,
            direction,
        )?;
        self.payout(asset_type, rest, from, receiver_maker, &receiver_data.payouts, direction)
    }

    /// Run the payout step only (non-fee legs).
    pub fn transfer_payouts(
        &mut self,
        asset_type: &AssetType,
        amount: U256,
        from: Address,
        receiver_maker: Address,
        payouts: &[Part],
        direction: Direction,
    ) -> Result<(), ExchangeError> {
        validate_payouts(payouts)?;
        self.payout(asset_type, amount, from, receiver_maker, payouts, direction)
    }

    fn transfer_protocol_fee(
        &mut self,
        asset_type: &AssetType,
        rest: U256,
        from: Address,
        direction: Direction,
    ) -> Result<U256, ExchangeError> {
        let rate = self.config.effective_fee_bp(from, self.fee_provider);
        let fee = bp_share(rest, rate)?.min(rest);
        if fee.is_zero() {
            return Ok(rest);
        }
        let receiver = self.config.fee_receiver(asset_type.fee_receiver_key());
        debug!(%receiver, %fee, rate, "protocol fee");
        self.transfer(asset_type, fee, from, receiver, direction, Purpose::ProtocolFee)?;
        Ok(rest - fee)
    }

    /// Sequential running-remainder deductions (royalties and origin fees).
    fn transfer_fees(
        &mut self,
        asset_type: &AssetType,
        mut rest: U256,
        from: Address,
        parts: &[Part],
        purpose: Purpose,
        direction: Direction,
    ) -> Result<U256, ExchangeError> {
        for part in parts {
            // Oversized shares clamp to the remainder instead of wrapping.
            let fee = bp_share(rest, part.value)?.min(rest);
            if fee.is_zero() {
                continue;
            }
            self.transfer(asset_type, fee, from, part.account, direction, purpose)?;
            rest -= fee;
        }
        Ok(rest)
    }

    /// Fixed-basis split with the last beneficiary absorbing dust.
    fn payout(
        &mut self,
        asset_type: &AssetType,
        amount: U256,
        from: Address,
        receiver_maker: Address,
        payouts: &[Part],
        direction: Direction,
    ) -> Result<(), ExchangeError> {
        if amount.is_zero() {
            return Ok(());
        }
        if payouts.is_empty() {
            return self.transfer(
                asset_type,
                amount,
                from,
                receiver_maker,
                direction,
                Purpose::Payout,
            );
        }
        let mut distributed = U256::ZERO;
        for (i, part) in payouts.iter().enumerate() {
            let share = if i + 1 == payouts.len() {
                // True residual: amount minus every prior floor.
                amount - distributed
            } else {
                bp_share(amount, part.value)?
            };
            if share.is_zero() {
                continue;
            }
            self.transfer(asset_type, share, from, part.account, direction, Purpose::Payout)?;
            distributed += share;
        }
        Ok(())
    }

    fn transfer(
        &mut self,
        asset_type: &AssetType,
        amount: U256,
        from: Address,
        to: Address,
        direction: Direction,
        purpose: Purpose,
    ) -> Result<(), ExchangeError> {
        let asset = Asset::new(asset_type.clone(), amount);
        self.executor.transfer(&asset, from, to, self.escrow)?;
        self.events.push(TransferEvent {
            recipient: to,
            asset_type: asset_type.clone(),
            amount,
            direction,
            purpose,
        });
        Ok(())
    }
}

/// Non-empty payout lists must declare exactly 100%.
fn validate_payouts(payouts: &[Part]) -> Result<(), ExchangeError> {
    if !payouts.is_empty() && total_bp(payouts) != BP_DENOMINATOR {
        return Err(ExchangeError::PayoutSumNot100);
    }
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::settlement::transfer::NativeLedger;

    #[derive(Default)]
    struct Balances(std::rc::Rc<std::cell::RefCell<HashMap<Address, U256>>>);

    impl NativeLedger for Balances {
        fn push(&mut self, recipient: Address, amount: U256) -> Result<(), ExchangeError> {
            *self.0.borrow_mut().entry(recipient).or_default() += amount;
            Ok(())
        }
    }

    fn addr(byte: u8) -> Address {
        Address::from_slice(&[byte; 20])
    }

    struct Harness {
        config: FeeConfig,
        executor: TransferExecutor,
        balances: std::rc::Rc<std::cell::RefCell<HashMap<Address, U256>>>,
    }

    impl Harness {
        fn new(protocol_fee_bp: u64) -> Self {
            let balances = Balances::default();
            let shared = balances.0.clone();
            Self {
                config: FeeConfig::new(protocol_fee_bp, addr(0xFE)),
                executor: TransferExecutor::new(Box::new(balances)),
                balances: shared,
            }
        }

        fn balance(&self, account: Address) -> U256 {
            self.balances
                .borrow()
                .get(&account)
                .copied()
                .unwrap_or(U256::ZERO)
        }
    }

    fn run_cascade(
        harness: &mut Harness,
        amount: u64,
        payer_data: &OrderDataV1,
        receiver_maker: Address,
        receiver_data: &OrderDataV1,
        royalties: &[Part],
    ) -> Result<Vec<TransferEvent>, ExchangeError> {
        let mut escrow = NativeEscrow::new(U256::from(amount));
        let mut cashier =
            CashierManager::new(&harness.config, None, &mut harness.executor, &mut escrow);
        cashier.transfer_with_fees(
            &AssetType::native(),
            U256::from(amount),
            addr(0xA0),
            payer_data,
            receiver_maker,
            receiver_data,
            royalties,
            Direction::ToTaker,
        )?;
        Ok(cashier.into_events())
    }

    #[test]
    fn test_protocol_fee_then_full_payout() {
        // 300bp of 10000 -> fee 300, remainder 9700.
        let mut harness = Harness::new(300);
        let maker = addr(0x01);
        run_cascade(
            &mut harness,
            10_000,
            &OrderDataV1::default(),
            maker,
            &OrderDataV1::default(),
            &[],
        )
        .unwrap();
        assert_eq!(harness.balance(addr(0xFE)), U256::from(300u64));
        assert_eq!(harness.balance(maker), U256::from(9_700u64));
    }

    #[test]
    fn test_royalties_run_on_running_remainder() {
        // 1000bp then 1000bp: 1000, then floor(1000 * 9000 / 10000) = 900.
        let mut harness = Harness::new(0);
        let maker = addr(0x01);
        let royalties = [Part::new(addr(0x02), 1_000), Part::new(addr(0x03), 1_000)];
        run_cascade(
            &mut harness,
            10_000,
            &OrderDataV1::default(),
            maker,
            &OrderDataV1::default(),
            &royalties,
        )
        .unwrap();
        assert_eq!(harness.balance(addr(0x02)), U256::from(1_000u64));
        assert_eq!(harness.balance(addr(0x03)), U256::from(900u64));
        assert_eq!(harness.balance(maker), U256::from(8_100u64));
    }

    #[test]
    fn test_royalty_cap_checked_before_any_movement() {
        // Declared 5001bp fails, even though realized
        // amounts would be under 50%.
        let mut harness = Harness::new(300);
        let royalties = [Part::new(addr(0x02), 2_501), Part::new(addr(0x03), 2_500)];
        let err = run_cascade(
            &mut harness,
            10_000,
            &OrderDataV1::default(),
            addr(0x01),
            &OrderDataV1::default(),
            &royalties,
        )
        .unwrap_err();
        assert_eq!(err, ExchangeError::RoyaltiesTooHigh);
        // Nothing moved, not even the protocol fee
        assert_eq!(harness.balance(addr(0xFE)), U256::ZERO);
    }

    #[test]
    fn test_origin_fees_from_both_orders() {
        let mut harness = Harness::new(0);
        let maker = addr(0x01);
        let payer_data = OrderDataV1 {
            origin_fees: vec![Part::new(addr(0x04), 1_000)],
            ..Default::default()
        };
        let receiver_data = OrderDataV1 {
            origin_fees: vec![Part::new(addr(0x05), 1_000)],
            ..Default::default()
        };
        run_cascade(&mut harness, 10_000, &payer_data, maker, &receiver_data, &[]).unwrap();
        assert_eq!(harness.balance(addr(0x04)), U256::from(1_000u64));
        assert_eq!(harness.balance(addr(0x05)), U256::from(900u64));
        assert_eq!(harness.balance(maker), U256::from(8_100u64));
    }

    #[test]
    fn test_payout_split_last_absorbs_dust() {
        // 3333/3333/3334 over 100: 33 + 33 + residual 34.
        let mut harness = Harness::new(0);
        let receiver_data = OrderDataV1 {
            payouts: vec![
                Part::new(addr(0x06), 3_333),
                Part::new(addr(0x07), 3_333),
                Part::new(addr(0x08), 3_334),
            ],
            ..Default::default()
        };
        run_cascade(
            &mut harness,
            100,
            &OrderDataV1::default(),
            addr(0x01),
            &receiver_data,
            &[],
        )
        .unwrap();
        assert_eq!(harness.balance(addr(0x06)), U256::from(33u64));
        assert_eq!(harness.balance(addr(0x07)), U256::from(33u64));
        assert_eq!(harness.balance(addr(0x08)), U256::from(34u64));
        assert_eq!(harness.balance(addr(0x01)), U256::ZERO);
    }

    #[test]
    fn test_payout_sum_must_be_100_percent() {
        let mut harness = Harness::new(0);
        let receiver_data = OrderDataV1 {
            payouts: vec![Part::new(addr(0x06), 9_999)],
            ..Default::default()
        };
        let err = run_cascade(
            &mut harness,
            100,
            &OrderDataV1::default(),
            addr(0x01),
            &receiver_data,
            &[],
        )
        .unwrap_err();
        assert_eq!(err, ExchangeError::PayoutSumNot100);
    }

    #[test]
    fn test_event_trail_matches_execution_order() {
        let mut harness = Harness::new(300);
        let maker = addr(0x01);
        let royalties = [Part::new(addr(0x02), 500)];
        let events = run_cascade(
            &mut harness,
            10_000,
            &OrderDataV1::default(),
            maker,
            &OrderDataV1::default(),
            &royalties,
        )
        .unwrap();
        let purposes: Vec<Purpose> = events.iter().map(|ev| ev.purpose).collect();
        assert_eq!(
            purposes,
            vec![Purpose::ProtocolFee, Purpose::Royalty, Purpose::Payout]
        );
        // 10000 - 300 = 9700; royalty floor(9700*500/10000) = 485
        assert_eq!(events[1].amount, U256::from(485u64));
        assert_eq!(events[2].amount, U256::from(9_215u64));
    }
}
