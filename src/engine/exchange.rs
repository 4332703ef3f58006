//! The exchange core: order matching, fill tracking and settlement.
//!
//! ## Match pipeline
//!
//! `match_orders` runs both orders through a fixed pipeline:
//!
//! 1. time-window validation against the call timestamp;
//! 2. taker restriction checks (a non-zero taker pins the counterparty);
//! 3. maker authorization (sender, signature, or contract wallet);
//! 4. order-data parsing;
//! 5. asset-type matching of make-against-take on both diagonals;
//! 6. fill computation from the cumulative fill counters;
//! 7. settlement of both legs through the fee cascade;
//! 8. counter persistence: the advanced counters are committed only once
//!    every transfer and the escrow refund have succeeded, so a failed
//!    settlement leaves the fill state untouched and the match can be
//!    retried.
//!
//! ## Fill counters
//!
//! Counters are keyed by order hash. Each order declares its counting
//! basis (make-side or take-side) in its data; a counter at the nominal
//! basis amount means fully filled, and `U256::MAX` is the cancellation
//! sentinel. Salt-0 orders are ephemeral: their counter always reads
//! zero and is never persisted.

use std::collections::HashMap;

use alloy_primitives::{Address, B256, FixedBytes, U256};
use tracing::{debug, info};

use crate::engine::verify::{OrderVerifier, SignatureValidator};
use crate::error::ExchangeError;
use crate::matching::{fee_side, fill_orders, AssetMatcher, AssetTypeMatcher, FeeSide};
use crate::settlement::{
    resolve_leg_royalties, CashierManager, FeeConfig, NativeEscrow, NativeLedger, NoRoyalties,
    ProtocolFeeProvider, RoyaltiesRegistry, TransferExecutor, TransferProxy,
};
use crate::signature::Eip712Domain;
use crate::types::asset::AssetClass;
use crate::types::order::{Order, OrderDataV1, OrderState};
use crate::types::receipt::{Direction, MatchReceipt};

/// Ambient facts about the settlement call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxContext {
    /// Who submitted the call
    pub sender: Address,
    /// Native currency attached to the call
    pub value: U256,
    /// Current timestamp (seconds)
    pub timestamp: u64,
}

impl TxContext {
    /// A context with no attached native value.
    pub fn new(sender: Address, timestamp: u64) -> Self {
        Self {
            sender,
            value: U256::ZERO,
            timestamp,
        }
    }

    /// Attach native currency to the call.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// The exchange: matching, fill state, settlement and administration.
pub struct Exchange {
    owner: Address,
    fills: HashMap<B256, U256>,
    matcher: AssetMatcher,
    verifier: OrderVerifier,
    config: FeeConfig,
    fee_provider: Option<Box<dyn ProtocolFeeProvider>>,
    royalties_registry: Box<dyn RoyaltiesRegistry>,
    executor: TransferExecutor,
}

impl Exchange {
    /// Create an exchange.
    ///
    /// Starts with no transfer proxies, no contract-wallet validators, no
    /// custom matchers, no fee discounts and an empty royalties registry;
    /// the owner wires those up afterwards.
    pub fn new(
        owner: Address,
        domain: Eip712Domain,
        protocol_fee_bp: u64,
        default_fee_receiver: Address,
        native: Box<dyn NativeLedger>,
    ) -> Self {
        Self {
            owner,
            fills: HashMap::new(),
            matcher: AssetMatcher::new(),
            verifier: OrderVerifier::new(domain),
            config: FeeConfig::new(protocol_fee_bp, default_fee_receiver),
            fee_provider: None,
            royalties_registry: Box::new(NoRoyalties),
            executor: TransferExecutor::new(native),
        }
    }

    /// The signing domain orders must target.
    pub fn domain(&self) -> &Eip712Domain {
        self.verifier.domain()
    }

    /// Current fee configuration.
    pub fn config(&self) -> &FeeConfig {
        &self.config
    }

    // ========================================================================
    // Matching
    // ========================================================================

    /// Match two orders and settle the resulting fill.
    ///
    /// On success the fill counters have advanced, every asset movement has
    /// executed, unspent native value has been refunded to the sender, and
    /// the returned receipt carries the full accounting trail.
    pub fn match_orders(
        &mut self,
        ctx: &TxContext,
        left: &Order,
        left_signature: &[u8],
        right: &Order,
        right_signature: &[u8],
    ) -> Result<MatchReceipt, ExchangeError> {
        left.validate_time(ctx.timestamp)?;
        right.validate_time(ctx.timestamp)?;

        if left.taker != Address::ZERO && left.taker != right.maker {
            return Err(ExchangeError::LeftTakerVerificationFailed);
        }
        if right.taker != Address::ZERO && right.taker != left.maker {
            return Err(ExchangeError::RightTakerVerificationFailed);
        }

        self.verifier.verify(left, left_signature, ctx.sender)?;
        self.verifier.verify(right, right_signature, ctx.sender)?;

        let left_data = OrderDataV1::parse(left.data_type, &left.data)?;
        let right_data = OrderDataV1::parse(right.data_type, &right.data)?;

        let make_match = self
            .matcher
            .match_asset_types(&left.make_asset.asset_type, &right.take_asset.asset_type)?
            .ok_or(ExchangeError::AssetsDontMatch)?;
        let take_match = self
            .matcher
            .match_asset_types(&left.take_asset.asset_type, &right.make_asset.asset_type)?
            .ok_or(ExchangeError::AssetsDontMatch)?;

        let left_key = left.hash_key();
        let right_key = right.hash_key();
        let left_fill = self.filled(left, left_key);
        let right_fill = self.filled(right, right_key);

        let fill = fill_orders(
            left,
            right,
            left_fill,
            right_fill,
            left_data.is_make_fill,
            right_data.is_make_fill,
        )?;
        // A fill that moves nothing on either axis is worthless to one of
        // the makers (floor division can zero one side while the other still
        // transfers), so both values must be positive.
        if fill.left_value.is_zero() || fill.right_value.is_zero() {
            return Err(ExchangeError::NothingToFill);
        }

        // Stage the advanced counters now; they are committed only after
        // every transfer succeeds, so a failed settlement leaves the fill
        // state exactly as it was.
        let new_left_fill = advance(
            left_fill,
            if left_data.is_make_fill {
                fill.left_value
            } else {
                fill.right_value
            },
        )?;
        let new_right_fill = advance(
            right_fill,
            if right_data.is_make_fill {
                fill.right_value
            } else {
                fill.left_value
            },
        )?;

        // Resolve royalties for both legs up front; lazy-mint vouchers get
        // verified here even when the leg ends up fee-free.
        let domain = self.verifier.domain().clone();
        let make_royalties = resolve_leg_royalties(
            &make_match,
            left.maker,
            &left_data,
            self.royalties_registry.as_ref(),
            &domain,
        )?;
        let take_royalties = resolve_leg_royalties(
            &take_match,
            right.maker,
            &right_data,
            self.royalties_registry.as_ref(),
            &domain,
        )?;

        info!(
            left = %left_key,
            right = %right_key,
            left_value = %fill.left_value,
            right_value = %fill.right_value,
            "matched"
        );

        let side = fee_side(make_match.class, take_match.class);
        debug!(?side, "fee side");

        let mut escrow = NativeEscrow::new(ctx.value);
        let mut cashier = CashierManager::new(
            &self.config,
            self.fee_provider.as_deref(),
            &mut self.executor,
            &mut escrow,
        );
        match side {
            FeeSide::Make => {
                cashier.transfer_with_fees(
                    &make_match,
                    fill.left_value,
                    left.maker,
                    &left_data,
                    right.maker,
                    &right_data,
                    &take_royalties,
                    Direction::ToTaker,
                )?;
                cashier.transfer_payouts(
                    &take_match,
                    fill.right_value,
                    right.maker,
                    left.maker,
                    &left_data.payouts,
                    Direction::ToMaker,
                )?;
            }
            FeeSide::Take => {
                cashier.transfer_with_fees(
                    &take_match,
                    fill.right_value,
                    right.maker,
                    &right_data,
                    left.maker,
                    &left_data,
                    &make_royalties,
                    Direction::ToMaker,
                )?;
                cashier.transfer_payouts(
                    &make_match,
                    fill.left_value,
                    left.maker,
                    right.maker,
                    &right_data.payouts,
                    Direction::ToTaker,
                )?;
            }
            FeeSide::None => {
                cashier.transfer_payouts(
                    &make_match,
                    fill.left_value,
                    left.maker,
                    right.maker,
                    &right_data.payouts,
                    Direction::ToTaker,
                )?;
                cashier.transfer_payouts(
                    &take_match,
                    fill.right_value,
                    right.maker,
                    left.maker,
                    &left_data.payouts,
                    Direction::ToMaker,
                )?;
            }
        }
        let events = cashier.into_events();
        self.executor.refund(ctx.sender, &mut escrow)?;

        if left.salt != U256::ZERO {
            self.fills.insert(left_key, new_left_fill);
        }
        if right.salt != U256::ZERO {
            self.fills.insert(right_key, new_right_fill);
        }

        Ok(MatchReceipt {
            left_hash: left_key,
            right_hash: right_key,
            left_fill: new_left_fill,
            right_fill: new_right_fill,
            events,
        })
    }

    // ========================================================================
    // Cancellation and fill state
    // ========================================================================

    /// Cancel an order by pinning its fill counter to the sentinel.
    ///
    /// Only the maker may cancel, and salt-0 orders have nothing persistent
    /// to cancel. Cancelling twice is a no-op.
    pub fn cancel_order(&mut self, sender: Address, order: &Order) -> Result<(), ExchangeError> {
        if order.salt == U256::ZERO {
            return Err(ExchangeError::Salt0CannotBeCancelled);
        }
        if sender != order.maker {
            return Err(ExchangeError::NotOrderMaker);
        }
        let key = order.hash_key();
        self.fills.insert(key, U256::MAX);
        info!(order = %key, maker = %order.maker, "cancelled");
        Ok(())
    }

    /// Cancel a batch of orders. Stops at the first failure.
    pub fn cancel_orders(&mut self, sender: Address, orders: &[Order]) -> Result<(), ExchangeError> {
        for order in orders {
            self.cancel_order(sender, order)?;
        }
        Ok(())
    }

    /// The raw fill counter for an order hash. Zero when never touched.
    pub fn filled_records(&self, key: B256) -> U256 {
        self.fills.get(&key).copied().unwrap_or(U256::ZERO)
    }

    /// Derive an order's lifecycle state from its fill counter.
    pub fn order_state(&self, order: &Order) -> Result<OrderState, ExchangeError> {
        let fill = self.filled(order, order.hash_key());
        if fill == U256::MAX {
            return Ok(OrderState::Cancelled);
        }
        if fill.is_zero() {
            return Ok(OrderState::Unfilled);
        }
        let data = OrderDataV1::parse(order.data_type, &order.data)?;
        if fill >= order.basis_amount(data.is_make_fill) {
            Ok(OrderState::FullyFilled)
        } else {
            Ok(OrderState::PartiallyFilled)
        }
    }

    fn filled(&self, order: &Order, key: B256) -> U256 {
        if order.salt == U256::ZERO {
            U256::ZERO
        } else {
            self.filled_records(key)
        }
    }

    // ========================================================================
    // Administration (owner-gated)
    // ========================================================================

    /// Route protocol fees for one asset to a dedicated receiver.
    pub fn set_fee_receiver(
        &mut self,
        sender: Address,
        asset_key: Address,
        receiver: Address,
    ) -> Result<(), ExchangeError> {
        self.ensure_owner(sender)?;
        self.config.set_fee_receiver(asset_key, receiver);
        Ok(())
    }

    /// Change the default protocol fee rate.
    pub fn set_protocol_fee_bp(&mut self, sender: Address, bp: u64) -> Result<(), ExchangeError> {
        self.ensure_owner(sender)?;
        self.config.set_protocol_fee_bp(bp);
        Ok(())
    }

    /// Change the fallback fee receiver.
    pub fn set_default_fee_receiver(
        &mut self,
        sender: Address,
        receiver: Address,
    ) -> Result<(), ExchangeError> {
        self.ensure_owner(sender)?;
        self.config.set_default_fee_receiver(receiver);
        Ok(())
    }

    /// Swap the royalties registry.
    pub fn set_royalties_registry(
        &mut self,
        sender: Address,
        registry: Box<dyn RoyaltiesRegistry>,
    ) -> Result<(), ExchangeError> {
        self.ensure_owner(sender)?;
        self.royalties_registry = registry;
        Ok(())
    }

    /// Install a per-payer protocol fee discount source.
    pub fn set_protocol_fee_provider(
        &mut self,
        sender: Address,
        provider: Box<dyn ProtocolFeeProvider>,
    ) -> Result<(), ExchangeError> {
        self.ensure_owner(sender)?;
        self.fee_provider = Some(provider);
        Ok(())
    }

    /// Register the transfer proxy responsible for an asset class.
    pub fn set_transfer_proxy(
        &mut self,
        sender: Address,
        class: AssetClass,
        proxy: Box<dyn TransferProxy>,
    ) -> Result<(), ExchangeError> {
        self.ensure_owner(sender)?;
        self.executor.set_proxy(class, proxy);
        Ok(())
    }

    /// Register a matching rule for a custom asset class tag.
    pub fn register_asset_matcher(
        &mut self,
        sender: Address,
        tag: FixedBytes<4>,
        matcher: Box<dyn AssetTypeMatcher>,
    ) -> Result<(), ExchangeError> {
        self.ensure_owner(sender)?;
        self.matcher.register(tag, matcher);
        Ok(())
    }

    /// Register a contract wallet's signature validator.
    pub fn register_signature_validator(
        &mut self,
        sender: Address,
        wallet: Address,
        validator: Box<dyn SignatureValidator>,
    ) -> Result<(), ExchangeError> {
        self.ensure_owner(sender)?;
        self.verifier.register_validator(wallet, validator);
        Ok(())
    }

    fn ensure_owner(&self, sender: Address) -> Result<(), ExchangeError> {
        if sender != self.owner {
            return Err(ExchangeError::NotOwner);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exchange")
            .field("owner", &self.owner)
            .field("tracked_orders", &self.fills.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Advance a fill counter, rejecting wraparound.
fn advance(fill: U256, delta: U256) -> Result<U256, ExchangeError> {
    fill.checked_add(delta).ok_or(ExchangeError::NumericOverflow)
}

// ============================================================================
// Unit Tests
// ============================================================================
