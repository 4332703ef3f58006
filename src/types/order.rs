//! Order type for the exchange engine.
//!
//! ## Orders are off-chain intents
//!
//! An [`Order`] is a signed statement: "I (`maker`) will give `make_asset`
//! for `take_asset`". Only its hash and cumulative fill/cancellation state
//! persist inside the engine; the order itself travels with each call.
//!
//! ## Canonical hashing
//!
//! `hash()` is an EIP-712 struct hash over every field in wire order
//! (maker, makeAsset, taker, takeAsset, salt, start, end, dataType, data)
//! with nested struct hashes for assets. It is both the signing payload
//! (after domain separation) and the fill-tracking identity: this design
//! uses the same hash for `hash()` and `hash_key()`.
//!
//! ## Fill basis
//!
//! Each order nominates the side (make or take) on which its cumulative
//! fill counter is tracked, via `is_make_fill` in its data payload. The
//! remaining amounts of the *other* side are projected proportionally with
//! floor division.

use std::sync::LazyLock;

use alloy_primitives::{keccak256, Address, Bytes, FixedBytes, B256, U256};

use crate::error::ExchangeError;
use crate::signature::{word_address, word_bytes4, word_u256};
use crate::types::asset::{decode_parts, encode_parts, Asset, Cursor, Part};
use crate::types::math::mul_div_floor;

// ============================================================================
// Data schema selectors
// ============================================================================

/// Selector for the V1 order data schema: first4(keccak256("V1")).
pub static DATA_V1: LazyLock<FixedBytes<4>> =
    LazyLock::new(|| FixedBytes::<4>::from_slice(&keccak256(b"V1")[..4]));

/// Selector for orders carrying no data payload.
pub const NO_DATA: FixedBytes<4> = FixedBytes([0xff, 0xff, 0xff, 0xff]);

// ============================================================================
// Order data (V1 schema)
// ============================================================================

/// Decoded V1 order data.
///
/// Wire layout: payout part list ‖ royalty-override part list ‖ origin-fee
/// part list ‖ fill-basis flag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderDataV1 {
    /// Beneficiaries of this order's incoming leg. Empty = 100% to maker.
    /// Non-empty lists must sum to exactly 10000 bp.
    pub payouts: Vec<Part>,
    /// Lazy-mint only: replaces the voucher's royalty list when non-empty.
    pub royalty_overrides: Vec<Part>,
    /// Referral fees deducted from the fee-bearing leg.
    pub origin_fees: Vec<Part>,
    /// True tracks fills on the make side, false on the take side.
    pub is_make_fill: bool,
}

impl OrderDataV1 {
    /// Encode into the V1 wire payload.
    pub fn encode(&self) -> Bytes {
        let mut buf = Vec::new();
        encode_parts(&mut buf, &self.payouts);
        encode_parts(&mut buf, &self.royalty_overrides);
        encode_parts(&mut buf, &self.origin_fees);
        buf.push(self.is_make_fill as u8);
        Bytes::from(buf)
    }

    /// Decode a V1 wire payload.
    pub fn decode(data: &[u8]) -> Result<Self, ExchangeError> {
        let mut cur = Cursor::new(data);
        let payouts = decode_parts(&mut cur)?;
        let royalty_overrides = decode_parts(&mut cur)?;
        let origin_fees = decode_parts(&mut cur)?;
        let is_make_fill = match cur.u8()? {
            0 => false,
            1 => true,
            _ => return Err(ExchangeError::MalformedAssetData),
        };
        cur.finish()?;
        Ok(Self {
            payouts,
            royalty_overrides,
            origin_fees,
            is_make_fill,
        })
    }

    /// Parse an order's `(data_type, data)` pair.
    ///
    /// The no-data selector yields the empty V1 (take-fill basis, no fees).
    /// Unknown selectors fail with "unsupported order data type".
    pub fn parse(data_type: FixedBytes<4>, data: &[u8]) -> Result<Self, ExchangeError> {
        if data_type == *DATA_V1 {
            Self::decode(data)
        } else if data_type == NO_DATA {
            Ok(Self::default())
        } else {
            Err(ExchangeError::UnsupportedDataType)
        }
    }
}

// ============================================================================
// Order
// ============================================================================

/// A signed trade intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Who makes this offer
    pub maker: Address,
    /// What the maker gives
    pub make_asset: Asset,
    /// Required counterparty; zero = any
    pub taker: Address,
    /// What the maker wants
    pub take_asset: Asset,
    /// Uniqueness nonce. Zero means "sender must equal maker" and the order
    /// has no persistent cancellation.
    pub salt: U256,
    /// Earliest match time (0 = unbounded)
    pub start: u64,
    /// Latest match time (0 = unbounded)
    pub end: u64,
    /// Data schema selector
    pub data_type: FixedBytes<4>,
    /// Encoded data payload
    pub data: Bytes,
}

static ASSET_TYPE_TYPEHASH: LazyLock<B256> =
    LazyLock::new(|| keccak256(b"AssetType(bytes4 assetClass,bytes data)"));

static ASSET_TYPEHASH: LazyLock<B256> = LazyLock::new(|| {
    keccak256(b"Asset(AssetType assetType,uint256 value)AssetType(bytes4 assetClass,bytes data)")
});

static ORDER_TYPEHASH: LazyLock<B256> = LazyLock::new(|| {
    keccak256(
        b"Order(address maker,Asset makeAsset,address taker,Asset takeAsset,uint256 salt,uint256 start,uint256 end,bytes4 dataType,bytes data)Asset(AssetType assetType,uint256 value)AssetType(bytes4 assetClass,bytes data)",
    )
});

/// Struct hash of an asset type.
fn hash_asset_type(asset: &Asset) -> B256 {
    let mut buf = Vec::with_capacity(3 * 32);
    buf.extend_from_slice(ASSET_TYPE_TYPEHASH.as_slice());
    buf.extend_from_slice(&word_bytes4(asset.asset_type.class.tag()));
    buf.extend_from_slice(keccak256(&asset.asset_type.data).as_slice());
    keccak256(&buf)
}

/// Struct hash of an asset.
fn hash_asset(asset: &Asset) -> B256 {
    let mut buf = Vec::with_capacity(3 * 32);
    buf.extend_from_slice(ASSET_TYPEHASH.as_slice());
    buf.extend_from_slice(hash_asset_type(asset).as_slice());
    buf.extend_from_slice(&word_u256(asset.value));
    keccak256(&buf)
}

impl Order {
    /// Create an order.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        maker: Address,
        make_asset: Asset,
        taker: Address,
        take_asset: Asset,
        salt: U256,
        start: u64,
        end: u64,
        data_type: FixedBytes<4>,
        data: Bytes,
    ) -> Self {
        Self {
            maker,
            make_asset,
            taker,
            take_asset,
            salt,
            start,
            end,
            data_type,
            data,
        }
    }

    /// Canonical content hash: a pure, stable function of every field.
    pub fn hash(&self) -> B256 {
        let mut buf = Vec::with_capacity(10 * 32);
        buf.extend_from_slice(ORDER_TYPEHASH.as_slice());
        buf.extend_from_slice(&word_address(self.maker));
        buf.extend_from_slice(hash_asset(&self.make_asset).as_slice());
        buf.extend_from_slice(&word_address(self.taker));
        buf.extend_from_slice(hash_asset(&self.take_asset).as_slice());
        buf.extend_from_slice(&word_u256(self.salt));
        buf.extend_from_slice(&word_u256(U256::from(self.start)));
        buf.extend_from_slice(&word_u256(U256::from(self.end)));
        buf.extend_from_slice(&word_bytes4(self.data_type));
        buf.extend_from_slice(keccak256(&self.data).as_slice());
        keccak256(&buf)
    }

    /// Fill-tracking key. Identical to [`Order::hash`] in this design.
    pub fn hash_key(&self) -> B256 {
        self.hash()
    }

    /// Project remaining (make, take) amounts from the cumulative fill
    /// counter on the declared basis:
    ///
    /// ```text
    /// remaining_other = nominal_other * (nominal_basis - filled) / nominal_basis
    /// ```
    ///
    /// Fails with "fill exceeds order amount" when `filled` exceeds the
    /// nominal basis amount; the cancellation sentinel (`U256::MAX`) always
    /// trips this, which is how matching against a cancelled order fails.
    pub fn remaining(
        &self,
        filled: U256,
        is_make_fill: bool,
    ) -> Result<(U256, U256), ExchangeError> {
        if is_make_fill {
            let make = self
                .make_asset
                .value
                .checked_sub(filled)
                .ok_or(ExchangeError::FillExceedsOrderAmount)?;
            let take = mul_div_floor(self.take_asset.value, make, self.make_asset.value)?;
            Ok((make, take))
        } else {
            let take = self
                .take_asset
                .value
                .checked_sub(filled)
                .ok_or(ExchangeError::FillExceedsOrderAmount)?;
            let make = mul_div_floor(self.make_asset.value, take, self.take_asset.value)?;
            Ok((make, take))
        }
    }

    /// The nominal amount on this order's declared fill basis.
    pub fn basis_amount(&self, is_make_fill: bool) -> U256 {
        if is_make_fill {
            self.make_asset.value
        } else {
            self.take_asset.value
        }
    }

    /// Time-window check, evaluated once at match time.
    pub fn validate_time(&self, now: u64) -> Result<(), ExchangeError> {
        if self.start != 0 && now < self.start {
            return Err(ExchangeError::OrderStartValidationFailed);
        }
        if self.end != 0 && now > self.end {
            return Err(ExchangeError::OrderEndValidationFailed);
        }
        Ok(())
    }
}

/// Derived lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    /// No fill recorded
    Unfilled,
    /// Some fill recorded, below the nominal basis amount
    PartiallyFilled,
    /// Fill counter reached the nominal basis amount (terminal)
    FullyFilled,
    /// Cancellation sentinel recorded (terminal)
    Cancelled,
}

// ============================================================================
// Unit Tests
// ============================================================================
