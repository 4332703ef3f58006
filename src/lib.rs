//! # Tideswap
//!
//! Peer-to-peer asset exchange engine with order matching, fee cascades
//! and typed-data order authorization.
//!
//! ## Architecture
//!
//! The exchange consists of:
//! - **Types**: Core data structures (Asset, Order, Part, MatchReceipt)
//! - **Signature**: EIP-712 style domain hashing and signer recovery
//! - **Matching**: Asset-type matching, fee-side selection, fill math
//! - **Settlement**: Transfer proxies, escrow and the fee cascade
//! - **Engine**: The exchange core tying it all together
//!
//! ## Design Principles
//!
//! 1. **Determinism**: All operations produce identical results for identical inputs
//! 2. **Exact Arithmetic**: All splits use U256 floor division, never floats
//! 3. **State Before Transfers**: Fill counters commit before assets move
//! 4. **Pluggable Edges**: Proxies, registries, matchers and validators are traits
//!
//! ## Matching two orders
//!
//! ```
//! use alloy_primitives::{Address, Bytes, U256};
//! use tideswap::types::{Asset, AssetType};
//! use tideswap::types::order::{Order, NO_DATA};
//!
//! let maker = Address::from_slice(&[0x11; 20]);
//! let order = Order::new(
//!     maker,
//!     Asset::new(AssetType::native(), U256::from(1_000u64)),
//!     Address::ZERO,
//!     Asset::new(AssetType::erc20(Address::from_slice(&[0x20; 20])), U256::from(500u64)),
//!     U256::from(1u64),
//!     0,
//!     0,
//!     NO_DATA,
//!     Bytes::new(),
//! );
//! assert_eq!(order.hash(), order.hash_key());
//! ```

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: assets, orders, parts, receipts, exact math
pub mod types;

/// Errors for every rejection the exchange can produce
pub mod error;

/// Typed-data hashing and signature recovery
pub mod signature;

/// Asset matching, fee-side selection and fill computation
pub mod matching;

/// Asset movement and fee distribution
pub mod settlement;

/// The exchange core and order authorization
pub mod engine;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use engine::{Exchange, OrderVerifier, SignatureValidator, TxContext};
pub use error::ExchangeError;
pub use matching::{fee_side, AssetMatcher, AssetTypeMatcher, FeeSide, FillResult};
pub use settlement::{
    CashierManager, FeeConfig, NativeEscrow, NativeLedger, ProtocolFeeProvider,
    RoyaltiesRegistry, TransferExecutor, TransferProxy,
};
pub use signature::Eip712Domain;
pub use types::{
    Asset, AssetClass, AssetType, Direction, MatchReceipt, Order, OrderDataV1, OrderState, Part,
    Purpose, TransferEvent,
};
