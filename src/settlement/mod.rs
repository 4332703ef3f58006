//! Asset movement and fee distribution.
//!
//! The settlement layer sits below the matching engine: it knows nothing
//! about orders matching, only about moving assets between accounts and
//! splitting amounts according to the fee cascade.

/// The protocol fee → royalties → origin fees → payouts cascade
pub mod cashier;

/// Protocol fee rates and receiver routing
pub mod config;

/// Royalty sources and lazy-mint voucher verification
pub mod royalties;

/// Transfer proxies and the native-currency escrow
pub mod transfer;

pub use cashier::CashierManager;
pub use config::{FeeConfig, ProtocolFeeProvider};
pub use royalties::{resolve_leg_royalties, NoRoyalties, RoyaltiesRegistry};
pub use transfer::{NativeEscrow, NativeLedger, TransferExecutor, TransferProxy};
