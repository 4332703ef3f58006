//! Order authorization and the exchange core.

/// The exchange: matching pipeline, fill counters, settlement, admin
pub mod exchange;

/// Maker authorization: signatures and contract wallets
pub mod verify;

pub use exchange::{Exchange, TxContext};
pub use verify::{OrderVerifier, SignatureValidator};
