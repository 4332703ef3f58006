//! Core value types: assets, orders, parts, receipts and exact arithmetic.

/// Asset classes, asset-type descriptors and the payload codec
pub mod asset;

/// Exact U256 basis-point arithmetic
pub mod math;

/// Orders, data schemas, canonical hashing
pub mod order;

/// Match receipts and accounting events
pub mod receipt;

pub use asset::{Asset, AssetClass, AssetType, LazyMintData, NftPayload, Part, BP_DENOMINATOR};
pub use order::{Order, OrderDataV1, OrderState, DATA_V1, NO_DATA};
pub use receipt::{Direction, MatchReceipt, Purpose, TransferEvent};
