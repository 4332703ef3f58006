//! Matching layer: asset-type compatibility, fee-side priority, fill math.
//!
//! These are pure, deterministic decision functions: no state beyond the
//! custom-matcher registry, no I/O. The orchestrator composes them:
//! asset types merge first, then the fee side is decided from the merged
//! classes, then the fill amounts are computed against current counters.

pub mod fee_side;
pub mod fill;
pub mod matcher;

pub use fee_side::{fee_side, FeeSide};
pub use fill::{fill_orders, FillResult};
pub use matcher::{AssetMatcher, AssetTypeMatcher};
