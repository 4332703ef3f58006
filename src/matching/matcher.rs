//! Asset-type compatibility matching.
//!
//! Two orders are only tradeable if (left make, right take) and
//! (left take, right make) each merge into one canonical asset type.
//!
//! ## Built-in rules
//!
//! - Same known class, byte-identical payload → matched (the left
//!   descriptor is the canonical result)
//! - Same known class, different payload → no match
//! - Different classes → no match
//!
//! The byte-identity rule is deliberately strict for non-fungibles: the
//! royalty snapshot inside an NFT payload participates, so two descriptors
//! of the same token with different snapshots do not trade.
//!
//! ## Custom classes
//!
//! Owner-registered matchers extend the engine per class tag (for example
//! collection-wide matching). They are consulted only when both sides carry
//! the same `Custom` class; an unregistered custom pair fails with
//! "unknown matching rule".

use std::collections::HashMap;

use alloy_primitives::FixedBytes;

use crate::error::ExchangeError;
use crate::types::asset::{AssetClass, AssetType};

/// Extension point: a matching rule for one custom asset class.
pub trait AssetTypeMatcher {
    /// Merge two descriptors of this class, or decline.
    fn match_assets(&self, left: &AssetType, right: &AssetType) -> Option<AssetType>;
}

/// Compatibility matcher with a registry of custom per-class rules.
#[derive(Default)]
pub struct AssetMatcher {
    custom: HashMap<FixedBytes<4>, Box<dyn AssetTypeMatcher>>,
}

impl AssetMatcher {
    /// Create a matcher with only the built-in rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom matcher for a class tag, replacing any previous one.
    pub fn register(&mut self, tag: FixedBytes<4>, matcher: Box<dyn AssetTypeMatcher>) {
        self.custom.insert(tag, matcher);
    }

    /// Decide whether two asset types are tradeable.
    ///
    /// Returns the canonical merged type, `None` for a clean non-match, or
    /// an error when both sides carry an unregistered custom class.
    pub fn match_asset_types(
        &self,
        left: &AssetType,
        right: &AssetType,
    ) -> Result<Option<AssetType>, ExchangeError> {
        if left.class != right.class {
            return Ok(None);
        }
        match left.class {
            AssetClass::Native
            | AssetClass::Erc20
            | AssetClass::Erc721
            | AssetClass::Erc1155
            | AssetClass::Erc721Lazy
            | AssetClass::Erc1155Lazy
            | AssetClass::Bundle => {
                if left.data == right.data {
                    Ok(Some(left.clone()))
                } else {
                    Ok(None)
                }
            }
            AssetClass::Custom(tag) => match self.custom.get(&tag) {
                Some(matcher) => Ok(matcher.match_assets(left, right)),
                None => Err(ExchangeError::UnknownMatchingRule),
            },
        }
    }
}

impl std::fmt::Debug for AssetMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetMatcher")
            .field("custom_classes", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
