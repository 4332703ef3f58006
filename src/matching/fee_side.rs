//! Fee-side determination.
//!
//! Deductible fees (protocol fee, royalties, origin fees) can only be carved
//! out of a divisible asset, so the cascade is applied to whichever leg of
//! the merged match holds the higher-priority class:
//!
//! ```text
//! native > fungible > semi-fungible > everything else
//! ```
//!
//! The ladder probes the make leg first, so two legs of equal money priority
//! resolve to `Make` by convention. Pure NFT-for-NFT trades, and pairs of
//! classes outside the ladder (bundles, custom classes), carry no deductible
//! fees at all.

use crate::types::asset::AssetClass;

/// Which leg of the merged match the fee cascade applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeSide {
    /// No deductible fees on this trade
    None,
    /// Cascade on the make leg (left maker's outgoing asset)
    Make,
    /// Cascade on the take leg (right maker's outgoing asset)
    Take,
}

/// Decide the fee side for a merged (make, take) class pair.
pub fn fee_side(make: AssetClass, take: AssetClass) -> FeeSide {
    if make == AssetClass::Native {
        return FeeSide::Make;
    }
    if take == AssetClass::Native {
        return FeeSide::Take;
    }
    if make == AssetClass::Erc20 {
        return FeeSide::Make;
    }
    if take == AssetClass::Erc20 {
        return FeeSide::Take;
    }
    if make == AssetClass::Erc1155 {
        return FeeSide::Make;
    }
    if take == AssetClass::Erc1155 {
        return FeeSide::Take;
    }
    FeeSide::None
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::FixedBytes;

    #[test]
    fn test_money_side_carries_fees() {
        assert_eq!(fee_side(AssetClass::Native, AssetClass::Erc721), FeeSide::Make);
        assert_eq!(fee_side(AssetClass::Erc721, AssetClass::Native), FeeSide::Take);
        assert_eq!(fee_side(AssetClass::Erc20, AssetClass::Erc721), FeeSide::Make);
        assert_eq!(fee_side(AssetClass::Erc721, AssetClass::Erc20), FeeSide::Take);
        assert_eq!(fee_side(AssetClass::Erc1155, AssetClass::Erc721), FeeSide::Make);
        assert_eq!(fee_side(AssetClass::Erc721, AssetClass::Erc1155), FeeSide::Take);
    }

    #[test]
    fn test_priority_order() {
        // native beats fungible beats semi-fungible
        assert_eq!(fee_side(AssetClass::Native, AssetClass::Erc20), FeeSide::Make);
        assert_eq!(fee_side(AssetClass::Erc20, AssetClass::Native), FeeSide::Take);
        assert_eq!(fee_side(AssetClass::Erc20, AssetClass::Erc1155), FeeSide::Make);
        assert_eq!(fee_side(AssetClass::Erc1155, AssetClass::Erc20), FeeSide::Take);
    }

    #[test]
    fn test_equal_money_classes_default_to_make() {
        assert_eq!(fee_side(AssetClass::Native, AssetClass::Native), FeeSide::Make);
        assert_eq!(fee_side(AssetClass::Erc20, AssetClass::Erc20), FeeSide::Make);
        assert_eq!(fee_side(AssetClass::Erc1155, AssetClass::Erc1155), FeeSide::Make);
    }

    #[test]
    fn test_nft_for_nft_has_no_fee_side() {
        assert_eq!(fee_side(AssetClass::Erc721, AssetClass::Erc721), FeeSide::None);
        assert_eq!(
            fee_side(AssetClass::Erc721Lazy, AssetClass::Erc721),
            FeeSide::None
        );
    }

    #[test]
    fn test_unrecognized_classes_have_no_fee_side() {
        let custom = AssetClass::Custom(FixedBytes([9, 9, 9, 9]));
        assert_eq!(fee_side(custom, custom), FeeSide::None);
        assert_eq!(fee_side(AssetClass::Bundle, custom), FeeSide::None);
    }
}
