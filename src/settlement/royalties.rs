//! Royalty resolution and lazy-mint voucher verification.
//!
//! ## Resolution order, per leg
//!
//! - Lazy-mint asset: the voucher's royalty list, after the voucher itself
//!   is verified; a non-empty `royalty_overrides` list in the providing
//!   order's data replaces it.
//! - Non-fungible / semi-fungible asset: the royalty snapshot embedded in
//!   the payload if present, else a registry lookup by contract address and
//!   token id.
//! - Money legs, bundles, custom classes: no royalties.
//!
//! ## Voucher verification
//!
//! A lazy-mint token id carries its minter as the high 160 bits. The order
//! maker providing the asset must be that minter ("from not minter"), and
//! every other creator must have signed the domain-separated mint hash.

use std::sync::LazyLock;

use alloy_primitives::{keccak256, Address, B256, U256};

use crate::error::ExchangeError;
use crate::signature::{self, word_address, word_u256, Eip712Domain};
use crate::types::asset::{AssetClass, AssetType, LazyMintData, Part};
use crate::types::order::OrderDataV1;

/// Collaborator resolving creator royalties for a token contract.
///
/// Implementations may keep per-contract defaults with token-id-specific
/// overrides; the engine only sees the final list.
pub trait RoyaltiesRegistry {
    /// Royalty parts for a token, empty when none are declared.
    fn royalties(&self, token: Address, token_id: U256) -> Vec<Part>;
}

/// Registry that knows no royalties.
#[derive(Debug, Default)]
pub struct NoRoyalties;

impl RoyaltiesRegistry for NoRoyalties {
    fn royalties(&self, _token: Address, _token_id: U256) -> Vec<Part> {
        Vec::new()
    }
}

// ============================================================================
// Mint voucher hashing
// ============================================================================

static PART_TYPEHASH: LazyLock<B256> =
    LazyLock::new(|| keccak256(b"Part(address account,uint64 value)"));

static MINT_TYPEHASH: LazyLock<B256> = LazyLock::new(|| {
    keccak256(
        b"Mint(address tokenContract,uint256 tokenId,Part[] creators,Part[] royalties)Part(address account,uint64 value)",
    )
});

fn hash_part(part: &Part) -> B256 {
    let mut buf = Vec::with_capacity(3 * 32);
    buf.extend_from_slice(PART_TYPEHASH.as_slice());
    buf.extend_from_slice(&word_address(part.account));
    buf.extend_from_slice(&word_u256(U256::from(part.value)));
    keccak256(&buf)
}

fn hash_parts(parts: &[Part]) -> B256 {
    let mut buf = Vec::with_capacity(parts.len() * 32);
    for part in parts {
        buf.extend_from_slice(hash_part(part).as_slice());
    }
    keccak256(&buf)
}

/// Struct hash of a mint voucher, signed by its creators.
pub fn mint_hash(voucher: &LazyMintData) -> B256 {
    let mut buf = Vec::with_capacity(5 * 32);
    buf.extend_from_slice(MINT_TYPEHASH.as_slice());
    buf.extend_from_slice(&word_address(voucher.contract));
    buf.extend_from_slice(&word_u256(voucher.token_id));
    buf.extend_from_slice(hash_parts(&voucher.creators).as_slice());
    buf.extend_from_slice(hash_parts(&voucher.royalties).as_slice());
    keccak256(&buf)
}

/// Verify a lazy-mint voucher against the order maker providing the asset.
///
/// `from` must be the minter embedded in the token id. Creators equal to
/// `from` authorize by making the order; every other creator's signature
/// slot must recover that creator over the domain-separated mint hash.
pub fn verify_voucher(
    voucher: &LazyMintData,
    from: Address,
    domain: &Eip712Domain,
) -> Result<(), ExchangeError> {
    if voucher.minter() != from {
        return Err(ExchangeError::FromNotMinter);
    }
    let digest = domain.signing_hash(mint_hash(voucher));
    for (i, creator) in voucher.creators.iter().enumerate() {
        if creator.account == from {
            continue;
        }
        let sig = voucher
            .signatures
            .get(i)
            .ok_or(ExchangeError::IncorrectSignature)?;
        let recovered = signature::recover(digest, sig)
            .map_err(|_| ExchangeError::IncorrectSignature)?;
        if recovered != creator.account {
            return Err(ExchangeError::IncorrectSignature);
        }
    }
    Ok(())
}

// ============================================================================
// Per-leg resolution
// ============================================================================

/// Resolve the royalty parts for one settlement leg.
///
/// `provider` is the maker giving this asset away; `provider_data` is that
/// order's parsed data. Lazy assets are voucher-verified here, whether or
/// not any royalties end up being charged.
pub fn resolve_leg_royalties(
    asset_type: &AssetType,
    provider: Address,
    provider_data: &OrderDataV1,
    registry: &dyn RoyaltiesRegistry,
    domain: &Eip712Domain,
) -> Result<Vec<Part>, ExchangeError> {
    match asset_type.class {
        AssetClass::Erc721 | AssetClass::Erc1155 => {
            let nft = asset_type.decode_nft()?;
            if nft.royalties.is_empty() {
                Ok(registry.royalties(nft.token, nft.token_id))
            } else {
                Ok(nft.royalties)
            }
        }
        AssetClass::Erc721Lazy | AssetClass::Erc1155Lazy => {
            let voucher = asset_type.decode_lazy()?;
            verify_voucher(&voucher, provider, domain)?;
            if provider_data.royalty_overrides.is_empty() {
                Ok(voucher.royalties)
            } else {
                Ok(provider_data.royalty_overrides.clone())
            }
        }
        _ => Ok(Vec::new()),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Bytes;
    use k256::ecdsa::SigningKey;

    fn addr(byte: u8) -> Address {
        Address::from_slice(&[byte; 20])
    }

    fn key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32].into()).expect("valid key bytes")
    }

    fn key_addr(k: &SigningKey) -> Address {
        Address::from_public_key(k.verifying_key())
    }

    fn token_id_for(minter: Address, index: u8) -> U256 {
        let mut bytes = [0u8; 32];
        bytes[..20].copy_from_slice(minter.as_slice());
        bytes[31] = index;
        U256::from_be_slice(&bytes)
    }

    fn sign_voucher(k: &SigningKey, voucher: &LazyMintData, domain: &Eip712Domain) -> Bytes {
        let digest = domain.signing_hash(mint_hash(voucher));
        let (sig, recid) = k
            .sign_prehash_recoverable(digest.as_slice())
            .expect("signing succeeds");
        let mut raw = sig.to_bytes().to_vec();
        raw.push(27 + recid.to_byte());
        Bytes::from(raw)
    }

    #[test]
    fn test_voucher_minter_check() {
        let minter = addr(0x10);
        let voucher = LazyMintData {
            contract: addr(1),
            token_id: token_id_for(minter, 1),
            creators: vec![Part::new(minter, 10_000)],
            royalties: vec![],
            signatures: vec![Bytes::new()],
        };
        let domain = Eip712Domain::default();
        assert!(verify_voucher(&voucher, minter, &domain).is_ok());
        assert_eq!(
            verify_voucher(&voucher, addr(0x11), &domain),
            Err(ExchangeError::FromNotMinter)
        );
    }

    #[test]
    fn test_voucher_co_creator_signature() {
        let domain = Eip712Domain::default();
        let co_key = key(3);
        let minter = addr(0x10);
        let co_creator = key_addr(&co_key);

        let mut voucher = LazyMintData {
            contract: addr(1),
            token_id: token_id_for(minter, 1),
            creators: vec![Part::new(minter, 5_000), Part::new(co_creator, 5_000)],
            royalties: vec![Part::new(co_creator, 1_000)],
            signatures: vec![Bytes::new(), Bytes::new()],
        };

        // Missing co-creator signature
        assert_eq!(
            verify_voucher(&voucher, minter, &domain),
            Err(ExchangeError::IncorrectSignature)
        );

        voucher.signatures[1] = sign_voucher(&co_key, &voucher, &domain);
        assert!(verify_voucher(&voucher, minter, &domain).is_ok());

        // Signature over a different voucher does not transfer
        let mut tampered = voucher.clone();
        tampered.royalties[0].value = 2_000;
        assert_eq!(
            verify_voucher(&tampered, minter, &domain),
            Err(ExchangeError::IncorrectSignature)
        );
    }

    #[test]
    fn test_resolve_embedded_snapshot_wins_over_registry() {
        struct FixedRegistry;
        impl RoyaltiesRegistry for FixedRegistry {
            fn royalties(&self, _token: Address, _token_id: U256) -> Vec<Part> {
                vec![Part::new(Address::from_slice(&[9u8; 20]), 700)]
            }
        }

        let domain = Eip712Domain::default();
        let data = OrderDataV1::default();

        let snapshot = vec![Part::new(addr(2), 500)];
        let with_snapshot =
            AssetType::nft(AssetClass::Erc721, addr(1), U256::from(1u64), &snapshot);
        assert_eq!(
            resolve_leg_royalties(&with_snapshot, addr(3), &data, &FixedRegistry, &domain)
                .unwrap(),
            snapshot
        );

        let plain = AssetType::erc721(addr(1), U256::from(1u64));
        assert_eq!(
            resolve_leg_royalties(&plain, addr(3), &data, &FixedRegistry, &domain).unwrap(),
            vec![Part::new(addr(9), 700)]
        );
    }

    #[test]
    fn test_resolve_lazy_honors_overrides() {
        let domain = Eip712Domain::default();
        let minter = addr(0x10);
        let voucher = LazyMintData {
            contract: addr(1),
            token_id: token_id_for(minter, 2),
            creators: vec![Part::new(minter, 10_000)],
            royalties: vec![Part::new(addr(7), 900)],
            signatures: vec![Bytes::new()],
        };
        let ty = AssetType::lazy(AssetClass::Erc721Lazy, &voucher);

        let plain_data = OrderDataV1::default();
        assert_eq!(
            resolve_leg_royalties(&ty, minter, &plain_data, &NoRoyalties, &domain).unwrap(),
            voucher.royalties
        );

        let override_data = OrderDataV1 {
            royalty_overrides: vec![Part::new(addr(8), 100)],
            ..Default::default()
        };
        assert_eq!(
            resolve_leg_royalties(&ty, minter, &override_data, &NoRoyalties, &domain).unwrap(),
            override_data.royalty_overrides
        );
    }

    #[test]
    fn test_money_legs_have_no_royalties() {
        let domain = Eip712Domain::default();
        let data = OrderDataV1::default();
        for ty in [AssetType::native(), AssetType::erc20(addr(1))] {
            assert!(resolve_leg_royalties(&ty, addr(3), &data, &NoRoyalties, &domain)
                .unwrap()
                .is_empty());
        }
    }
}
