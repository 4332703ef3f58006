//! Asset descriptors for the exchange engine.
//!
//! ## Asset classes
//!
//! Every tradeable thing is described by an [`AssetType`]: a 4-byte class
//! discriminant plus an opaque, deterministically-encoded payload whose shape
//! depends on the class:
//!
//! - **Native**: empty payload
//! - **Erc20**: 20-byte contract address
//! - **Erc721 / Erc1155**: contract address, token id, optional royalty
//!   snapshot
//! - **Erc721Lazy / Erc1155Lazy**: full mint voucher (creators, royalties,
//!   creator signatures)
//! - **Bundle**: a list of inner assets settled as one unit
//!
//! ## Determinism
//!
//! Payloads use a fixed-width, length-prefixed binary layout so that equal
//! descriptors are byte-identical. Matching and hashing both rely on this:
//! two non-fungible asset types are tradeable only if their encoded payloads
//! are equal byte for byte.

use std::sync::LazyLock;

use alloy_primitives::{keccak256, Address, Bytes, FixedBytes, U256};

use crate::error::ExchangeError;

/// Basis-point denominator: 10000 = 100%.
pub const BP_DENOMINATOR: u64 = 10_000;

// ============================================================================
// AssetClass
// ============================================================================

static NATIVE_TAG: LazyLock<FixedBytes<4>> = LazyLock::new(|| class_tag(b"ETH"));
static ERC20_TAG: LazyLock<FixedBytes<4>> = LazyLock::new(|| class_tag(b"ERC20"));
static ERC721_TAG: LazyLock<FixedBytes<4>> = LazyLock::new(|| class_tag(b"ERC721"));
static ERC1155_TAG: LazyLock<FixedBytes<4>> = LazyLock::new(|| class_tag(b"ERC1155"));
static ERC721_LAZY_TAG: LazyLock<FixedBytes<4>> = LazyLock::new(|| class_tag(b"ERC721_LAZY"));
static ERC1155_LAZY_TAG: LazyLock<FixedBytes<4>> = LazyLock::new(|| class_tag(b"ERC1155_LAZY"));
static BUNDLE_TAG: LazyLock<FixedBytes<4>> = LazyLock::new(|| class_tag(b"BUNDLE"));

/// First four bytes of keccak256 of the canonical class label.
fn class_tag(label: &[u8]) -> FixedBytes<4> {
    FixedBytes::<4>::from_slice(&keccak256(label)[..4])
}

/// Asset class discriminant.
///
/// A closed tagged union of the classes the engine knows how to settle,
/// plus `Custom` for owner-registered extension classes (matched only
/// through a registered matcher, transferred only through a registered
/// proxy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetClass {
    /// Native currency of the host environment
    Native,
    /// Fungible token contract
    Erc20,
    /// Non-fungible token
    Erc721,
    /// Semi-fungible token
    Erc1155,
    /// Lazily-minted non-fungible token (mint voucher embedded)
    Erc721Lazy,
    /// Lazily-minted semi-fungible token
    Erc1155Lazy,
    /// Multi-asset package settled as a unit
    Bundle,
    /// Owner-registered extension class, identified by its raw tag
    Custom(FixedBytes<4>),
}

impl AssetClass {
    /// The 4-byte wire discriminant for this class.
    ///
    /// Known classes derive their tag from the keccak256 of their label,
    /// e.g. `keccak256("ERC20")[..4]`.
    pub fn tag(&self) -> FixedBytes<4> {
        match self {
            AssetClass::Native => *NATIVE_TAG,
            AssetClass::Erc20 => *ERC20_TAG,
            AssetClass::Erc721 => *ERC721_TAG,
            AssetClass::Erc1155 => *ERC1155_TAG,
            AssetClass::Erc721Lazy => *ERC721_LAZY_TAG,
            AssetClass::Erc1155Lazy => *ERC1155_LAZY_TAG,
            AssetClass::Bundle => *BUNDLE_TAG,
            AssetClass::Custom(tag) => *tag,
        }
    }

    /// Map a 4-byte wire discriminant back to a class.
    ///
    /// Unknown tags become `Custom`; nothing is rejected here because the
    /// matcher decides whether a custom class is actually tradeable.
    pub fn from_tag(tag: FixedBytes<4>) -> Self {
        match tag {
            t if t == *NATIVE_TAG => AssetClass::Native,
            t if t == *ERC20_TAG => AssetClass::Erc20,
            t if t == *ERC721_TAG => AssetClass::Erc721,
            t if t == *ERC1155_TAG => AssetClass::Erc1155,
            t if t == *ERC721_LAZY_TAG => AssetClass::Erc721Lazy,
            t if t == *ERC1155_LAZY_TAG => AssetClass::Erc1155Lazy,
            t if t == *BUNDLE_TAG => AssetClass::Bundle,
            t => AssetClass::Custom(t),
        }
    }

    /// True for the two lazy-mint classes.
    pub fn is_lazy(&self) -> bool {
        matches!(self, AssetClass::Erc721Lazy | AssetClass::Erc1155Lazy)
    }
}

// ============================================================================
// Part
// ============================================================================

/// A beneficiary share expressed in basis points (10000 = 100%).
///
/// Used for payouts, royalties, origin fees and lazy-mint creators alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    /// Beneficiary address
    pub account: Address,
    /// Share in basis points
    pub value: u64,
}

impl Part {
    /// Create a part.
    pub fn new(account: Address, value: u64) -> Self {
        Self { account, value }
    }
}

/// Sum of declared basis points over a part list.
///
/// Saturating: a declared sum near `u64::MAX` must still trip the
/// economic-validation caps rather than wrap.
pub fn total_bp(parts: &[Part]) -> u64 {
    parts.iter().fold(0u64, |acc, p| acc.saturating_add(p.value))
}

// ============================================================================
// AssetType / Asset
// ============================================================================

/// An asset-type descriptor: class discriminant plus encoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetType {
    /// Class discriminant
    pub class: AssetClass,
    /// Class-specific encoded payload
    pub data: Bytes,
}

/// A concrete amount of some asset type.
///
/// `value` is a quantity for fungible and semi-fungible classes and 1 for
/// single non-fungible units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// What is being moved
    pub asset_type: AssetType,
    /// How much of it
    pub value: U256,
}

impl Asset {
    /// Create an asset.
    pub fn new(asset_type: AssetType, value: U256) -> Self {
        Self { asset_type, value }
    }
}

/// Decoded ERC721/ERC1155 payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftPayload {
    /// Token contract
    pub token: Address,
    /// Token id
    pub token_id: U256,
    /// Embedded royalty snapshot (may be empty)
    pub royalties: Vec<Part>,
}

/// Decoded lazy-mint payload: the mint voucher.
///
/// The minter address is embedded as the high 160 bits of `token_id`;
/// settlement verifies it equals the order maker providing the asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyMintData {
    /// Collection contract the token will be minted into
    pub contract: Address,
    /// Token id, prefixed with the minter address
    pub token_id: U256,
    /// Creators and their shares
    pub creators: Vec<Part>,
    /// Creator-declared royalties
    pub royalties: Vec<Part>,
    /// One signature slot per creator (empty bytes = unsigned slot)
    pub signatures: Vec<Bytes>,
}

impl LazyMintData {
    /// The minter address carried in the high 160 bits of the token id.
    pub fn minter(&self) -> Address {
        let bytes = self.token_id.to_be_bytes::<32>();
        Address::from_slice(&bytes[..20])
    }
}

impl AssetType {
    /// Native-currency asset type (empty payload).
    pub fn native() -> Self {
        Self {
            class: AssetClass::Native,
            data: Bytes::new(),
        }
    }

    /// Fungible token asset type.
    pub fn erc20(token: Address) -> Self {
        Self {
            class: AssetClass::Erc20,
            data: Bytes::from(token.to_vec()),
        }
    }

    /// Non-fungible token asset type without a royalty snapshot.
    pub fn erc721(token: Address, token_id: U256) -> Self {
        Self::nft(AssetClass::Erc721, token, token_id, &[])
    }

    /// Semi-fungible token asset type without a royalty snapshot.
    pub fn erc1155(token: Address, token_id: U256) -> Self {
        Self::nft(AssetClass::Erc1155, token, token_id, &[])
    }

    /// Non-fungible or semi-fungible asset type with an embedded royalty
    /// snapshot. The snapshot participates in matching byte-identity.
    pub fn nft(class: AssetClass, token: Address, token_id: U256, royalties: &[Part]) -> Self {
        let mut buf = Vec::with_capacity(54 + royalties.len() * 28);
        buf.extend_from_slice(token.as_slice());
        buf.extend_from_slice(&token_id.to_be_bytes::<32>());
        encode_parts(&mut buf, royalties);
        Self {
            class,
            data: Bytes::from(buf),
        }
    }

    /// Lazy-mint asset type carrying a full mint voucher.
    pub fn lazy(class: AssetClass, voucher: &LazyMintData) -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(voucher.contract.as_slice());
        buf.extend_from_slice(&voucher.token_id.to_be_bytes::<32>());
        encode_parts(&mut buf, &voucher.creators);
        encode_parts(&mut buf, &voucher.royalties);
        buf.extend_from_slice(&(voucher.signatures.len() as u16).to_be_bytes());
        for sig in &voucher.signatures {
            buf.extend_from_slice(&(sig.len() as u16).to_be_bytes());
            buf.extend_from_slice(sig);
        }
        Self {
            class,
            data: Bytes::from(buf),
        }
    }

    /// Multi-asset bundle settled as one unit.
    pub fn bundle(assets: &[Asset]) -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(assets.len() as u16).to_be_bytes());
        for asset in assets {
            buf.extend_from_slice(asset.asset_type.class.tag().as_slice());
            buf.extend_from_slice(&(asset.asset_type.data.len() as u32).to_be_bytes());
            buf.extend_from_slice(&asset.asset_type.data);
            buf.extend_from_slice(&asset.value.to_be_bytes::<32>());
        }
        Self {
            class: AssetClass::Bundle,
            data: Bytes::from(buf),
        }
    }

    /// Extension asset type with a raw tag and opaque payload.
    pub fn custom(tag: FixedBytes<4>, data: Bytes) -> Self {
        Self {
            class: AssetClass::Custom(tag),
            data,
        }
    }

    /// Decode an `Erc20` payload: the token contract address.
    pub fn decode_token(&self) -> Result<Address, ExchangeError> {
        let mut cur = Cursor::new(&self.data);
        let token = cur.address()?;
        cur.finish()?;
        Ok(token)
    }

    /// Decode an `Erc721`/`Erc1155` payload.
    pub fn decode_nft(&self) -> Result<NftPayload, ExchangeError> {
        let mut cur = Cursor::new(&self.data);
        let token = cur.address()?;
        let token_id = cur.u256()?;
        let royalties = decode_parts(&mut cur)?;
        cur.finish()?;
        Ok(NftPayload {
            token,
            token_id,
            royalties,
        })
    }

    /// Decode a lazy-mint payload into its voucher.
    pub fn decode_lazy(&self) -> Result<LazyMintData, ExchangeError> {
        let mut cur = Cursor::new(&self.data);
        let contract = cur.address()?;
        let token_id = cur.u256()?;
        let creators = decode_parts(&mut cur)?;
        let royalties = decode_parts(&mut cur)?;
        let count = cur.u16()? as usize;
        let mut signatures = Vec::with_capacity(count);
        for _ in 0..count {
            let len = cur.u16()? as usize;
            signatures.push(Bytes::copy_from_slice(cur.take(len)?));
        }
        cur.finish()?;
        Ok(LazyMintData {
            contract,
            token_id,
            creators,
            royalties,
            signatures,
        })
    }

    /// Decode a bundle payload into its inner assets.
    pub fn decode_bundle(&self) -> Result<Vec<Asset>, ExchangeError> {
        let mut cur = Cursor::new(&self.data);
        let count = cur.u16()? as usize;
        let mut assets = Vec::with_capacity(count);
        for _ in 0..count {
            let tag = FixedBytes::<4>::from_slice(cur.take(4)?);
            let len = cur.u32()? as usize;
            let data = Bytes::copy_from_slice(cur.take(len)?);
            let value = cur.u256()?;
            assets.push(Asset::new(
                AssetType {
                    class: AssetClass::from_tag(tag),
                    data,
                },
                value,
            ));
        }
        cur.finish()?;
        Ok(assets)
    }

    /// Key into the per-asset fee-receiver table.
    ///
    /// Native currency uses the distinguished zero-address key. Classes
    /// without a single underlying contract (bundles, custom) have no key
    /// and always fall back to the default receiver.
    pub fn fee_receiver_key(&self) -> Option<Address> {
        match self.class {
            AssetClass::Native => Some(Address::ZERO),
            AssetClass::Erc20 => self.decode_token().ok(),
            AssetClass::Erc721 | AssetClass::Erc1155 => {
                self.decode_nft().ok().map(|nft| nft.token)
            }
            AssetClass::Erc721Lazy | AssetClass::Erc1155Lazy => {
                self.decode_lazy().ok().map(|lazy| lazy.contract)
            }
            AssetClass::Bundle | AssetClass::Custom(_) => None,
        }
    }
}

// ============================================================================
// Payload codec
// ============================================================================

/// Bounds-checked reader over an encoded payload.
pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8], ExchangeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or(ExchangeError::MalformedAssetData)?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, ExchangeError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16, ExchangeError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, ExchangeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(crate) fn u64(&mut self) -> Result<u64, ExchangeError> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(raw))
    }

    pub(crate) fn address(&mut self) -> Result<Address, ExchangeError> {
        Ok(Address::from_slice(self.take(20)?))
    }

    pub(crate) fn u256(&mut self) -> Result<U256, ExchangeError> {
        Ok(U256::from_be_slice(self.take(32)?))
    }

    /// Trailing bytes after a complete decode are malformed input.
    pub(crate) fn finish(self) -> Result<(), ExchangeError> {
        if self.pos == self.buf.len() {
            Ok(())
        } else {
            Err(ExchangeError::MalformedAssetData)
        }
    }
}

/// Append a u16-count-prefixed part list: each entry address ‖ u64-BE bp.
pub(crate) fn encode_parts(buf: &mut Vec<u8>, parts: &[Part]) {
    buf.extend_from_slice(&(parts.len() as u16).to_be_bytes());
    for part in parts {
        buf.extend_from_slice(part.account.as_slice());
        buf.extend_from_slice(&part.value.to_be_bytes());
    }
}

/// Read a part list written by [`encode_parts`].
pub(crate) fn decode_parts(cur: &mut Cursor<'_>) -> Result<Vec<Part>, ExchangeError> {
    let count = cur.u16()? as usize;
    let mut parts = Vec::with_capacity(count);
    for _ in 0..count {
        let account = cur.address()?;
        let value = cur.u64()?;
        parts.push(Part { account, value });
    }
    Ok(parts)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_slice(&[byte; 20])
    }

    #[test]
    fn test_class_tags_are_distinct() {
        let classes = [
            AssetClass::Native,
            AssetClass::Erc20,
            AssetClass::Erc721,
            AssetClass::Erc1155,
            AssetClass::Erc721Lazy,
            AssetClass::Erc1155Lazy,
            AssetClass::Bundle,
        ];
        for (i, a) in classes.iter().enumerate() {
            for b in &classes[i + 1..] {
                assert_ne!(a.tag(), b.tag());
            }
        }
    }

    #[test]
    fn test_native_tag_value() {
        // keccak256("ETH")[..4], the conventional native-currency tag
        assert_eq!(
            AssetClass::Native.tag().as_slice(),
            &keccak256(b"ETH")[..4]
        );
    }

    #[test]
    fn test_class_tags_match_known_vectors() {
        // Wire discriminants are frozen; counterparties encode against these
        // exact 4-byte values, so any drift here is a breaking change.
        for (class, tag_hex) in [
            (AssetClass::Native, "aaaebeba"),
            (AssetClass::Erc20, "8ae85d84"),
            (AssetClass::Erc721, "73ad2146"),
            (AssetClass::Erc1155, "973bb640"),
            (AssetClass::Erc721Lazy, "d8f960c1"),
            (AssetClass::Erc1155Lazy, "1cdfaa40"),
            (AssetClass::Bundle, "89b6dfe5"),
        ] {
            assert_eq!(
                class.tag().as_slice(),
                hex::decode(tag_hex).unwrap(),
                "tag drifted for {class:?}"
            );
        }
    }

    #[test]
    fn test_tag_roundtrip() {
        for class in [
            AssetClass::Native,
            AssetClass::Erc20,
            AssetClass::Erc721,
            AssetClass::Erc1155,
            AssetClass::Erc721Lazy,
            AssetClass::Erc1155Lazy,
            AssetClass::Bundle,
            AssetClass::Custom(FixedBytes([0xde, 0xad, 0xbe, 0xef])),
        ] {
            assert_eq!(AssetClass::from_tag(class.tag()), class);
        }
    }

    #[test]
    fn test_erc20_payload() {
        let token = addr(0x11);
        let ty = AssetType::erc20(token);
        assert_eq!(ty.decode_token().unwrap(), token);
        assert_eq!(ty.data.len(), 20);
    }

    #[test]
    fn test_nft_payload_roundtrip() {
        let royalties = vec![Part::new(addr(0x22), 500), Part::new(addr(0x33), 250)];
        let ty = AssetType::nft(AssetClass::Erc721, addr(0x11), U256::from(42u64), &royalties);
        let nft = ty.decode_nft().unwrap();
        assert_eq!(nft.token, addr(0x11));
        assert_eq!(nft.token_id, U256::from(42u64));
        assert_eq!(nft.royalties, royalties);
    }

    #[test]
    fn test_nft_payload_byte_identity() {
        // Same fields, same bytes; different snapshot, different bytes.
        let a = AssetType::nft(AssetClass::Erc721, addr(1), U256::from(7u64), &[]);
        let b = AssetType::nft(AssetClass::Erc721, addr(1), U256::from(7u64), &[]);
        let c = AssetType::nft(
            AssetClass::Erc721,
            addr(1),
            U256::from(7u64),
            &[Part::new(addr(2), 100)],
        );
        assert_eq!(a.data, b.data);
        assert_ne!(a.data, c.data);
    }

    #[test]
    fn test_lazy_payload_roundtrip() {
        let minter = addr(0x44);
        let mut id_bytes = [0u8; 32];
        id_bytes[..20].copy_from_slice(minter.as_slice());
        id_bytes[31] = 1;
        let voucher = LazyMintData {
            contract: addr(0x55),
            token_id: U256::from_be_slice(&id_bytes),
            creators: vec![Part::new(minter, 10_000)],
            royalties: vec![Part::new(addr(0x66), 1_000)],
            signatures: vec![Bytes::new(), Bytes::from(vec![1u8; 65])],
        };
        let ty = AssetType::lazy(AssetClass::Erc721Lazy, &voucher);
        let decoded = ty.decode_lazy().unwrap();
        assert_eq!(decoded, voucher);
        assert_eq!(decoded.minter(), minter);
    }

    #[test]
    fn test_bundle_payload_roundtrip() {
        let assets = vec![
            Asset::new(AssetType::erc721(addr(1), U256::from(1u64)), U256::from(1u64)),
            Asset::new(AssetType::erc20(addr(2)), U256::from(500u64)),
        ];
        let ty = AssetType::bundle(&assets);
        assert_eq!(ty.decode_bundle().unwrap(), assets);
    }

    #[test]
    fn test_truncated_payload_is_malformed() {
        let ty = AssetType {
            class: AssetClass::Erc721,
            data: Bytes::from(vec![0u8; 10]),
        };
        assert_eq!(ty.decode_nft(), Err(ExchangeError::MalformedAssetData));
    }

    #[test]
    fn test_trailing_bytes_are_malformed() {
        let mut buf = addr(1).to_vec();
        buf.push(0xFF);
        let ty = AssetType {
            class: AssetClass::Erc20,
            data: Bytes::from(buf),
        };
        assert_eq!(ty.decode_token(), Err(ExchangeError::MalformedAssetData));
    }

    #[test]
    fn test_fee_receiver_key() {
        assert_eq!(AssetType::native().fee_receiver_key(), Some(Address::ZERO));
        assert_eq!(AssetType::erc20(addr(9)).fee_receiver_key(), Some(addr(9)));
        assert_eq!(
            AssetType::erc1155(addr(8), U256::from(1u64)).fee_receiver_key(),
            Some(addr(8))
        );
        assert_eq!(AssetType::bundle(&[]).fee_receiver_key(), None);
    }

    #[test]
    fn test_total_bp_saturates() {
        let parts = vec![Part::new(addr(1), u64::MAX), Part::new(addr(2), 10)];
        assert_eq!(total_bp(&parts), u64::MAX);
    }
}
