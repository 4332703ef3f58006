//! Signature recovery and domain-separated typed-data hashing.
//!
//! ## Signing scheme
//!
//! Orders and lazy-mint vouchers are signed over an EIP-712 style digest:
//!
//! ```text
//! digest = keccak256(0x19 ‖ 0x01 ‖ domain_separator ‖ struct_hash)
//! ```
//!
//! where the domain binds protocol name, version, chain id and the verifying
//! contract address, so a signature is only valid for one deployment.
//!
//! ## Recovery-id normalization
//!
//! Raw 65-byte signatures are `r ‖ s ‖ v`. Wallets encode `v` as either the
//! raw parity `{0, 1}`, the classic `{27, 28}`, or the legacy "+4" extended
//! range `{31, 32}`; the extended range is folded back to the canonical low
//! range before recovery. Anything else is rejected.

use alloy_primitives::{keccak256, Address, FixedBytes, Signature, B256, U256};

use crate::error::ExchangeError;

// ============================================================================
// EIP-712 domain
// ============================================================================

/// Typed-data signing domain.
///
/// One domain per exchange deployment; every order and voucher digest is
/// bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip712Domain {
    /// Protocol name (e.g. "Tideswap")
    pub name: String,
    /// Protocol version string
    pub version: String,
    /// Chain identifier
    pub chain_id: u64,
    /// Address of the verifying exchange deployment
    pub verifying_contract: Address,
}

impl Eip712Domain {
    /// Create a domain.
    pub fn new(name: &str, version: &str, chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            chain_id,
            verifying_contract,
        }
    }

    /// The domain separator hash.
    pub fn separator(&self) -> B256 {
        let typehash = keccak256(
            b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)",
        );
        let mut buf = Vec::with_capacity(5 * 32);
        buf.extend_from_slice(typehash.as_slice());
        buf.extend_from_slice(keccak256(self.name.as_bytes()).as_slice());
        buf.extend_from_slice(keccak256(self.version.as_bytes()).as_slice());
        buf.extend_from_slice(&word_u256(U256::from(self.chain_id)));
        buf.extend_from_slice(&word_address(self.verifying_contract));
        keccak256(&buf)
    }

    /// Domain-separated digest for a struct hash: what actually gets signed.
    pub fn signing_hash(&self, struct_hash: B256) -> B256 {
        let mut buf = Vec::with_capacity(2 + 64);
        buf.extend_from_slice(&[0x19, 0x01]);
        buf.extend_from_slice(self.separator().as_slice());
        buf.extend_from_slice(struct_hash.as_slice());
        keccak256(&buf)
    }
}

impl Default for Eip712Domain {
    fn default() -> Self {
        Self::new("Tideswap", "1", 1, Address::ZERO)
    }
}

// ============================================================================
// Recovery
// ============================================================================

/// Fold a raw recovery id into the odd-y parity bit.
///
/// Accepts `{0, 1}`, `{27, 28}` and the "+4" extended `{31, 32}`.
fn normalize_v(v: u8) -> Result<bool, ExchangeError> {
    match v {
        0 | 27 | 31 => Ok(false),
        1 | 28 | 32 => Ok(true),
        _ => Err(ExchangeError::InvalidRecoveryId),
    }
}

/// Recover the signer address from a 65-byte `r ‖ s ‖ v` signature over a
/// prehashed digest.
pub fn recover(digest: B256, signature: &[u8]) -> Result<Address, ExchangeError> {
    if signature.len() != 65 {
        return Err(ExchangeError::BadOrderSignature);
    }
    let r = U256::from_be_slice(&signature[..32]);
    let s = U256::from_be_slice(&signature[32..64]);
    let parity = normalize_v(signature[64])?;
    Signature::new(r, s, parity)
        .recover_address_from_prehash(&digest)
        .map_err(|_| ExchangeError::BadOrderSignature)
}

// ============================================================================
// Typed-data word encoding
// ============================================================================

/// Left-padded 32-byte word for an address.
pub(crate) fn word_address(addr: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(addr.as_slice());
    word
}

/// Big-endian 32-byte word for a U256.
pub(crate) fn word_u256(value: U256) -> [u8; 32] {
    value.to_be_bytes::<32>()
}

/// Right-padded 32-byte word for a bytes4 selector.
pub(crate) fn word_bytes4(tag: FixedBytes<4>) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[..4].copy_from_slice(tag.as_slice());
    word
}

// ============================================================================
// Unit Tests
// ============================================================================
