//! Order authorization.
//!
//! An order is authorized for settlement when one of these holds:
//!
//! - its salt is zero: only the maker themselves may submit it, as part
//!   of the call being settled (salt-0 orders have no off-call life);
//! - the call sender *is* the maker: no signature needed;
//! - the maker is a registered contract wallet: authorization is
//!   delegated to the wallet's validator;
//! - otherwise: a detached 65-byte signature must recover to the maker
//!   over the order's domain-separated digest.

use std::collections::HashMap;

use alloy_primitives::{Address, B256, U256};
use tracing::trace;

use crate::error::ExchangeError;
use crate::signature::{recover, Eip712Domain};
use crate::types::order::Order;

/// Contract-wallet signature validation (EIP-1271 style).
///
/// Registered per wallet address; asked whether a digest/signature pair
/// is acceptable to the wallet.
pub trait SignatureValidator {
    /// Whether `signature` authorizes `digest` for this wallet.
    fn is_valid_signature(&self, digest: B256, signature: &[u8]) -> Result<bool, ExchangeError>;
}

/// Checks that an order was authorized by its maker.
pub struct OrderVerifier {
    domain: Eip712Domain,
    validators: HashMap<Address, Box<dyn SignatureValidator>>,
}

impl OrderVerifier {
    /// A verifier bound to one signing domain.
    pub fn new(domain: Eip712Domain) -> Self {
        Self {
            domain,
            validators: HashMap::new(),
        }
    }

    /// The signing domain orders must be signed under.
    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    /// Register a contract wallet's validator. Replaces any previous one.
    pub fn register_validator(&mut self, wallet: Address, validator: Box<dyn SignatureValidator>) {
        self.validators.insert(wallet, validator);
    }

    /// Authorize `order` as submitted by `sender` with `signature`.
    pub fn verify(
        &self,
        order: &Order,
        signature: &[u8],
        sender: Address,
    ) -> Result<(), ExchangeError> {
        if order.salt == U256::ZERO {
            // On-the-fly orders carry no signature; the maker must be
            // the one submitting them.
            if order.maker == sender || order.maker == Address::ZERO {
                return Ok(());
            }
            return Err(ExchangeError::MakerIsNotSender);
        }
        if order.maker == sender {
            return Ok(());
        }
        let digest = self.domain.signing_hash(order.hash());
        if let Some(validator) = self.validators.get(&order.maker) {
            trace!(maker = %order.maker, "delegating to contract wallet validator");
            if validator.is_valid_signature(digest, signature)? {
                return Ok(());
            }
            return Err(ExchangeError::BadContractSignature);
        }
        let signer = recover(digest, signature)?;
        if signer != order.maker {
            return Err(ExchangeError::BadOrderSignature);
        }
        Ok(())
    }
}

impl std::fmt::Debug for OrderVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderVerifier")
            .field("domain", &self.domain)
            .field("contract_wallets", &self.validators.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use k256::ecdsa::SigningKey;

    use crate::types::asset::AssetType;
    use crate::types::order::NO_DATA;

    fn test_key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32].into()).expect("valid key bytes")
    }

    fn key_address(key: &SigningKey) -> Address {
        Address::from_public_key(key.verifying_key())
    }

    fn order_for(maker: Address, salt: u64) -> Order {
        Order::new(
            maker,
            crate::types::asset::Asset::new(AssetType::native(), U256::from(100u64)),
            Address::ZERO,
            crate::types::asset::Asset::new(
                AssetType::erc20(Address::from_slice(&[0x20; 20])),
                U256::from(500u64),
            ),
            U256::from(salt),
            0,
            0,
            NO_DATA,
            alloy_primitives::Bytes::new(),
        )
    }

    fn sign_order(verifier: &OrderVerifier, key: &SigningKey, order: &Order) -> Vec<u8> {
        let digest = verifier.domain().signing_hash(order.hash());
        let (sig, recid) = key
            .sign_prehash_recoverable(digest.as_slice())
            .expect("signing succeeds");
        let mut raw = sig.to_bytes().to_vec();
        raw.push(27 + recid.to_byte());
        raw
    }

    #[test]
    fn test_maker_as_sender_needs_no_signature() {
        let verifier = OrderVerifier::new(Eip712Domain::default());
        let maker = Address::from_slice(&[0x11; 20]);
        let order = order_for(maker, 42);
        assert!(verifier.verify(&order, &[], maker).is_ok());
    }

    #[test]
    fn test_valid_signature_authorizes_third_party_submission() {
        let verifier = OrderVerifier::new(Eip712Domain::default());
        let key = test_key(3);
        let maker = key_address(&key);
        let order = order_for(maker, 42);
        let sig = sign_order(&verifier, &key, &order);
        let sender = Address::from_slice(&[0x99; 20]);
        assert!(verifier.verify(&order, &sig, sender).is_ok());
    }

    #[test]
    fn test_signature_from_wrong_key_rejected() {
        let verifier = OrderVerifier::new(Eip712Domain::default());
        let maker = key_address(&test_key(3));
        let order = order_for(maker, 42);
        let sig = sign_order(&verifier, &test_key(4), &order);
        assert_eq!(
            verifier.verify(&order, &sig, Address::from_slice(&[0x99; 20])),
            Err(ExchangeError::BadOrderSignature)
        );
    }

    #[test]
    fn test_salt_zero_restricted_to_maker() {
        let verifier = OrderVerifier::new(Eip712Domain::default());
        let maker = Address::from_slice(&[0x11; 20]);
        let order = order_for(maker, 0);
        assert!(verifier.verify(&order, &[], maker).is_ok());
        assert_eq!(
            verifier.verify(&order, &[], Address::from_slice(&[0x22; 20])),
            Err(ExchangeError::MakerIsNotSender)
        );
    }

    struct AcceptAll;
    struct RejectAll;
    struct Failing;

    impl SignatureValidator for AcceptAll {
        fn is_valid_signature(&self, _: B256, _: &[u8]) -> Result<bool, ExchangeError> {
            Ok(true)
        }
    }

    impl SignatureValidator for RejectAll {
        fn is_valid_signature(&self, _: B256, _: &[u8]) -> Result<bool, ExchangeError> {
            Ok(false)
        }
    }

    impl SignatureValidator for Failing {
        fn is_valid_signature(&self, _: B256, _: &[u8]) -> Result<bool, ExchangeError> {
            Err(ExchangeError::ExternalCall("wallet unreachable".into()))
        }
    }

    #[test]
    fn test_contract_wallet_delegation() {
        let wallet = Address::from_slice(&[0xCC; 20]);
        let sender = Address::from_slice(&[0x99; 20]);
        let order = order_for(wallet, 42);

        let mut verifier = OrderVerifier::new(Eip712Domain::default());
        verifier.register_validator(wallet, Box::new(AcceptAll));
        assert!(verifier.verify(&order, b"opaque", sender).is_ok());

        verifier.register_validator(wallet, Box::new(RejectAll));
        assert_eq!(
            verifier.verify(&order, b"opaque", sender),
            Err(ExchangeError::BadContractSignature)
        );

        verifier.register_validator(wallet, Box::new(Failing));
        assert_eq!(
            verifier.verify(&order, b"opaque", sender),
            Err(ExchangeError::ExternalCall("wallet unreachable".into()))
        );
    }
}
