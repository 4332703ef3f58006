//! Versioned fee configuration.
//!
//! One explicit value object, passed by reference into each settlement
//! call and mutated only through the exchange's owner-gated admin API.
//! `version` increments on every mutation so hosts can snapshot/diff it.

use std::collections::HashMap;

use alloy_primitives::Address;

/// Collaborator granting payer-specific protocol-fee discounts.
///
/// A returned rate only applies when it is lower than the configured
/// default; providers cannot raise the fee.
pub trait ProtocolFeeProvider {
    /// Discounted rate in basis points for a payer, if any.
    fn fee_bp(&self, payer: Address) -> Option<u64>;
}

/// Global fee settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeConfig {
    /// Mutation counter
    pub version: u64,
    protocol_fee_bp: u64,
    default_fee_receiver: Address,
    /// Per-asset receiver overrides; `Address::ZERO` keys native currency
    fee_receivers: HashMap<Address, Address>,
}

impl FeeConfig {
    /// Create a configuration with a default rate and fallback receiver.
    pub fn new(protocol_fee_bp: u64, default_fee_receiver: Address) -> Self {
        Self {
            version: 0,
            protocol_fee_bp,
            default_fee_receiver,
            fee_receivers: HashMap::new(),
        }
    }

    /// The global default protocol-fee rate in basis points.
    pub fn protocol_fee_bp(&self) -> u64 {
        self.protocol_fee_bp
    }

    /// Effective rate for a payer: the default, or a lower provider rate.
    pub fn effective_fee_bp(&self, payer: Address, provider: Option<&dyn ProtocolFeeProvider>) -> u64 {
        match provider.and_then(|p| p.fee_bp(payer)) {
            Some(discounted) if discounted < self.protocol_fee_bp => discounted,
            _ => self.protocol_fee_bp,
        }
    }

    /// Receiver for fees charged on an asset, by its receiver key.
    /// Unknown or keyless assets fall back to the default receiver.
    pub fn fee_receiver(&self, key: Option<Address>) -> Address {
        key.and_then(|k| self.fee_receivers.get(&k).copied())
            .unwrap_or(self.default_fee_receiver)
    }

    /// Set the default protocol-fee rate.
    pub fn set_protocol_fee_bp(&mut self, bp: u64) {
        self.protocol_fee_bp = bp;
        self.version += 1;
    }

    /// Set the fallback fee receiver.
    pub fn set_default_fee_receiver(&mut self, receiver: Address) {
        self.default_fee_receiver = receiver;
        self.version += 1;
    }

    /// Set the fee receiver for one asset key (`Address::ZERO` = native).
    pub fn set_fee_receiver(&mut self, asset_key: Address, receiver: Address) {
        self.fee_receivers.insert(asset_key, receiver);
        self.version += 1;
    }
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

    struct HalfOff;
    impl ProtocolFeeProvider for HalfOff {
        fn fee_bp(&self, _payer: Address) -> Option<u64> {
            Some(150)
        }
    }

    struct Greedy;
    impl ProtocolFeeProvider for Greedy {
        fn fee_bp(&self, _payer: Address) -> Option<u64> {
            Some(9_000)
        }
    }

    #[test]
    fn test_effective_rate_takes_lower_of_default_and_discount() {
        let config = FeeConfig::new(300, addr(1));
        assert_eq!(config.effective_fee_bp(addr(2), None), 300);
        assert_eq!(config.effective_fee_bp(addr(2), Some(&HalfOff)), 150);
        // A provider can never raise the rate
        assert_eq!(config.effective_fee_bp(addr(2), Some(&Greedy)), 300);
    }

    #[test]
    fn test_receiver_lookup_with_fallback() {
        let mut config = FeeConfig::new(300, addr(1));
        config.set_fee_receiver(Address::ZERO, addr(2));
        config.set_fee_receiver(addr(9), addr(3));

        assert_eq!(config.fee_receiver(Some(Address::ZERO)), addr(2));
        assert_eq!(config.fee_receiver(Some(addr(9))), addr(3));
        assert_eq!(config.fee_receiver(Some(addr(8))), addr(1));
        assert_eq!(config.fee_receiver(None), addr(1));
    }

    #[test]
    fn test_version_bumps_on_every_mutation() {
        let mut config = FeeConfig::new(300, addr(1));
        assert_eq!(config.version, 0);
        config.set_protocol_fee_bp(250);
        config.set_default_fee_receiver(addr(2));
        config.set_fee_receiver(Address::ZERO, addr(3));
        assert_eq!(config.version, 3);
        assert_eq!(config.protocol_fee_bp(), 250);
    }
}
