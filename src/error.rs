//! Error taxonomy for the exchange engine.
//!
//! Every failure carries a stable, machine-parseable reason string. Callers
//! (and the host environment) rely on these strings for classification, so
//! they must never change between releases.
//!
//! ## Categories
//!
//! - **Authorization**: bad/missing signature, wrong maker, cancelled order
//! - **Arithmetic/invariant**: fill exceeding nominal, overflow
//! - **Economic validation**: basis-point sums, insufficient native currency
//! - **Asset compatibility**: unmatched types, unknown selectors
//! - **External calls**: transfer rejected by a collaborator, propagated
//!
//! All failures are all-or-nothing per call; there is no partial-fill-then-
//! fail state exposed (the host discards state changes on error).

use thiserror::Error;

/// Failure reasons surfaced by matching, cancellation and settlement.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    // ------------------------------------------------------------------
    // Authorization
    // ------------------------------------------------------------------
    /// A salt-0 order was submitted by someone other than its maker.
    #[error("maker is not tx sender")]
    MakerIsNotSender,

    /// Salt-0 orders have no persistent identity and cannot be cancelled.
    #[error("salt 0 cannot be cancelled")]
    Salt0CannotBeCancelled,

    /// Recovered signer does not equal the maker (EOA path).
    #[error("bad order signature verification")]
    BadOrderSignature,

    /// A contract-wallet maker rejected the signature.
    #[error("bad signature verification for contract")]
    BadContractSignature,

    /// The 65-byte signature carried a recovery id outside the
    /// canonical and "+4" extended ranges.
    #[error("invalid signature recovery id")]
    InvalidRecoveryId,

    /// Cancellation attempted by someone other than the order maker.
    #[error("not the order maker")]
    NotOrderMaker,

    /// The order's counterparty constraint excludes the other maker.
    #[error("leftOrder.taker verification failed")]
    LeftTakerVerificationFailed,

    /// The order's counterparty constraint excludes the other maker.
    #[error("rightOrder.taker verification failed")]
    RightTakerVerificationFailed,

    // ------------------------------------------------------------------
    // Time windows
    // ------------------------------------------------------------------
    /// `start != 0 && now < start`.
    #[error("Order start validation failed")]
    OrderStartValidationFailed,

    /// `end != 0 && now > end`.
    #[error("Order end validation failed")]
    OrderEndValidationFailed,

    // ------------------------------------------------------------------
    // Asset compatibility
    // ------------------------------------------------------------------
    /// Unrecognized order data schema selector.
    #[error("unsupported order data type")]
    UnsupportedDataType,

    /// The two orders' asset types do not merge into a tradeable type.
    #[error("assets don't match")]
    AssetsDontMatch,

    /// Equal custom asset classes with no registered matcher.
    #[error("unknown matching rule")]
    UnknownMatchingRule,

    /// A per-class payload failed to decode.
    #[error("malformed asset data")]
    MalformedAssetData,

    // ------------------------------------------------------------------
    // Fill computation
    // ------------------------------------------------------------------
    /// The fill counter exceeds the order's nominal basis amount. This is
    /// also how matching against a cancelled order (sentinel counter) fails.
    #[error("fill exceeds order amount")]
    FillExceedsOrderAmount,

    /// The computed fill moves no value on either side.
    #[error("nothing to fill")]
    NothingToFill,

    /// Filling the left order fully would worsen its declared price.
    #[error("bad fill when left order should be filled fully")]
    BadFillLeft,

    /// Filling the right order (or both) fully would worsen its price.
    #[error("bad fill when right order or both sides should be filled fully")]
    BadFillRight,

    // ------------------------------------------------------------------
    // Economic validation
    // ------------------------------------------------------------------
    /// Declared royalty basis points sum over 5000 (50%).
    #[error("royalties sum exceeds 50%")]
    RoyaltiesTooHigh,

    /// Declared payout basis points do not sum to exactly 10000.
    #[error("total bp(s) of payment is not 100%")]
    PayoutSumNot100,

    /// Native-currency debits exceeded the caller-supplied value.
    #[error("bad eth transfer")]
    BadEthTransfer,

    // ------------------------------------------------------------------
    // Settlement dispatch
    // ------------------------------------------------------------------
    /// No transfer proxy registered for the asset's class.
    #[error("no transfer proxy for asset class")]
    NoTransferProxy,

    /// A lazy-mint token id does not carry the payer as its minter prefix.
    #[error("from not minter")]
    FromNotMinter,

    /// A lazy-mint voucher creator signature is missing or invalid.
    #[error("incorrect signature")]
    IncorrectSignature,

    /// A collaborator (transfer proxy, contract wallet) rejected the call.
    #[error("external call failed: {0}")]
    ExternalCall(String),

    // ------------------------------------------------------------------
    // Arithmetic
    // ------------------------------------------------------------------
    #[error("numeric overflow")]
    NumericOverflow,

    #[error("division by zero")]
    DivisionByZero,

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------
    /// An access-gated administrative call from a non-owner.
    #[error("caller is not the owner")]
    NotOwner,
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_strings_are_stable() {
        // These strings are part of the external contract; keep them frozen.
        assert_eq!(
            ExchangeError::MakerIsNotSender.to_string(),
            "maker is not tx sender"
        );
        assert_eq!(
            ExchangeError::Salt0CannotBeCancelled.to_string(),
            "salt 0 cannot be cancelled"
        );
        assert_eq!(
            ExchangeError::RoyaltiesTooHigh.to_string(),
            "royalties sum exceeds 50%"
        );
        assert_eq!(
            ExchangeError::PayoutSumNot100.to_string(),
            "total bp(s) of payment is not 100%"
        );
        assert_eq!(
            ExchangeError::BadFillRight.to_string(),
            "bad fill when right order or both sides should be filled fully"
        );
        assert_eq!(
            ExchangeError::BadFillLeft.to_string(),
            "bad fill when left order should be filled fully"
        );
        assert_eq!(ExchangeError::BadEthTransfer.to_string(), "bad eth transfer");
        assert_eq!(ExchangeError::FromNotMinter.to_string(), "from not minter");
    }
}
