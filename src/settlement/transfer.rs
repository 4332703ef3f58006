//! Asset movement: per-class transfer proxies and the native-value escrow.
//!
//! ## Transfer proxies
//!
//! The engine never touches token state itself. Each asset class is settled
//! through an operator-gated collaborator implementing [`TransferProxy`],
//! registered per class tag. Lazy classes register a proxy that mints on
//! first transfer.
//!
//! ## Native currency
//!
//! Native legs are funded by the caller-supplied value of the current call,
//! never by a maker balance. A [`NativeEscrow`] tracks the unspent budget:
//! any debit beyond it fails with "bad eth transfer", and whatever is left
//! after settlement is refunded to whichever address funded the call.

use std::collections::HashMap;

use alloy_primitives::{Address, FixedBytes, U256};
use tracing::debug;

use crate::error::ExchangeError;
use crate::types::asset::{Asset, AssetClass};

/// Collaborator that moves one asset class on behalf of its owner.
pub trait TransferProxy {
    /// Move `asset` from `owner` to `recipient`. Rejections propagate and
    /// abort the whole settlement.
    fn pull_from(
        &mut self,
        owner: Address,
        recipient: Address,
        asset: &Asset,
    ) -> Result<(), ExchangeError>;
}

/// Host-side sink for native-currency pushes.
pub trait NativeLedger {
    /// Credit `amount` of native currency to `recipient`.
    fn push(&mut self, recipient: Address, amount: U256) -> Result<(), ExchangeError>;
}

/// Unspent caller-supplied native value for one call.
#[derive(Debug)]
pub struct NativeEscrow {
    remaining: U256,
}

impl NativeEscrow {
    /// Open an escrow over the caller-supplied value.
    pub fn new(value: U256) -> Self {
        Self { remaining: value }
    }

    /// Spend from the escrow; overdrafts fail with "bad eth transfer".
    pub fn debit(&mut self, amount: U256) -> Result<(), ExchangeError> {
        self.remaining = self
            .remaining
            .checked_sub(amount)
            .ok_or(ExchangeError::BadEthTransfer)?;
        Ok(())
    }

    /// What is left to refund.
    pub fn remaining(&self) -> U256 {
        self.remaining
    }
}

/// Dispatch table from asset class to transfer mechanism.
pub struct TransferExecutor {
    proxies: HashMap<FixedBytes<4>, Box<dyn TransferProxy>>,
    native: Box<dyn NativeLedger>,
}

impl TransferExecutor {
    /// Create an executor over the host's native ledger.
    pub fn new(native: Box<dyn NativeLedger>) -> Self {
        Self {
            proxies: HashMap::new(),
            native,
        }
    }

    /// Register (or replace) the proxy for an asset class.
    pub fn set_proxy(&mut self, class: AssetClass, proxy: Box<dyn TransferProxy>) {
        self.proxies.insert(class.tag(), proxy);
    }

    /// Move one asset. Native legs spend from the call's escrow; everything
    /// else goes through the registered proxy for the class.
    pub fn transfer(
        &mut self,
        asset: &Asset,
        from: Address,
        to: Address,
        escrow: &mut NativeEscrow,
    ) -> Result<(), ExchangeError> {
        if asset.value.is_zero() {
            return Ok(());
        }
        debug!(class = ?asset.asset_type.class, %from, %to, value = %asset.value, "transfer");
        match asset.asset_type.class {
            AssetClass::Native => {
                escrow.debit(asset.value)?;
                self.native.push(to, asset.value)
            }
            _ => {
                let proxy = self
                    .proxies
                    .get_mut(&asset.asset_type.class.tag())
                    .ok_or(ExchangeError::NoTransferProxy)?;
                proxy.pull_from(from, to, asset)
            }
        }
    }

    /// Return the unspent escrow to whoever funded the call.
    pub fn refund(
        &mut self,
        funder: Address,
        escrow: &mut NativeEscrow,
    ) -> Result<(), ExchangeError> {
        let amount = escrow.remaining();
        if amount.is_zero() {
            return Ok(());
        }
        escrow.debit(amount)?;
        debug!(%funder, %amount, "escrow refund");
        self.native.push(funder, amount)
    }
}

impl std::fmt::Debug for TransferExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferExecutor")
            .field("proxy_classes", &self.proxies.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
