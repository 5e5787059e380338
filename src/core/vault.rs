//! System vault
//!
//! The platform's own account, collecting service fees. It runs in one of two
//! modes, fixed at construction:
//!
//! - **Internal**: the balance lives in process memory behind a shared handle.
//!   The autosave task flushes it to a [`VaultStore`] periodically and on
//!   shutdown.
//! - **External**: the balance is a normal account in the ledger and every
//!   operation is delegated to it.
//!
//! Only the engine and explicit administrative calls mutate the vault.

use crate::core::traits::{Ledger, VaultStore};
use crate::types::{AccountId, VaultError};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared handle to an internal vault balance
///
/// Cloning shares the balance. The autosave task holds one clone and reads
/// whatever value is current when it ticks.
#[derive(Debug, Clone, Default)]
pub struct InternalBalance(Arc<Mutex<Decimal>>);

impl InternalBalance {
    pub fn new(balance: Decimal) -> Self {
        InternalBalance(Arc::new(Mutex::new(balance)))
    }

    /// Current value
    pub fn get(&self) -> Decimal {
        *self.0.lock()
    }

    fn set(&self, balance: Decimal) {
        *self.0.lock() = balance;
    }

    fn deposit(&self, amount: Decimal) -> Result<(), VaultError> {
        let mut balance = self.0.lock();
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| VaultError::ArithmeticOverflow {
                operation: "deposit".to_string(),
            })?;
        Ok(())
    }

    fn withdraw(&self, amount: Decimal) -> Result<(), VaultError> {
        let mut balance = self.0.lock();
        if *balance < amount {
            return Err(VaultError::InsufficientFunds {
                available: *balance,
                requested: amount,
            });
        }
        *balance -= amount;
        Ok(())
    }
}

/// Which mode a vault runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultMode {
    Internal,
    External,
}

/// The system vault
///
/// Exactly one mode is active; the variant carries only the state that mode
/// needs.
#[derive(Debug, Clone)]
pub enum SystemVault {
    Internal(InternalBalance),
    External(AccountId),
}

impl SystemVault {
    /// Internal vault starting from `balance`
    pub fn internal(balance: Decimal) -> Self {
        SystemVault::Internal(InternalBalance::new(balance))
    }

    /// Internal vault starting from the persisted balance, or zero
    pub fn load_internal(store: &dyn VaultStore) -> Self {
        let balance = match store.load() {
            Some(balance) => {
                info!(%balance, "Loaded internal system vault balance");
                balance
            }
            None => {
                info!("No usable system vault snapshot, starting from zero");
                Decimal::ZERO
            }
        };
        Self::internal(balance)
    }

    /// External vault delegating to `account`, created in the ledger if needed
    pub fn external<L: Ledger + ?Sized>(ledger: &L, account: AccountId) -> Result<Self, VaultError> {
        ledger.ensure_account(account)?;
        info!(%account, "Using external ledger account as system vault");
        Ok(SystemVault::External(account))
    }

    pub fn mode(&self) -> VaultMode {
        match self {
            SystemVault::Internal(_) => VaultMode::Internal,
            SystemVault::External(_) => VaultMode::External,
        }
    }

    /// Handle to the in-memory balance, for internal vaults
    pub fn internal_balance(&self) -> Option<&InternalBalance> {
        match self {
            SystemVault::Internal(balance) => Some(balance),
            SystemVault::External(_) => None,
        }
    }

    /// The ledger account backing an external vault
    pub fn external_account(&self) -> Option<AccountId> {
        match self {
            SystemVault::Internal(_) => None,
            SystemVault::External(account) => Some(*account),
        }
    }

    /// Credit the vault
    ///
    /// Internal mode always succeeds for a valid amount.
    pub fn deposit<L: Ledger + ?Sized>(&self, ledger: &L, amount: Decimal) -> Result<(), VaultError> {
        check_amount(amount)?;
        debug!(%amount, mode = ?self.mode(), "System vault deposit");
        match self {
            SystemVault::Internal(balance) => balance.deposit(amount),
            SystemVault::External(account) => Ok(ledger.deposit(*account, amount)?),
        }
    }

    /// Debit the vault
    ///
    /// Internal mode fails without mutation if the balance is below `amount`.
    pub fn withdraw<L: Ledger + ?Sized>(&self, ledger: &L, amount: Decimal) -> Result<(), VaultError> {
        check_amount(amount)?;
        debug!(%amount, mode = ?self.mode(), "System vault withdrawal");
        match self {
            SystemVault::Internal(balance) => balance.withdraw(amount),
            SystemVault::External(account) => Ok(ledger.withdraw(*account, amount)?),
        }
    }

    pub fn balance<L: Ledger + ?Sized>(&self, ledger: &L) -> Decimal {
        match self {
            SystemVault::Internal(balance) => balance.get(),
            SystemVault::External(account) => ledger.balance(*account),
        }
    }

    /// Overwrite the balance, for administrative correction
    pub fn set_balance<L: Ledger + ?Sized>(&self, ledger: &L, amount: Decimal) -> Result<(), VaultError> {
        check_amount(amount)?;
        info!(%amount, mode = ?self.mode(), "Setting system vault balance");
        match self {
            SystemVault::Internal(balance) => {
                balance.set(amount);
                Ok(())
            }
            SystemVault::External(account) => Ok(ledger.set_balance(*account, amount)?),
        }
    }
}

fn check_amount(amount: Decimal) -> Result<(), VaultError> {
    if amount < Decimal::ZERO {
        return Err(VaultError::InvalidAmount { amount });
    }
    Ok(())
}
