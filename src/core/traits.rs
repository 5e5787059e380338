//! Core traits at the boundaries of the economy core
//!
//! This module defines the collaborator abstractions the engine depends on:
//! the per-account [`Ledger`] and the durable [`VaultStore`] backing an
//! internal system vault.

use crate::types::{AccountId, LedgerError, StoreError};
use rust_decimal::Decimal;

/// External balance store keyed by account identifier
///
/// Every call is synchronous and completes before the engine takes its next
/// step. Implementations may fail for reasons opaque to this core; the engine
/// treats any error as the operation not having happened.
pub trait Ledger {
    /// Make sure the account exists, creating it with a zero balance if needed
    fn ensure_account(&self, account: AccountId) -> Result<(), LedgerError>;

    /// Credit `amount` to the account
    fn deposit(&self, account: AccountId, amount: Decimal) -> Result<(), LedgerError>;

    /// Debit `amount` from the account
    fn withdraw(&self, account: AccountId, amount: Decimal) -> Result<(), LedgerError>;

    /// Current balance; unknown accounts read as zero
    fn balance(&self, account: AccountId) -> Decimal;

    /// Overwrite the balance by depositing or withdrawing the difference
    fn set_balance(&self, account: AccountId, target: Decimal) -> Result<(), LedgerError> {
        if target < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount {
                account,
                amount: target,
            });
        }
        self.ensure_account(account)?;
        let difference = target - self.balance(account);
        if difference > Decimal::ZERO {
            self.deposit(account, difference)
        } else if difference < Decimal::ZERO {
            self.withdraw(account, -difference)
        } else {
            Ok(())
        }
    }
}

impl<L: Ledger + ?Sized> Ledger for &L {
    fn ensure_account(&self, account: AccountId) -> Result<(), LedgerError> {
        (**self).ensure_account(account)
    }

    fn deposit(&self, account: AccountId, amount: Decimal) -> Result<(), LedgerError> {
        (**self).deposit(account, amount)
    }

    fn withdraw(&self, account: AccountId, amount: Decimal) -> Result<(), LedgerError> {
        (**self).withdraw(account, amount)
    }

    fn balance(&self, account: AccountId) -> Decimal {
        (**self).balance(account)
    }

    fn set_balance(&self, account: AccountId, target: Decimal) -> Result<(), LedgerError> {
        (**self).set_balance(account, target)
    }
}

impl<L: Ledger + ?Sized> Ledger for std::sync::Arc<L> {
    fn ensure_account(&self, account: AccountId) -> Result<(), LedgerError> {
        (**self).ensure_account(account)
    }

    fn deposit(&self, account: AccountId, amount: Decimal) -> Result<(), LedgerError> {
        (**self).deposit(account, amount)
    }

    fn withdraw(&self, account: AccountId, amount: Decimal) -> Result<(), LedgerError> {
        (**self).withdraw(account, amount)
    }

    fn balance(&self, account: AccountId) -> Decimal {
        (**self).balance(account)
    }

    fn set_balance(&self, account: AccountId, target: Decimal) -> Result<(), LedgerError> {
        (**self).set_balance(account, target)
    }
}

/// Single-record durable store for the internal vault balance
pub trait VaultStore: Send + Sync {
    /// Read the persisted balance
    ///
    /// Returns `None` when the record is absent or unreadable; the vault then
    /// starts from zero.
    fn load(&self) -> Option<Decimal>;

    /// Overwrite the persisted balance
    fn save(&self, balance: Decimal) -> Result<(), StoreError>;
}
