//! In-process ledger
//!
//! This module provides [`MemoryLedger`], a thread-safe [`Ledger`] holding one
//! balance per account in a `DashMap`. It backs the replay CLI, tests and
//! benchmarks; production hosts plug in their own ledger.
//!
//! # Thread Safety
//!
//! Operations on different accounts proceed in parallel. Operations on the
//! same account are serialized by the map's per-shard locking. Cloning the
//! ledger shares the underlying balances.

use crate::core::traits::Ledger;
use crate::types::{AccountId, LedgerError};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Thread-safe in-memory ledger
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    balances: Arc<DashMap<AccountId, Decimal>>,
}

impl MemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every known account, sorted by account id
    pub fn balances(&self) -> Vec<(AccountId, Decimal)> {
        let mut balances: Vec<(AccountId, Decimal)> = self
            .balances
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        balances.sort_by_key(|(account, _)| *account);
        balances
    }

    /// Whether the account has been created
    pub fn contains(&self, account: AccountId) -> bool {
        self.balances.contains_key(&account)
    }

    fn check_amount(account: AccountId, amount: Decimal) -> Result<(), LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount { account, amount });
        }
        Ok(())
    }
}

impl Ledger for MemoryLedger {
    fn ensure_account(&self, account: AccountId) -> Result<(), LedgerError> {
        self.balances.entry(account).or_insert(Decimal::ZERO);
        Ok(())
    }

    fn deposit(&self, account: AccountId, amount: Decimal) -> Result<(), LedgerError> {
        Self::check_amount(account, amount)?;

        let mut balance = self.balances.entry(account).or_insert(Decimal::ZERO);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow(account, "deposit"))?;

        Ok(())
    }

    fn withdraw(&self, account: AccountId, amount: Decimal) -> Result<(), LedgerError> {
        Self::check_amount(account, amount)?;

        let mut balance = self.balances.entry(account).or_insert(Decimal::ZERO);
        if *balance < amount {
            return Err(LedgerError::insufficient_funds(account, *balance, amount));
        }
        *balance -= amount;

        Ok(())
    }

    fn balance(&self, account: AccountId) -> Decimal {
        self.balances
            .get(&account)
            .map(|balance| *balance)
            .unwrap_or(Decimal::ZERO)
    }
}
