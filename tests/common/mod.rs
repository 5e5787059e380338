//! Shared helpers for integration tests

use economy_core::{AccountId, Ledger, LedgerError, MemoryLedger};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

pub fn account(n: u128) -> AccountId {
    AccountId::from_uuid(Uuid::from_u128(n))
}

pub fn dec(value: i64) -> Decimal {
    Decimal::new(value, 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Ensure,
    Deposit,
    Withdraw,
}

/// Ledger wrapper that fails chosen calls
///
/// A fault is keyed by operation and account and fires on the `nth` matching
/// call (1-based), or on every call with `always`. Every call is recorded.
#[derive(Debug, Default)]
pub struct FlakyLedger {
    inner: MemoryLedger,
    faults: Mutex<HashMap<(Op, AccountId), Fault>>,
    calls: Mutex<Vec<(Op, AccountId, Decimal)>>,
}

#[derive(Debug, Clone, Copy)]
enum Fault {
    Nth { remaining: usize },
    Always,
}

impl FlakyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `nth` call of `op` against `account`
    pub fn fail_nth(&self, op: Op, account: AccountId, nth: usize) {
        self.faults
            .lock()
            .insert((op, account), Fault::Nth { remaining: nth });
    }

    /// Fail every call of `op` against `account`
    pub fn fail_always(&self, op: Op, account: AccountId) {
        self.faults.lock().insert((op, account), Fault::Always);
    }

    pub fn calls(&self) -> Vec<(Op, AccountId, Decimal)> {
        self.calls.lock().clone()
    }

    pub fn inner(&self) -> &MemoryLedger {
        &self.inner
    }

    fn check(&self, op: Op, account: AccountId, amount: Decimal) -> Result<(), LedgerError> {
        self.calls.lock().push((op, account, amount));
        let mut faults = self.faults.lock();
        let fire = match faults.get_mut(&(op, account)) {
            Some(Fault::Always) => true,
            Some(Fault::Nth { remaining }) => {
                *remaining -= 1;
                *remaining == 0
            }
            None => false,
        };
        if fire {
            if let Some(Fault::Nth { .. }) = faults.get(&(op, account)) {
                faults.remove(&(op, account));
            }
            return Err(LedgerError::backend(format!("injected {:?} fault", op)));
        }
        Ok(())
    }
}

impl Ledger for FlakyLedger {
    fn ensure_account(&self, account: AccountId) -> Result<(), LedgerError> {
        self.check(Op::Ensure, account, Decimal::ZERO)?;
        self.inner.ensure_account(account)
    }

    fn deposit(&self, account: AccountId, amount: Decimal) -> Result<(), LedgerError> {
        self.check(Op::Deposit, account, amount)?;
        self.inner.deposit(account, amount)
    }

    fn withdraw(&self, account: AccountId, amount: Decimal) -> Result<(), LedgerError> {
        self.check(Op::Withdraw, account, amount)?;
        self.inner.withdraw(account, amount)
    }

    fn balance(&self, account: AccountId) -> Decimal {
        self.inner.balance(account)
    }
}
