//! Receipt and transaction result types
//!
//! A [`Receipt`] is the immutable audit record of one engine call that moved
//! money for at least one recipient. It is wrapped in a [`TransactionResult`]
//! carrying the outcome status.

use super::account::AccountId;
use super::fee::FeePreference;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Outcome status of an engine call
///
/// These are ordinary business outcomes. Callers are expected to branch on
/// them; none of them indicates an inconsistent ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// At least one recipient was paid
    Success,
    /// The payer cannot afford a single unit of the transaction
    InsufficientBalance,
    /// The ledger refused an operation this core could not classify further
    UpstreamFailure,
    /// No recipient was paid for a reason other than the admission check
    UnknownError,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Success => write!(f, "success"),
            TransactionStatus::InsufficientBalance => write!(f, "insufficient balance"),
            TransactionStatus::UpstreamFailure => write!(f, "upstream failure"),
            TransactionStatus::UnknownError => write!(f, "unknown error"),
        }
    }
}

/// Audit record of a completed (possibly partial) batch
///
/// All per-transaction quantities apply to each recipient in `recipients`.
/// Totals are derived by multiplying with the recipient count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub(crate) payer: AccountId,
    pub(crate) recipients: Vec<AccountId>,
    pub(crate) amount_per_transaction: Decimal,
    pub(crate) arrival_per_transaction: Decimal,
    pub(crate) fee_per_transaction: Decimal,
    pub(crate) fee_rate: Decimal,
    pub(crate) fee_preference: FeePreference,
    pub(crate) payer_balance_after: Decimal,
    pub(crate) transaction_id: u64,
}

impl Receipt {
    pub fn payer(&self) -> AccountId {
        self.payer
    }

    /// Recipients actually paid, in the order they were paid
    pub fn recipients(&self) -> &[AccountId] {
        &self.recipients
    }

    pub fn amount_per_transaction(&self) -> Decimal {
        self.amount_per_transaction
    }

    pub fn arrival_per_transaction(&self) -> Decimal {
        self.arrival_per_transaction
    }

    pub fn fee_per_transaction(&self) -> Decimal {
        self.fee_per_transaction
    }

    pub fn fee_rate(&self) -> Decimal {
        self.fee_rate
    }

    /// Fee rate expressed in percent, e.g. `2` for a rate of `0.02`
    ///
    /// Saturates at `Decimal::MAX` for very large override rates.
    pub fn fee_rate_percent(&self) -> Decimal {
        self.fee_rate.saturating_mul(Decimal::ONE_HUNDRED)
    }

    pub fn fee_preference(&self) -> FeePreference {
        self.fee_preference
    }

    /// Payer balance read right after the last recipient was paid
    pub fn payer_balance_after(&self) -> Decimal {
        self.payer_balance_after
    }

    /// Random correlation tag for logs. Not unique, never a lookup key.
    pub fn transaction_id(&self) -> u64 {
        self.transaction_id
    }

    pub fn total_amount(&self) -> Decimal {
        self.amount_per_transaction * self.count()
    }

    pub fn total_fee(&self) -> Decimal {
        self.fee_per_transaction * self.count()
    }

    pub fn total_arrival(&self) -> Decimal {
        self.arrival_per_transaction * self.count()
    }

    fn count(&self) -> Decimal {
        Decimal::from(self.recipients.len())
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let recipients: Vec<String> = self.recipients.iter().map(|r| r.to_string()).collect();
        write!(
            f,
            "Receipt{{payer={}, recipients=[{}], amount={} ({} total), fee={} ({} total, {}% {}), arrive={} ({} total), payer_remain={}, id={:016x}}}",
            self.payer,
            recipients.join(", "),
            self.amount_per_transaction,
            self.total_amount(),
            self.fee_per_transaction,
            self.total_fee(),
            self.fee_rate_percent().normalize(),
            self.fee_preference,
            self.arrival_per_transaction,
            self.total_arrival(),
            self.payer_balance_after,
            self.transaction_id,
        )
    }
}

/// Tagged outcome of an engine call
///
/// A receipt is present exactly when the status is `Success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionResult {
    status: TransactionStatus,
    receipt: Option<Receipt>,
}

impl TransactionResult {
    pub fn success(receipt: Receipt) -> Self {
        TransactionResult {
            status: TransactionStatus::Success,
            receipt: Some(receipt),
        }
    }

    /// A non-success outcome; carries no receipt
    pub fn failed(status: TransactionStatus) -> Self {
        debug_assert_ne!(status, TransactionStatus::Success);
        TransactionResult {
            status,
            receipt: None,
        }
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == TransactionStatus::Success
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    pub fn into_receipt(self) -> Option<Receipt> {
        self.receipt
    }
}
