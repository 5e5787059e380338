//! Error types for the economy core
//!
//! Errors are split by the component reporting them:
//!
//! - **LedgerError**: a ledger backend refused or could not perform an operation
//! - **StoreError**: the durable vault store could not be written
//! - **VaultError**: the system vault could not complete a deposit or withdrawal
//! - **EngineError**: an engine call could not run, or left the ledger unreconciled
//! - **ConfigError**: configuration could not be loaded
//! - **ServiceError**: any of the above, surfaced by the service and replay tool
//!
//! Recoverable business outcomes (insufficient balance and friends) are not
//! errors; see [`crate::types::TransactionStatus`].

use super::account::AccountId;
use rust_decimal::Decimal;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Failure reported by a ledger backend
///
/// The transaction engine does not inspect the variant: any ledger error is
/// treated as the operation having failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// The account could not be created or reached
    #[error("Account {account} is unavailable")]
    AccountUnavailable { account: AccountId },

    #[error("Insufficient funds in account {account}: available {available}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Invalid amount {amount} for account {account}")]
    InvalidAmount { account: AccountId, amount: Decimal },

    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        account: AccountId,
        operation: String,
    },

    /// Opaque backend failure
    #[error("Ledger backend error: {message}")]
    Backend { message: String },
}

impl LedgerError {
    pub fn insufficient_funds(account: AccountId, available: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            account,
            available,
            requested,
        }
    }

    pub fn arithmetic_overflow(account: AccountId, operation: &str) -> Self {
        LedgerError::ArithmeticOverflow {
            account,
            operation: operation.to_string(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        LedgerError::Backend {
            message: message.into(),
        }
    }
}

/// Failure writing the durable vault snapshot
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// The background write task panicked or was cancelled
    #[error("Vault store task failed: {message}")]
    Task { message: String },
}

impl StoreError {
    pub fn io(path: &Path, error: std::io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            message: error.to_string(),
        }
    }

    pub fn task(error: tokio::task::JoinError) -> Self {
        StoreError::Task {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Serialization {
            message: error.to_string(),
        }
    }
}

/// Failure of a system vault operation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VaultError {
    /// Internal vault balance is below the requested withdrawal
    #[error("Insufficient system vault balance: available {available}, requested {requested}")]
    InsufficientFunds {
        available: Decimal,
        requested: Decimal,
    },

    #[error("Invalid system vault amount {amount}: amounts must not be negative")]
    InvalidAmount { amount: Decimal },

    #[error("Arithmetic overflow in system vault {operation}")]
    ArithmeticOverflow { operation: String },

    /// External vault's ledger account refused the operation
    #[error("System vault ledger operation failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("System vault store failed: {0}")]
    Store(#[from] StoreError),
}

/// Compensating step of a sub-transaction that could not be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompensationStage {
    /// Depositing the withdrawn amount back to the payer
    RefundPayer,
    /// Withdrawing the credited fee back out of the system vault
    ReclaimFee,
}

impl fmt::Display for CompensationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompensationStage::RefundPayer => write!(f, "refund payer"),
            CompensationStage::ReclaimFee => write!(f, "reclaim fee from system vault"),
        }
    }
}

/// One undo that could not be applied
#[derive(Debug, Clone, PartialEq)]
pub struct CompensationFailure {
    pub stage: CompensationStage,
    pub reason: String,
}

impl CompensationFailure {
    pub fn new(stage: CompensationStage, reason: impl fmt::Display) -> Self {
        CompensationFailure {
            stage,
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for CompensationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.reason)
    }
}

fn describe_failures(failures: &[CompensationFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors propagated out of an engine call
///
/// `CompensationFailed` is the fatal tier: the ledger and this core have
/// diverged and an operator has to reconcile the affected accounts. Until
/// then, calls touching those accounts fail with `AccountQuarantined` or
/// `VaultQuarantined`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(
        "Compensation failed for transfer from {payer} to {recipient}: {}",
        describe_failures(.failures)
    )]
    CompensationFailed {
        payer: AccountId,
        recipient: AccountId,
        /// Every undo that could not be applied, in the order attempted
        failures: Vec<CompensationFailure>,
    },

    #[error("Account {account} is quarantined after a failed compensation")]
    AccountQuarantined { account: AccountId },

    #[error("System vault is quarantined after a failed compensation")]
    VaultQuarantined,

    #[error("Invalid amount {amount}: amounts must not be negative")]
    InvalidAmount { amount: Decimal },

    #[error("Invalid fee policy: {reason}")]
    InvalidFeePolicy { reason: String },

    #[error("Arithmetic overflow computing the fee for amount {amount}")]
    ArithmeticOverflow { amount: Decimal },

    #[error("Fee {fee} exceeds amount {amount} with internal fee preference")]
    FeeExceedsAmount { amount: Decimal, fee: Decimal },

    #[error("Transaction has no recipients")]
    NoRecipients,
}

impl EngineError {
    pub fn compensation_failed(
        payer: AccountId,
        recipient: AccountId,
        failures: Vec<CompensationFailure>,
    ) -> Self {
        EngineError::CompensationFailed {
            payer,
            recipient,
            failures,
        }
    }

    /// Whether the ledger may now be unreconciled
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::CompensationFailed { .. })
    }
}

/// Failure loading configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse config: {message}")]
    Parse { message: String },

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        ConfigError::Parse {
            message: error.to_string(),
        }
    }
}

/// Failure starting, running or stopping the economy service
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Replay input or output could not be read or written
    #[error("Replay I/O error: {message}")]
    Replay { message: String },
}

impl ServiceError {
    pub fn replay(message: impl fmt::Display) -> Self {
        ServiceError::Replay {
            message: message.to_string(),
        }
    }
}
