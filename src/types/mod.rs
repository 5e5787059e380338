//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account identifiers
//! - `fee`: Fee policy, overrides and breakdown
//! - `receipt`: Receipts and transaction results
//! - `error`: Error types for the economy core

pub mod account;
pub mod error;
pub mod fee;
pub mod receipt;

pub use account::AccountId;
pub use error::{
    CompensationFailure, CompensationStage, ConfigError, EngineError, LedgerError, ServiceError,
    StoreError, VaultError,
};
pub use fee::{FeeBreakdown, FeeOverrides, FeePolicy, FeePreference};
pub use receipt::{Receipt, TransactionResult, TransactionStatus};
