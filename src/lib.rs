//! Economy Core Library
//! # Overview
//!
//! This library is the accounting core of a currency service: it moves value
//! between ledger accounts under a configurable service fee, keeps a system
//! vault collecting those fees, and produces a receipt for every successful
//! transaction.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (AccountId, fee policy, Receipt, errors)
//! - [`core`] - Business logic components:
//!   - [`core::fee`] - Service fee calculation
//!   - [`core::vault`] - The dual-mode system vault
//!   - [`core::engine`] - Transaction protocol with compensating rollback
//!   - [`core::store`] / [`core::autosave`] - Internal vault persistence
//! - [`service`] - Lifecycle and the public API other components use
//! - [`config`] - JSON configuration
//! - [`cli`], [`io`], [`replay`] - CSV replay tool
//!
//! # Transaction Outcomes
//!
//! - **Success**: at least one recipient was paid; a receipt is attached
//! - **InsufficientBalance**: the payer cannot afford one unit
//! - **UpstreamFailure**: the payer's ledger account is unavailable
//! - **UnknownError**: no recipient could be paid for another reason
//!
//! A failed compensation is not an outcome: it is returned as
//! [`EngineError::CompensationFailed`] and quarantines the accounts involved.

pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod logging;
pub mod replay;
pub mod service;
pub mod types;

pub use config::EconomyConfig;
pub use core::{JsonVaultStore, Ledger, MemoryLedger, SystemVault, TransactionEngine, VaultStore};
pub use service::EconomyService;
pub use types::{
    AccountId, EngineError, FeeOverrides, FeePolicy, FeePreference, LedgerError, Receipt,
    TransactionResult, TransactionStatus,
};
