//! Core business logic module
//!
//! This module contains the transaction processing components:
//! - `traits` - Ledger and vault store abstractions
//! - `fee` - Service fee calculation
//! - `ledger` - In-process ledger implementation
//! - `vault` - The dual-mode system vault
//! - `store` - Durable JSON store for the internal vault balance
//! - `autosave` - Periodic flush of the internal vault balance
//! - `receipt` - Receipt construction
//! - `engine` - Transaction protocol with compensating rollback

pub mod autosave;
pub mod engine;
pub mod fee;
pub mod ledger;
pub mod receipt;
pub mod store;
pub mod traits;
pub mod vault;

pub use autosave::Autosave;
pub use engine::TransactionEngine;
pub use ledger::MemoryLedger;
pub use receipt::ReceiptFactory;
pub use store::JsonVaultStore;
pub use traits::{Ledger, VaultStore};
pub use vault::{InternalBalance, SystemVault, VaultMode};
