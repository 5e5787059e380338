//! Economy service
//!
//! The surface other components depend on. [`EconomyService`] owns the
//! transaction engine and the system vault's lifecycle:
//!
//! - **start**: load the internal vault balance (or zero) and spawn autosave,
//!   or make sure the external vault's ledger account exists
//! - **run**: transfers and trades, receipt logging, pass-through account
//!   and vault administration
//! - **shutdown**: stop autosave and write the final snapshot

use crate::config::{EconomyConfig, VaultKind};
use crate::core::{Autosave, JsonVaultStore, Ledger, SystemVault, TransactionEngine, VaultStore};
use crate::types::{
    AccountId, ConfigError, EngineError, FeeOverrides, FeePreference, LedgerError, Receipt,
    ServiceError, StoreError, TransactionResult, VaultError,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

/// Kind of call a receipt came from, for log prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReceiptKind {
    Transfer,
    Trade,
}

/// The economy service over a host-provided ledger
#[derive(Debug)]
pub struct EconomyService<L: Ledger> {
    engine: TransactionEngine<L>,
    autosave: Option<Autosave>,
    log_transfers: bool,
    log_trades: bool,
}

impl<L: Ledger> EconomyService<L> {
    /// Start the service with the configured JSON vault store
    ///
    /// Must be called from within a tokio runtime when the vault is internal.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the external
    /// vault account cannot be created.
    pub fn start(config: &EconomyConfig, ledger: L) -> Result<Self, ServiceError> {
        let store = Arc::new(JsonVaultStore::new(&config.vault.data_file));
        Self::start_with_store(config, ledger, store)
    }

    /// Start the service with an explicit vault store
    pub fn start_with_store(
        config: &EconomyConfig,
        ledger: L,
        store: Arc<dyn VaultStore>,
    ) -> Result<Self, ServiceError> {
        config.validate()?;

        let (vault, autosave) = match config.vault.kind {
            VaultKind::Internal => {
                let vault = SystemVault::load_internal(store.as_ref());
                let autosave = vault.internal_balance().map(|balance| {
                    Autosave::spawn(balance.clone(), store, config.autosave_interval())
                });
                (vault, autosave)
            }
            VaultKind::External => {
                let account = config.vault.external_account.ok_or_else(|| {
                    ConfigError::invalid(
                        "vault.external_account",
                        "required when vault type is external",
                    )
                })?;
                (SystemVault::external(&ledger, account)?, None)
            }
        };

        info!(
            vault = ?vault.mode(),
            transfer_fee = %config.service_fee.transfer_fee,
            trade_fee = %config.service_fee.trade_fee,
            "Economy service started"
        );

        Ok(EconomyService {
            engine: TransactionEngine::new(
                ledger,
                vault,
                config.service_fee.transfer_fee,
                config.service_fee.trade_fee,
            ),
            autosave,
            log_transfers: config.misc.log_transfers,
            log_trades: config.misc.log_trades,
        })
    }

    pub fn transfer(
        &mut self,
        payer: AccountId,
        recipient: AccountId,
        amount: Decimal,
    ) -> Result<TransactionResult, EngineError> {
        let result = self.engine.transfer(payer, recipient, amount)?;
        self.log_receipt(ReceiptKind::Transfer, &result);
        Ok(result)
    }

    pub fn transfer_to_multiple(
        &mut self,
        payer: AccountId,
        recipients: &[AccountId],
        amount: Decimal,
        preference: FeePreference,
    ) -> Result<TransactionResult, EngineError> {
        let result = self
            .engine
            .transfer_to_multiple(payer, recipients, amount, preference)?;
        self.log_receipt(ReceiptKind::Transfer, &result);
        Ok(result)
    }

    pub fn trade(
        &mut self,
        consumer: AccountId,
        merchant: AccountId,
        price: Decimal,
        overrides: FeeOverrides,
    ) -> Result<TransactionResult, EngineError> {
        let result = self.engine.trade(consumer, merchant, price, overrides)?;
        self.log_receipt(ReceiptKind::Trade, &result);
        Ok(result)
    }

    fn log_receipt(&self, kind: ReceiptKind, result: &TransactionResult) {
        let Some(receipt) = result.receipt() else {
            return;
        };
        match kind {
            ReceiptKind::Transfer if self.log_transfers => log_receipt("(Transfer)", receipt),
            ReceiptKind::Trade if self.log_trades => log_receipt("(Trade)", receipt),
            _ => {}
        }
    }

    /// Credit an account directly, creating it if needed
    pub fn deposit_account(&self, account: AccountId, amount: Decimal) -> Result<(), LedgerError> {
        let ledger = self.engine.ledger();
        ledger.ensure_account(account)?;
        ledger.deposit(account, amount)
    }

    /// Debit an account directly
    pub fn withdraw_account(&self, account: AccountId, amount: Decimal) -> Result<(), LedgerError> {
        self.engine.ledger().withdraw(account, amount)
    }

    pub fn account_balance(&self, account: AccountId) -> Decimal {
        self.engine.ledger().balance(account)
    }

    /// Overwrite an account's balance by moving the difference
    pub fn set_account_balance(&self, account: AccountId, amount: Decimal) -> Result<(), LedgerError> {
        self.engine.ledger().set_balance(account, amount)
    }

    pub fn deposit_system_vault(&self, amount: Decimal) -> Result<(), VaultError> {
        self.engine.vault().deposit(self.engine.ledger(), amount)
    }

    pub fn withdraw_system_vault(&self, amount: Decimal) -> Result<(), VaultError> {
        self.engine.vault().withdraw(self.engine.ledger(), amount)
    }

    pub fn system_balance(&self) -> Decimal {
        self.engine.system_balance()
    }

    /// Overwrite the system vault balance, for administrative correction
    pub fn set_system_balance(&self, amount: Decimal) -> Result<(), VaultError> {
        self.engine.vault().set_balance(self.engine.ledger(), amount)
    }

    pub fn transfer_fee_rate(&self) -> Decimal {
        self.engine.transfer_fee_rate()
    }

    pub fn trade_fee_rate(&self) -> Decimal {
        self.engine.trade_fee_rate()
    }

    /// Accounts blocked after a failed compensation
    pub fn quarantined_accounts(&self) -> Vec<AccountId> {
        self.engine.quarantined_accounts()
    }

    pub fn release_account(&mut self, account: AccountId) -> bool {
        info!(%account, "Releasing quarantined account");
        self.engine.release_account(account)
    }

    pub fn release_vault(&mut self) -> bool {
        info!("Releasing quarantined system vault");
        self.engine.release_vault()
    }

    pub fn engine(&self) -> &TransactionEngine<L> {
        &self.engine
    }

    pub fn ledger(&self) -> &L {
        self.engine.ledger()
    }

    /// Stop autosave and flush the internal vault one last time
    pub async fn shutdown(self) -> Result<(), StoreError> {
        if let Some(autosave) = self.autosave {
            autosave.shutdown().await?;
        }
        info!("Economy service stopped");
        Ok(())
    }
}

fn log_receipt(prefix: &str, receipt: &Receipt) {
    info!("{} {}", prefix, receipt);
}
