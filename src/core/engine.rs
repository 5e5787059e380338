//! Transaction engine
//!
//! This module provides the TransactionEngine that moves value between ledger
//! accounts under a service fee policy, crediting fees to the system vault.
//!
//! Every call runs the same protocol over an ordered recipient list:
//!
//! - Validate the call (amount, recipients, fee policy, quarantine)
//! - Compute the fee breakdown for one unit
//! - Admission check: the payer must afford one unit, otherwise
//!   `InsufficientBalance` with nothing mutated
//! - For each recipient, a three-step sub-transaction
//!   (debit payer, credit fee, credit recipient) that is undone step by step
//!   if a later step fails
//!
//! A failed sub-transaction stops the batch but keeps recipients already
//! paid. Undos are all attempted even if one fails. Any failed undo is
//! fatal: the call returns [`EngineError::CompensationFailed`] listing every
//! failed stage, and the accounts left unreconciled are quarantined until an
//! operator releases them.

use crate::core::fee;
use crate::core::receipt::ReceiptFactory;
use crate::core::traits::Ledger;
use crate::core::vault::SystemVault;
use crate::types::{
    AccountId, CompensationFailure, CompensationStage, EngineError, FeeBreakdown, FeeOverrides, FeePolicy,
    FeePreference, TransactionResult, TransactionStatus,
};
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::{debug, error, warn};

/// Progress of one recipient's sub-transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubTransaction {
    NotStarted,
    PayerDebited,
    FeeCredited,
    RecipientCredited,
}

impl SubTransaction {
    fn advance(self) -> Self {
        match self {
            SubTransaction::NotStarted => SubTransaction::PayerDebited,
            SubTransaction::PayerDebited => SubTransaction::FeeCredited,
            SubTransaction::FeeCredited | SubTransaction::RecipientCredited => {
                SubTransaction::RecipientCredited
            }
        }
    }

    /// Inverse of the step leaving this state
    fn undo(self, breakdown: &FeeBreakdown) -> Option<Compensation> {
        match self {
            SubTransaction::NotStarted => Some(Compensation::RefundPayer(breakdown.payer_supplies)),
            SubTransaction::PayerDebited => Some(Compensation::ReclaimFee(breakdown.fee)),
            SubTransaction::FeeCredited | SubTransaction::RecipientCredited => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compensation {
    RefundPayer(Decimal),
    ReclaimFee(Decimal),
}

impl Compensation {
    fn stage(&self) -> CompensationStage {
        match self {
            Compensation::RefundPayer(_) => CompensationStage::RefundPayer,
            Compensation::ReclaimFee(_) => CompensationStage::ReclaimFee,
        }
    }
}

/// Transaction processing engine
///
/// Owns the system vault and the collaborators needed to run transfers and
/// trades against a [`Ledger`]. Calls take `&mut self`; hosts that share an
/// engine across threads serialize access themselves.
#[derive(Debug)]
pub struct TransactionEngine<L: Ledger> {
    ledger: L,
    vault: SystemVault,
    transfer_fee: Decimal,
    trade_fee: Decimal,
    receipts: ReceiptFactory,
    quarantined: HashSet<AccountId>,
    vault_quarantined: bool,
}

impl<L: Ledger> TransactionEngine<L> {
    /// Create a new TransactionEngine
    ///
    /// # Arguments
    ///
    /// * `ledger` - Balance store holding every account but an internal vault
    /// * `vault` - The system vault collecting service fees
    /// * `transfer_fee` - Rate applied to transfers
    /// * `trade_fee` - Default rate applied to trades
    pub fn new(ledger: L, vault: SystemVault, transfer_fee: Decimal, trade_fee: Decimal) -> Self {
        TransactionEngine {
            ledger,
            vault,
            transfer_fee,
            trade_fee,
            receipts: ReceiptFactory::new(),
            quarantined: HashSet::new(),
            vault_quarantined: false,
        }
    }

    /// Replace the receipt factory, e.g. with a seeded one
    pub fn with_receipt_factory(mut self, receipts: ReceiptFactory) -> Self {
        self.receipts = receipts;
        self
    }

    /// Transfer `amount` from `payer` to `recipient` at the transfer fee rate
    ///
    /// The fee is unbounded and taken out of the amount.
    pub fn transfer(
        &mut self,
        payer: AccountId,
        recipient: AccountId,
        amount: Decimal,
    ) -> Result<TransactionResult, EngineError> {
        self.transfer_to_multiple(payer, &[recipient], amount, FeePreference::Internal)
    }

    /// Transfer `amount` from `payer` to each recipient, in order
    ///
    /// Best effort: the batch stops at the first recipient that cannot be
    /// paid and keeps the ones already paid. Compare the receipt's recipient
    /// count with `recipients.len()` to detect a partial batch.
    pub fn transfer_to_multiple(
        &mut self,
        payer: AccountId,
        recipients: &[AccountId],
        amount: Decimal,
        preference: FeePreference,
    ) -> Result<TransactionResult, EngineError> {
        let policy = FeePolicy::flat(self.transfer_fee).with_preference(preference);
        self.execute(payer, recipients, amount, policy)
    }

    /// Pay `price` from `consumer` to `merchant` at the trade fee rate
    ///
    /// Any field set in `overrides` replaces the configured trade policy.
    pub fn trade(
        &mut self,
        consumer: AccountId,
        merchant: AccountId,
        price: Decimal,
        overrides: FeeOverrides,
    ) -> Result<TransactionResult, EngineError> {
        let policy = overrides.resolve(self.trade_fee);
        self.execute(consumer, &[merchant], price, policy)
    }

    /// Run the transaction protocol with an explicit fee policy
    ///
    /// # Returns
    ///
    /// * `Ok(TransactionResult)` with the business outcome; a receipt is
    ///   present only on `Success`
    /// * `Err(EngineError)` if the call was rejected before touching the
    ///   ledger, or a compensation failed
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `amount` is negative, `recipients` is empty or the policy is invalid
    /// - The fee arithmetic overflows
    /// - The fee exceeds the amount under the `Internal` preference
    /// - The payer, a recipient or the vault is quarantined
    /// - Undoing a failed sub-transaction failed (fatal)
    pub fn execute(
        &mut self,
        payer: AccountId,
        recipients: &[AccountId],
        amount: Decimal,
        policy: FeePolicy,
    ) -> Result<TransactionResult, EngineError> {
        let breakdown = self.validate(payer, recipients, amount, &policy)?;

        if let Err(e) = self.ledger.ensure_account(payer) {
            warn!(%payer, error = %e, "Payer account unavailable");
            return Ok(TransactionResult::failed(TransactionStatus::UpstreamFailure));
        }

        let available = self.ledger.balance(payer);
        if available < breakdown.payer_supplies {
            warn!(
                %payer,
                %available,
                required = %breakdown.payer_supplies,
                "Insufficient balance for transaction"
            );
            return Ok(TransactionResult::failed(
                TransactionStatus::InsufficientBalance,
            ));
        }

        let mut paid = Vec::with_capacity(recipients.len());
        for &recipient in recipients {
            if !self.settle(payer, recipient, &breakdown)? {
                break;
            }
            paid.push(recipient);
        }

        if paid.is_empty() {
            warn!(%payer, "No recipient could be paid");
            return Ok(TransactionResult::failed(TransactionStatus::UnknownError));
        }
        if paid.len() < recipients.len() {
            warn!(
                %payer,
                paid = paid.len(),
                requested = recipients.len(),
                "Batch stopped early"
            );
        }

        let payer_balance_after = self.ledger.balance(payer);
        let receipt = self
            .receipts
            .issue(payer, paid, amount, &breakdown, &policy, payer_balance_after);
        debug!(id = receipt.transaction_id(), "Transaction complete");
        Ok(TransactionResult::success(receipt))
    }

    fn validate(
        &self,
        payer: AccountId,
        recipients: &[AccountId],
        amount: Decimal,
        policy: &FeePolicy,
    ) -> Result<FeeBreakdown, EngineError> {
        if amount < Decimal::ZERO {
            return Err(EngineError::InvalidAmount { amount });
        }
        if recipients.is_empty() {
            return Err(EngineError::NoRecipients);
        }
        policy
            .check()
            .map_err(|reason| EngineError::InvalidFeePolicy { reason })?;

        if self.vault_quarantined {
            return Err(EngineError::VaultQuarantined);
        }
        if let Some(&account) = std::iter::once(&payer)
            .chain(recipients)
            .find(|account| self.quarantined.contains(account))
        {
            return Err(EngineError::AccountQuarantined { account });
        }

        let breakdown =
            fee::compute(amount, policy).ok_or(EngineError::ArithmeticOverflow { amount })?;
        if breakdown.recipient_receives < Decimal::ZERO {
            return Err(EngineError::FeeExceedsAmount {
                amount,
                fee: breakdown.fee,
            });
        }
        Ok(breakdown)
    }

    /// Run one recipient's sub-transaction
    ///
    /// Returns `Ok(true)` if the recipient was paid and `Ok(false)` if a step
    /// failed and was fully undone.
    fn settle(
        &mut self,
        payer: AccountId,
        recipient: AccountId,
        breakdown: &FeeBreakdown,
    ) -> Result<bool, EngineError> {
        if let Err(e) = self.ledger.ensure_account(recipient) {
            warn!(%recipient, error = %e, "Recipient account unavailable");
            return Ok(false);
        }

        let mut state = SubTransaction::NotStarted;
        let mut unwind = Vec::with_capacity(2);

        loop {
            let step = match state {
                SubTransaction::NotStarted => self
                    .ledger
                    .withdraw(payer, breakdown.payer_supplies)
                    .map_err(|e| e.to_string()),
                SubTransaction::PayerDebited => self
                    .vault
                    .deposit(&self.ledger, breakdown.fee)
                    .map_err(|e| e.to_string()),
                SubTransaction::FeeCredited => self
                    .ledger
                    .deposit(recipient, breakdown.recipient_receives)
                    .map_err(|e| e.to_string()),
                SubTransaction::RecipientCredited => return Ok(true),
            };

            match step {
                Ok(()) => {
                    debug!(%payer, %recipient, ?state, "Sub-transaction step applied");
                    unwind.extend(state.undo(breakdown));
                    state = state.advance();
                }
                Err(reason) => {
                    warn!(%payer, %recipient, ?state, %reason, "Sub-transaction step failed");
                    self.unwind(payer, recipient, unwind)?;
                    return Ok(false);
                }
            }
        }
    }

    /// Apply compensations in reverse order
    ///
    /// Every compensation is attempted. The payer is quarantined if its
    /// refund failed and the vault if reclaiming the fee failed.
    fn unwind(
        &mut self,
        payer: AccountId,
        recipient: AccountId,
        mut unwind: Vec<Compensation>,
    ) -> Result<(), EngineError> {
        let mut failures = Vec::new();

        while let Some(compensation) = unwind.pop() {
            let result = match compensation {
                Compensation::RefundPayer(amount) => self
                    .ledger
                    .deposit(payer, amount)
                    .map_err(|e| e.to_string()),
                Compensation::ReclaimFee(amount) => self
                    .vault
                    .withdraw(&self.ledger, amount)
                    .map_err(|e| e.to_string()),
            };

            match result {
                Ok(()) => {
                    debug!(%payer, %recipient, stage = %compensation.stage(), "Compensation applied");
                }
                Err(reason) => {
                    match compensation {
                        Compensation::RefundPayer(_) => {
                            self.quarantined.insert(payer);
                        }
                        Compensation::ReclaimFee(_) => self.vault_quarantined = true,
                    }
                    error!(
                        %payer,
                        %recipient,
                        stage = %compensation.stage(),
                        %reason,
                        "Compensation failed, ledger is unreconciled"
                    );
                    failures.push(CompensationFailure::new(compensation.stage(), reason));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(EngineError::compensation_failed(payer, recipient, failures))
        }
    }

    pub fn transfer_fee_rate(&self) -> Decimal {
        self.transfer_fee
    }

    pub fn trade_fee_rate(&self) -> Decimal {
        self.trade_fee
    }

    /// Current system vault balance
    pub fn system_balance(&self) -> Decimal {
        self.vault.balance(&self.ledger)
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn vault(&self) -> &SystemVault {
        &self.vault
    }

    pub fn is_quarantined(&self, account: AccountId) -> bool {
        self.quarantined.contains(&account)
    }

    /// Accounts awaiting operator reconciliation, sorted
    pub fn quarantined_accounts(&self) -> Vec<AccountId> {
        let mut accounts: Vec<AccountId> = self.quarantined.iter().copied().collect();
        accounts.sort();
        accounts
    }

    pub fn is_vault_quarantined(&self) -> bool {
        self.vault_quarantined
    }

    /// Clear an account's quarantine after manual reconciliation
    ///
    /// Returns whether the account was quarantined.
    pub fn release_account(&mut self, account: AccountId) -> bool {
        self.quarantined.remove(&account)
    }

    /// Clear the vault's quarantine after manual reconciliation
    pub fn release_vault(&mut self) -> bool {
        std::mem::replace(&mut self.vault_quarantined, false)
    }
}
