//! Receipt construction
//!
//! Receipts are built exactly once per engine call that paid at least one
//! recipient. The transaction id is a uniformly random 64-bit draw, used only
//! to correlate log lines.

use crate::types::{AccountId, FeeBreakdown, FeePolicy, Receipt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

/// Builds receipts and draws their correlation ids
#[derive(Debug)]
pub struct ReceiptFactory {
    rng: StdRng,
}

impl ReceiptFactory {
    /// Factory seeded from OS entropy
    pub fn new() -> Self {
        ReceiptFactory {
            rng: StdRng::from_entropy(),
        }
    }

    /// Factory with a fixed seed, for reproducible ids
    pub fn seeded(seed: u64) -> Self {
        ReceiptFactory {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Build the receipt for a batch
    ///
    /// `recipients` are the recipients actually paid, in payment order.
    pub fn issue(
        &mut self,
        payer: AccountId,
        recipients: Vec<AccountId>,
        amount: Decimal,
        breakdown: &FeeBreakdown,
        policy: &FeePolicy,
        payer_balance_after: Decimal,
    ) -> Receipt {
        Receipt {
            payer,
            recipients,
            amount_per_transaction: amount,
            arrival_per_transaction: breakdown.recipient_receives,
            fee_per_transaction: breakdown.fee,
            fee_rate: policy.rate,
            fee_preference: policy.preference,
            payer_balance_after,
            transaction_id: self.rng.gen(),
        }
    }
}

impl Default for ReceiptFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fee;
    use crate::types::FeePreference;
    use uuid::Uuid;

    fn account(n: u128) -> AccountId {
        AccountId::from_uuid(Uuid::from_u128(n))
    }

    fn issue(factory: &mut ReceiptFactory, policy: &FeePolicy) -> Receipt {
        let amount = Decimal::new(100, 0);
        let breakdown = fee::compute(amount, policy).unwrap();
        factory.issue(
            account(1),
            vec![account(2), account(3)],
            amount,
            &breakdown,
            policy,
            Decimal::new(800, 0),
        )
    }

    #[test]
    fn test_issue_records_breakdown_and_policy() {
        let policy = FeePolicy::flat(Decimal::new(2, 2)).with_preference(FeePreference::Additional);

        let receipt = issue(&mut ReceiptFactory::seeded(7), &policy);

        assert_eq!(receipt.payer(), account(1));
        assert_eq!(receipt.recipients(), &[account(2), account(3)]);
        assert_eq!(receipt.amount_per_transaction(), Decimal::new(100, 0));
        assert_eq!(receipt.fee_per_transaction(), Decimal::new(2, 0));
        assert_eq!(receipt.arrival_per_transaction(), Decimal::new(100, 0));
        assert_eq!(receipt.fee_rate(), Decimal::new(2, 2));
        assert_eq!(receipt.fee_preference(), FeePreference::Additional);
        assert_eq!(receipt.payer_balance_after(), Decimal::new(800, 0));
    }

    #[test]
    fn test_seeded_factories_reproduce_ids() {
        let policy = FeePolicy::flat(Decimal::new(2, 2));

        let first = issue(&mut ReceiptFactory::seeded(42), &policy);
        let second = issue(&mut ReceiptFactory::seeded(42), &policy);

        assert_eq!(first.transaction_id(), second.transaction_id());
    }

    #[test]
    fn test_consecutive_ids_differ() {
        let policy = FeePolicy::flat(Decimal::new(2, 2));
        let mut factory = ReceiptFactory::seeded(42);

        let first = issue(&mut factory, &policy);
        let second = issue(&mut factory, &policy);

        assert_ne!(first.transaction_id(), second.transaction_id());
    }
}
