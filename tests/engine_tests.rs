//! Transaction engine integration tests
//!
//! Drives the engine through the public API against a fault-injecting
//! ledger, covering every step of the sub-transaction protocol and its
//! compensations.

mod common;

use common::{account, dec, FlakyLedger, Op};
use economy_core::core::ReceiptFactory;
use economy_core::types::{CompensationFailure, CompensationStage};
use economy_core::{
    AccountId, EngineError, FeeOverrides, FeePreference, Ledger, MemoryLedger, SystemVault,
    TransactionEngine, TransactionStatus,
};
use proptest::prelude::*;
use rstest::rstest;
use rust_decimal::Decimal;

const TRANSFER_FEE: Decimal = Decimal::from_parts(2, 0, 0, false, 2);
const TRADE_FEE: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

fn payer() -> AccountId {
    account(1)
}

fn vault_account() -> AccountId {
    account(99)
}

/// Engine with an external vault on a flaky ledger; payer holds `balance`
fn flaky_engine(balance: i64) -> TransactionEngine<FlakyLedger> {
    let ledger = FlakyLedger::new();
    ledger.inner().deposit(payer(), dec(balance)).unwrap();
    let vault = SystemVault::external(&ledger, vault_account()).unwrap();
    TransactionEngine::new(ledger, vault, TRANSFER_FEE, TRADE_FEE)
        .with_receipt_factory(ReceiptFactory::seeded(7))
}

fn internal_engine(balance: i64) -> TransactionEngine<MemoryLedger> {
    let ledger = MemoryLedger::new();
    ledger.deposit(payer(), dec(balance)).unwrap();
    TransactionEngine::new(ledger, SystemVault::internal(Decimal::ZERO), TRANSFER_FEE, TRADE_FEE)
}

#[test]
fn test_transfer_scenario_internal_vault() {
    let mut engine = internal_engine(1000);

    let result = engine.transfer(payer(), account(2), dec(100)).unwrap();

    assert_eq!(result.status(), TransactionStatus::Success);
    assert_eq!(engine.ledger().balance(payer()), dec(900));
    assert_eq!(engine.ledger().balance(account(2)), dec(98));
    assert_eq!(engine.system_balance(), dec(2));
}

#[test]
fn test_trade_scenario_clamped_fee() {
    let mut engine = internal_engine(1000);
    let overrides = FeeOverrides::default()
        .rate(Decimal::new(5, 2))
        .min(dec(10))
        .max(dec(20));

    let result = engine.trade(payer(), account(2), dec(100), overrides).unwrap();

    let receipt = result.into_receipt().unwrap();
    assert_eq!(receipt.fee_per_transaction(), dec(10));
    assert_eq!(receipt.arrival_per_transaction(), dec(90));
    assert_eq!(engine.ledger().balance(account(2)), dec(90));
}

#[test]
fn test_batch_partial_progress() {
    let mut engine = flaky_engine(1000);
    engine.ledger().fail_always(Op::Deposit, account(3));

    let result = engine
        .transfer_to_multiple(
            payer(),
            &[account(2), account(3), account(4)],
            dec(100),
            FeePreference::Internal,
        )
        .unwrap();

    assert_eq!(result.status(), TransactionStatus::Success);
    let receipt = result.receipt().unwrap();
    assert_eq!(receipt.recipients(), &[account(2)]);
    assert_eq!(receipt.total_amount(), dec(100));
    assert_eq!(engine.ledger().balance(payer()), dec(900));
    assert_eq!(engine.system_balance(), dec(2));
    // The fourth recipient is never attempted
    assert!(!engine
        .ledger()
        .calls()
        .iter()
        .any(|(op, acc, _)| *op == Op::Deposit && *acc == account(4)));
}

#[test]
fn test_full_batch_receipt_totals() {
    let mut engine = flaky_engine(1000);

    let result = engine
        .transfer_to_multiple(
            payer(),
            &[account(2), account(3), account(4)],
            dec(100),
            FeePreference::Additional,
        )
        .unwrap();

    let receipt = result.into_receipt().unwrap();
    assert_eq!(receipt.recipients().len(), 3);
    assert_eq!(receipt.total_amount(), dec(300));
    assert_eq!(receipt.total_fee(), dec(6));
    assert_eq!(receipt.total_arrival(), dec(300));
    assert_eq!(receipt.payer_balance_after(), dec(694));
    assert_eq!(engine.system_balance(), dec(6));
}

/// Each failing forward step, with the compensations expected afterwards
#[rstest]
#[case::payer_debit(Op::Withdraw, 1, vec![])]
#[case::fee_credit(Op::Deposit, 99, vec![(Op::Deposit, 1, 100)])]
#[case::recipient_credit(Op::Deposit, 2, vec![(Op::Withdraw, 99, 2), (Op::Deposit, 1, 100)])]
fn test_failed_step_is_compensated(
    #[case] op: Op,
    #[case] target: u128,
    #[case] expected_undo: Vec<(Op, u128, i64)>,
) {
    let mut engine = flaky_engine(1000);
    engine.ledger().fail_nth(op, account(target), 1);
    let calls_before = engine.ledger().calls().len();

    let result = engine.transfer(payer(), account(2), dec(100)).unwrap();

    assert_eq!(result.status(), TransactionStatus::UnknownError);
    assert!(result.receipt().is_none());
    assert_eq!(engine.ledger().balance(payer()), dec(1000));
    assert_eq!(engine.ledger().balance(account(2)), Decimal::ZERO);
    assert_eq!(engine.system_balance(), Decimal::ZERO);

    let calls = engine.ledger().calls();
    let failed_at = calls[calls_before..]
        .iter()
        .position(|(o, acc, _)| *o == op && *acc == account(target))
        .unwrap()
        + calls_before;
    let actual: Vec<(Op, AccountId, Decimal)> = calls[failed_at + 1..].to_vec();
    let expected: Vec<(Op, AccountId, Decimal)> = expected_undo
        .into_iter()
        .map(|(o, n, amount)| (o, account(n), dec(amount)))
        .collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_failed_refund_propagates_fatal_error() {
    let mut engine = flaky_engine(1000);
    engine.ledger().fail_always(Op::Deposit, vault_account());
    engine.ledger().fail_always(Op::Deposit, payer());

    let err = engine.transfer(payer(), account(2), dec(100)).unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(
        err,
        EngineError::CompensationFailed {
            payer: payer(),
            recipient: account(2),
            failures: vec![CompensationFailure::new(
                CompensationStage::RefundPayer,
                "Ledger backend error: injected Deposit fault",
            )],
        }
    );
    assert_eq!(engine.quarantined_accounts(), vec![payer()]);
}

#[test]
fn test_failed_reclaim_continues_with_refund() {
    let mut engine = flaky_engine(1000);
    engine.ledger().fail_always(Op::Deposit, account(2));
    engine.ledger().fail_always(Op::Withdraw, vault_account());

    let err = engine.transfer(payer(), account(2), dec(100)).unwrap_err();

    assert!(matches!(
        &err,
        EngineError::CompensationFailed { failures, .. }
            if failures.len() == 1 && failures[0].stage == CompensationStage::ReclaimFee
    ));
    assert!(engine.is_vault_quarantined());
    assert!(!engine.is_quarantined(payer()));
    assert_eq!(engine.ledger().balance(payer()), dec(1000));
    // The refund is still attempted after the failed reclaim
    let refunds = engine
        .ledger()
        .calls()
        .into_iter()
        .filter(|(op, acc, _)| *op == Op::Deposit && *acc == payer())
        .count();
    assert_eq!(refunds, 1);
}

#[test]
fn test_fatal_error_mid_batch_keeps_earlier_recipients() {
    let mut engine = flaky_engine(1000);
    engine.ledger().fail_always(Op::Deposit, account(3));
    engine.ledger().fail_always(Op::Withdraw, vault_account());

    let err = engine
        .transfer_to_multiple(
            payer(),
            &[account(2), account(3)],
            dec(100),
            FeePreference::Internal,
        )
        .unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(engine.ledger().balance(account(2)), dec(98));
    // Second recipient's debit was refunded; the stuck fee stays in the vault
    assert_eq!(engine.ledger().balance(payer()), dec(900));
    assert_eq!(engine.system_balance(), dec(4));
}

#[rstest]
#[case::additional_sum(FeePreference::Additional)]
#[case::internal(FeePreference::Internal)]
fn test_max_amount_transfer_never_panics(#[case] preference: FeePreference) {
    let mut engine = flaky_engine(0);

    let outcome = engine.transfer_to_multiple(payer(), &[account(2)], Decimal::MAX, preference);

    match outcome {
        Ok(result) => assert_eq!(result.status(), TransactionStatus::InsufficientBalance),
        Err(e) => assert_eq!(e, EngineError::ArithmeticOverflow { amount: Decimal::MAX }),
    }
    assert_eq!(engine.ledger().balance(account(2)), Decimal::ZERO);
}

#[test]
fn test_upstream_failure_when_payer_unavailable() {
    let mut engine = flaky_engine(1000);
    engine.ledger().fail_always(Op::Ensure, payer());

    let result = engine.transfer(payer(), account(2), dec(100)).unwrap();

    assert_eq!(result.status(), TransactionStatus::UpstreamFailure);
    assert_eq!(engine.ledger().balance(payer()), dec(1000));
}

#[test]
fn test_receipt_display() {
    let mut engine = internal_engine(1000);

    let result = engine.transfer(payer(), account(2), dec(100)).unwrap();
    let rendered = result.receipt().unwrap().to_string();

    assert!(rendered.contains("payer=00000000-0000-0000-0000-000000000001"));
    assert!(rendered.contains("2% internal"));
}

proptest! {
    #[test]
    fn prop_zero_balance_payer_never_mutates(amount in 1i64..1_000_000) {
        let mut engine = internal_engine(0);

        let result = engine.transfer(payer(), account(2), dec(amount)).unwrap();

        prop_assert_eq!(result.status(), TransactionStatus::InsufficientBalance);
        prop_assert!(result.receipt().is_none());
        prop_assert_eq!(engine.ledger().balance(payer()), Decimal::ZERO);
        prop_assert_eq!(engine.ledger().balance(account(2)), Decimal::ZERO);
        prop_assert_eq!(engine.system_balance(), Decimal::ZERO);
    }

    #[test]
    fn prop_any_amount_is_an_outcome_or_rejection(
        lo in any::<u32>(),
        mid in any::<u32>(),
        hi in any::<u32>(),
        scale in 0u32..=28,
        rate_percent in 0i64..=500,
        additional in any::<bool>(),
    ) {
        let amount = Decimal::from_parts(lo, mid, hi, false, scale);
        let preference = if additional {
            FeePreference::Additional
        } else {
            FeePreference::Internal
        };
        let overrides = FeeOverrides::default()
            .rate(Decimal::new(rate_percent, 2))
            .preference(preference);
        let mut engine = internal_engine(1000);

        match engine.trade(payer(), account(2), amount, overrides) {
            Ok(result) => prop_assert!(result.is_success() || result.receipt().is_none()),
            Err(e) => prop_assert!(!e.is_fatal()),
        }
        prop_assert_eq!(
            engine.ledger().balance(payer())
                + engine.ledger().balance(account(2))
                + engine.system_balance(),
            dec(1000)
        );
    }

    #[test]
    fn prop_successful_transfer_conserves_value(
        balance in 1i64..1_000_000,
        percent in 0i64..=100,
    ) {
        let amount = dec(balance) * Decimal::new(percent, 2);
        let mut engine = internal_engine(balance);

        let result = engine.transfer(payer(), account(2), amount).unwrap();

        let receipt = result.into_receipt().unwrap();
        let fee = receipt.fee_per_transaction();
        prop_assert_eq!(dec(balance) - engine.ledger().balance(payer()), amount);
        prop_assert_eq!(engine.system_balance(), fee);
        prop_assert_eq!(engine.ledger().balance(account(2)), amount - fee);
    }
}
