//! Operation replay
//!
//! Drives an [`EconomyService`] over an in-process [`MemoryLedger`] from an
//! operations CSV and writes the resulting balances. This is the pipeline
//! behind the `economy-core` binary.
//!
//! Malformed rows, rejected calls and non-success outcomes are logged and
//! skipped. A fatal engine error stops the replay; the vault is still flushed
//! before the error is returned.

use crate::config::EconomyConfig;
use crate::core::MemoryLedger;
use crate::io::{write_balances_csv, Operation, SyncReader};
use crate::service::EconomyService;
use crate::types::{EngineError, ServiceError, TransactionStatus};
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Counts of what happened to each input row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Rows applied successfully
    pub applied: usize,
    /// Rows that ran but did not succeed (insufficient balance and friends)
    pub failed: usize,
    /// Rows rejected before touching the ledger
    pub rejected: usize,
    /// Rows that could not be parsed
    pub malformed: usize,
}

/// Replay `input` and write final balances to `output`
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Returns an error if the input cannot be opened, the service cannot start,
/// a fatal engine error occurs, the final flush fails or the output cannot
/// be written.
pub async fn replay(
    config: &EconomyConfig,
    input: &Path,
    output: &mut dyn Write,
) -> Result<ReplaySummary, ServiceError> {
    let reader = SyncReader::new(input).map_err(ServiceError::replay)?;
    let ledger = MemoryLedger::new();
    let mut service = EconomyService::start(config, ledger.clone())?;

    let mut summary = ReplaySummary::default();
    let mut fatal = None;

    for row in reader {
        let operation = match row {
            Ok(operation) => operation,
            Err(e) => {
                warn!(error = %e, "Skipping malformed row");
                summary.malformed += 1;
                continue;
            }
        };

        match apply(&mut service, operation) {
            Ok(Some(TransactionStatus::Success)) => summary.applied += 1,
            Ok(Some(status)) => {
                warn!(%status, "Operation did not succeed");
                summary.failed += 1;
            }
            Ok(None) => summary.rejected += 1,
            Err(e) if e.is_fatal() => {
                fatal = Some(e);
                break;
            }
            Err(e) => {
                warn!(error = %e, "Operation rejected");
                summary.rejected += 1;
            }
        }
    }

    let system_balance = service.system_balance();
    service.shutdown().await?;

    if let Some(e) = fatal {
        return Err(e.into());
    }

    write_balances_csv(&ledger.balances(), system_balance, output).map_err(ServiceError::replay)?;

    info!(
        applied = summary.applied,
        failed = summary.failed,
        rejected = summary.rejected,
        malformed = summary.malformed,
        "Replay complete"
    );
    Ok(summary)
}

/// Apply one operation
///
/// Returns the transaction status, `Ok(Some(Success))` for a deposit, or
/// `Ok(None)` if the ledger refused a deposit.
fn apply(
    service: &mut EconomyService<MemoryLedger>,
    operation: Operation,
) -> Result<Option<TransactionStatus>, EngineError> {
    let result = match operation {
        Operation::Deposit { account, amount } => {
            return Ok(match service.deposit_account(account, amount) {
                Ok(()) => Some(TransactionStatus::Success),
                Err(e) => {
                    warn!(%account, error = %e, "Deposit refused");
                    None
                }
            });
        }
        Operation::Transfer {
            payer,
            recipients,
            amount,
            preference,
        } => service.transfer_to_multiple(payer, &recipients, amount, preference)?,
        Operation::Trade {
            consumer,
            merchant,
            price,
            overrides,
        } => service.trade(consumer, merchant, price, overrides)?,
    };
    Ok(Some(result.status()))
}
