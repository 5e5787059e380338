//! CSV format handling for replay operations and balance output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvOperation structure for deserialization
//! - Conversion from CSV rows to [`Operation`]s
//! - Balance output serialization
//!
//! All functions are pure (no I/O) for easy testing.
//!
//! Input columns: `op,payer,recipients,amount,rate,fee_min,fee_max,preference`.
//! `recipients` is a `;`-separated list; the fee columns and `preference` may
//! be empty.

use crate::types::{AccountId, FeeOverrides, FeePreference};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV row structure for deserialization
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct CsvOperation {
    pub op: String,
    pub payer: String,
    pub recipients: Option<String>,
    pub amount: Option<String>,
    pub rate: Option<String>,
    pub fee_min: Option<String>,
    pub fee_max: Option<String>,
    pub preference: Option<String>,
}

/// One replayable operation
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Credit an account directly
    Deposit { account: AccountId, amount: Decimal },
    /// Transfer to one or more recipients at the transfer rate
    Transfer {
        payer: AccountId,
        recipients: Vec<AccountId>,
        amount: Decimal,
        preference: FeePreference,
    },
    /// Single-recipient trade with optional fee overrides
    Trade {
        consumer: AccountId,
        merchant: AccountId,
        price: Decimal,
        overrides: FeeOverrides,
    },
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_decimal(field: &Option<String>, name: &str) -> Result<Option<Decimal>, String> {
    non_empty(field)
        .map(|value| {
            Decimal::from_str(value).map_err(|_| format!("Invalid {} '{}'", name, value))
        })
        .transpose()
}

fn parse_account(value: &str) -> Result<AccountId, String> {
    value
        .parse()
        .map_err(|_| format!("Invalid account id '{}'", value.trim()))
}

/// Convert a CsvOperation to an Operation
///
/// # Returns
///
/// Result containing either:
/// - Ok(Operation) - Successfully converted row
/// - Err(String) - Error message describing the conversion failure
pub fn convert_csv_record(row: CsvOperation) -> Result<Operation, String> {
    let payer = parse_account(&row.payer)?;
    let amount = parse_decimal(&row.amount, "amount")?
        .ok_or_else(|| format!("{} operation requires an amount", row.op.trim()))?;

    let recipients = non_empty(&row.recipients)
        .map(|list| list.split(';').map(parse_account).collect::<Result<Vec<_>, _>>())
        .transpose()?
        .unwrap_or_default();

    let preference = non_empty(&row.preference)
        .map(FeePreference::from_str)
        .transpose()?;

    match row.op.trim().to_lowercase().as_str() {
        "deposit" => Ok(Operation::Deposit {
            account: payer,
            amount,
        }),
        "transfer" => {
            if recipients.is_empty() {
                return Err("transfer operation requires at least one recipient".to_string());
            }
            Ok(Operation::Transfer {
                payer,
                recipients,
                amount,
                preference: preference.unwrap_or_default(),
            })
        }
        "trade" => {
            let [merchant] = recipients.as_slice() else {
                return Err(format!(
                    "trade operation requires exactly one recipient, got {}",
                    recipients.len()
                ));
            };
            Ok(Operation::Trade {
                consumer: payer,
                merchant: *merchant,
                price: amount,
                overrides: FeeOverrides {
                    rate: parse_decimal(&row.rate, "rate")?,
                    min: parse_decimal(&row.fee_min, "fee_min")?,
                    max: parse_decimal(&row.fee_max, "fee_max")?,
                    preference,
                },
            })
        }
        other => Err(format!("Invalid operation: '{}'", other)),
    }
}

/// Write final balances to CSV format
///
/// Writes `account,balance` rows sorted by account, followed by a `system`
/// row holding the vault balance. Values have four decimal places.
pub fn write_balances_csv(
    balances: &[(AccountId, Decimal)],
    system_balance: Decimal,
    output: &mut dyn Write,
) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account", "balance"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted = balances.to_vec();
    sorted.sort_by_key(|(account, _)| *account);

    for (account, balance) in sorted {
        writer
            .write_record(&[account.to_string(), format!("{:.4}", balance)])
            .map_err(|e| format!("Failed to write balance record: {}", e))?;
    }

    writer
        .write_record(&["system".to_string(), format!("{:.4}", system_balance)])
        .map_err(|e| format!("Failed to write system balance: {}", e))?;

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
