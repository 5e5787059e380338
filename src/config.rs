//! Service configuration
//!
//! Loaded once from a JSON file at startup. Every field has a default, so an
//! empty object (`{}`) is a valid configuration:
//!
//! ```json
//! {
//!   "vault": {
//!     "type": "internal",
//!     "external_account": null,
//!     "autosave_interval_secs": 60,
//!     "data_file": "ecore_internal_data.json"
//!   },
//!   "service_fee": { "transfer_fee": "0.02", "trade_fee": "0.1" },
//!   "misc": { "log_transfers": true, "log_trades": true }
//! }
//! ```

use crate::types::{AccountId, ConfigError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EconomyConfig {
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub service_fee: ServiceFeeConfig,
    #[serde(default)]
    pub misc: MiscConfig,
}

/// Where the system vault keeps its balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultKind {
    /// In process memory, persisted to `data_file`
    #[default]
    Internal,
    /// A normal ledger account, `external_account`
    External,
}

/// System vault configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultConfig {
    #[serde(rename = "type", default)]
    pub kind: VaultKind,
    /// Ledger account backing an external vault
    #[serde(default)]
    pub external_account: Option<AccountId>,
    /// Seconds between internal vault flushes
    #[serde(default = "default_autosave_interval")]
    pub autosave_interval_secs: u64,
    /// Snapshot file for the internal vault
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
}

fn default_autosave_interval() -> u64 {
    60
}

fn default_data_file() -> PathBuf {
    PathBuf::from("ecore_internal_data.json")
}

impl Default for VaultConfig {
    fn default() -> Self {
        VaultConfig {
            kind: VaultKind::default(),
            external_account: None,
            autosave_interval_secs: default_autosave_interval(),
            data_file: default_data_file(),
        }
    }
}

/// Service fee rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceFeeConfig {
    /// Rate applied to transfers
    #[serde(default = "default_transfer_fee")]
    pub transfer_fee: Decimal,
    /// Default rate applied to trades
    #[serde(default = "default_trade_fee")]
    pub trade_fee: Decimal,
}

fn default_transfer_fee() -> Decimal {
    Decimal::new(2, 2)
}

fn default_trade_fee() -> Decimal {
    Decimal::new(1, 1)
}

impl Default for ServiceFeeConfig {
    fn default() -> Self {
        ServiceFeeConfig {
            transfer_fee: default_transfer_fee(),
            trade_fee: default_trade_fee(),
        }
    }
}

/// Receipt logging switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiscConfig {
    #[serde(default = "default_true")]
    pub log_transfers: bool,
    #[serde(default = "default_true")]
    pub log_trades: bool,
}

fn default_true() -> bool {
    true
}

impl Default for MiscConfig {
    fn default() -> Self {
        MiscConfig {
            log_transfers: true,
            log_trades: true,
        }
    }
}

impl EconomyConfig {
    /// Load and validate a configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON for
    /// this schema, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&contents)
    }

    /// Parse and validate a JSON configuration
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        let config: EconomyConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vault.kind == VaultKind::External && self.vault.external_account.is_none() {
            return Err(ConfigError::invalid(
                "vault.external_account",
                "required when vault type is external",
            ));
        }
        if self.vault.autosave_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "vault.autosave_interval_secs",
                "must be greater than zero",
            ));
        }
        if self.service_fee.transfer_fee < Decimal::ZERO {
            return Err(ConfigError::invalid(
                "service_fee.transfer_fee",
                format!("{} is negative", self.service_fee.transfer_fee),
            ));
        }
        if self.service_fee.trade_fee < Decimal::ZERO {
            return Err(ConfigError::invalid(
                "service_fee.trade_fee",
                format!("{} is negative", self.service_fee.trade_fee),
            ));
        }
        Ok(())
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.vault.autosave_interval_secs)
    }
}
