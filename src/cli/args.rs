use crate::config::EconomyConfig;
use crate::types::ConfigError;
use clap::Parser;
use std::path::PathBuf;

/// Replay economy operations and print final balances
#[derive(Parser, Debug)]
#[command(name = "economy-core")]
#[command(about = "Replay transfers and trades through the economy core", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing operations
    #[arg(value_name = "INPUT", help = "Path to the operations CSV file")]
    pub input_file: PathBuf,

    /// JSON configuration file
    #[arg(
        long = "config",
        value_name = "FILE",
        help = "Path to a JSON config file (defaults apply when omitted)"
    )]
    pub config: Option<PathBuf>,

    /// Override for the internal vault snapshot file
    #[arg(
        long = "vault-store",
        value_name = "FILE",
        help = "Internal vault snapshot file, overriding the config"
    )]
    pub vault_store: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        default_value = "info",
        help = "Log filter when RUST_LOG is unset, e.g. 'warn' or 'economy_core=debug'"
    )]
    pub log_level: String,
}

impl CliArgs {
    /// Build the effective configuration
    ///
    /// Loads `--config` if given, otherwise uses defaults, then applies
    /// `--vault-store`.
    pub fn load_config(&self) -> Result<EconomyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => EconomyConfig::load(path)?,
            None => EconomyConfig::default(),
        };
        if let Some(path) = &self.vault_store {
            config.vault.data_file = path.clone();
        }
        Ok(config)
    }
}
