//! Economy core replay CLI
//!
//! Replays transfers and trades from a CSV file through the economy service
//! and prints the final balances.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > balances.csv
//! cargo run -- --config ecore.json operations.csv > balances.csv
//! cargo run -- --vault-store /tmp/vault.json --log-level debug operations.csv > balances.csv
//! ```
//!
//! Logs go to stderr; stdout carries only the balances CSV.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (bad arguments or config, unreadable input, fatal engine error)

use economy_core::{cli, logging, replay};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    let args = cli::parse_args();

    if let Err(e) = logging::init(&args.log_level) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            process::exit(1);
        }
    };

    let mut output = std::io::stdout();
    if let Err(e) = replay::replay(&config, &args.input_file, &mut output).await {
        error!(error = %e, "Replay failed");
        process::exit(1);
    }
}
