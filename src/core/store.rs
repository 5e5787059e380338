//! Durable store for the internal vault balance
//!
//! A single JSON record holding one decimal field:
//!
//! ```json
//! { "internal_vault_balance": "1234.5" }
//! ```
//!
//! Reads never fail: a missing, empty or corrupt file loads as `None` and the
//! vault starts from zero. Writes go to a sibling temp file which is then
//! renamed over the target, so an interrupted save leaves the previous
//! snapshot intact.

use crate::core::traits::VaultStore;
use crate::types::StoreError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct VaultSnapshot {
    internal_vault_balance: Decimal,
}

/// JSON file backed [`VaultStore`]
#[derive(Debug, Clone)]
pub struct JsonVaultStore {
    path: PathBuf,
}

impl JsonVaultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonVaultStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl VaultStore for JsonVaultStore {
    fn load(&self) -> Option<Decimal> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "System vault snapshot not found");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read system vault snapshot");
                return None;
            }
        };

        if contents.trim().is_empty() {
            return None;
        }

        match serde_json::from_str::<VaultSnapshot>(&contents) {
            Ok(snapshot) => Some(snapshot.internal_vault_balance),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt system vault snapshot");
                None
            }
        }
    }

    fn save(&self, balance: Decimal) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&VaultSnapshot {
            internal_vault_balance: balance,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let temp = self.temp_path();
        fs::write(&temp, json).map_err(|e| StoreError::io(&temp, e))?;
        fs::rename(&temp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;

        debug!(path = %self.path.display(), %balance, "Saved system vault snapshot");
        Ok(())
    }
}
