//! Account identifier type
//!
//! Accounts are owned by the external ledger. This core only ever holds
//! their identifiers, which act as lookup keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque 128-bit identifier naming one ledger-held balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Wrap an existing UUID
    pub const fn from_uuid(uuid: Uuid) -> Self {
        AccountId(uuid)
    }

    /// Generate a fresh random identifier
    pub fn random() -> Self {
        AccountId(Uuid::new_v4())
    }

    /// The underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for AccountId {
    fn from(uuid: Uuid) -> Self {
        AccountId(uuid)
    }
}

impl FromStr for AccountId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(AccountId)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_round_trip() {
        let text = "6f1c1a52-2d3b-4c4e-9a51-0b1f2e3d4c5b";
        let account: AccountId = text.parse().unwrap();
        assert_eq!(account.to_string(), text);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let account: AccountId = "  6f1c1a52-2d3b-4c4e-9a51-0b1f2e3d4c5b ".parse().unwrap();
        assert_eq!(
            account,
            AccountId::from_uuid(Uuid::parse_str("6f1c1a52-2d3b-4c4e-9a51-0b1f2e3d4c5b").unwrap())
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not-a-uuid".parse::<AccountId>().is_err());
    }

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(AccountId::random(), AccountId::random());
    }
}
