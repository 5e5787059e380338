//! Service fee types
//!
//! This module defines the fee policy applied to a transaction and the
//! quantities derived from it by the fee calculator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who bears the service fee
///
/// - `Internal`: the fee is deducted from the transferred amount. Paying 100
///   at 1% costs the payer 100 and the recipient receives 99.
/// - `Additional`: the fee is charged on top. Paying 100 at 1% costs the
///   payer 101 and the recipient receives 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeePreference {
    #[default]
    Internal,
    Additional,
}

impl fmt::Display for FeePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeePreference::Internal => write!(f, "internal"),
            FeePreference::Additional => write!(f, "additional"),
        }
    }
}

impl FromStr for FeePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "internal" => Ok(FeePreference::Internal),
            "additional" => Ok(FeePreference::Additional),
            other => Err(format!("Unknown fee preference '{}'", other)),
        }
    }
}

/// Fee policy for one engine call
///
/// The effective fee is `clamp(amount * rate, min, max)`. An absent `max`
/// means the fee is unbounded above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePolicy {
    /// Fraction of the amount charged, e.g. `0.02` for 2%
    pub rate: Decimal,
    /// Lower bound of the fee
    pub min: Decimal,
    /// Upper bound of the fee, if any
    pub max: Option<Decimal>,
    /// Whether the fee comes out of the amount or on top of it
    pub preference: FeePreference,
}

impl FeePolicy {
    /// A policy charging `rate` with no bounds and the `Internal` preference
    pub fn flat(rate: Decimal) -> Self {
        FeePolicy {
            rate,
            min: Decimal::ZERO,
            max: None,
            preference: FeePreference::Internal,
        }
    }

    pub fn with_preference(mut self, preference: FeePreference) -> Self {
        self.preference = preference;
        self
    }

    pub fn with_bounds(mut self, min: Decimal, max: Option<Decimal>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Check the policy is internally consistent
    ///
    /// Returns a description of the first problem found.
    pub fn check(&self) -> Result<(), String> {
        if self.rate < Decimal::ZERO {
            return Err(format!("fee rate {} is negative", self.rate));
        }
        if self.min < Decimal::ZERO {
            return Err(format!("minimum fee {} is negative", self.min));
        }
        if let Some(max) = self.max {
            if max < self.min {
                return Err(format!(
                    "maximum fee {} is below minimum fee {}",
                    max, self.min
                ));
            }
        }
        Ok(())
    }
}

/// Caller-supplied overrides for a trade's fee policy
///
/// Any field left `None` falls back to the configured trade policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeOverrides {
    pub rate: Option<Decimal>,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
    pub preference: Option<FeePreference>,
}

impl FeeOverrides {
    pub fn rate(mut self, rate: Decimal) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn min(mut self, min: Decimal) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: Decimal) -> Self {
        self.max = Some(max);
        self
    }

    pub fn preference(mut self, preference: FeePreference) -> Self {
        self.preference = Some(preference);
        self
    }

    /// Resolve the overrides against a default rate
    pub fn resolve(&self, default_rate: Decimal) -> FeePolicy {
        FeePolicy {
            rate: self.rate.unwrap_or(default_rate),
            min: self.min.unwrap_or(Decimal::ZERO),
            max: self.max,
            preference: self.preference.unwrap_or_default(),
        }
    }
}

/// Output of the fee calculator for a single unit transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeBreakdown {
    /// Clamped service fee
    pub fee: Decimal,
    /// What the payer must supply
    pub payer_supplies: Decimal,
    /// What the recipient receives
    pub recipient_receives: Decimal,
}
