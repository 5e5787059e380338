//! Service fee calculation
//!
//! Pure arithmetic with no side effects. The only failure mode is overflow,
//! reported as `None`. Input validation (non-negative amounts, consistent
//! bounds) is done by the engine.

use crate::types::{FeeBreakdown, FeePolicy, FeePreference};
use rust_decimal::Decimal;

/// Compute the fee and derived quantities for one unit transaction
///
/// The raw fee `amount * rate` is clamped into `[policy.min, policy.max]`.
/// Clamping is two-sided, so a zero amount still pays `policy.min`.
///
/// - `Internal`: payer supplies `amount`, recipient receives `amount - fee`
/// - `Additional`: payer supplies `amount + fee`, recipient receives `amount`
///
/// Returns `None` if any intermediate value overflows `Decimal`.
pub fn compute(amount: Decimal, policy: &FeePolicy) -> Option<FeeBreakdown> {
    let fee = clamp_fee(amount.checked_mul(policy.rate)?, policy.min, policy.max);

    let breakdown = match policy.preference {
        FeePreference::Internal => FeeBreakdown {
            fee,
            payer_supplies: amount,
            recipient_receives: amount.checked_sub(fee)?,
        },
        FeePreference::Additional => FeeBreakdown {
            fee,
            payer_supplies: amount.checked_add(fee)?,
            recipient_receives: amount,
        },
    };
    Some(breakdown)
}

fn clamp_fee(raw: Decimal, min: Decimal, max: Option<Decimal>) -> Decimal {
    let fee = raw.max(min);
    match max {
        Some(max) => fee.min(max),
        None => fee,
    }
}
