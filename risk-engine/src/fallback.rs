//! Deterministic local risk rules
//!
//! Used whenever the external classifier is disabled, unavailable or returns
//! something unusable. Thresholds are compared as exact decimals.

use crate::types::{PaymentMethod, RiskTier};
use rust_decimal::Decimal;

/// Card amounts strictly below this are low risk
const CARD_LOW_CEILING: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Card amounts strictly above this are high risk
const CARD_HIGH_FLOOR: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// Classify a transaction using the local business rules.
///
/// - no payment method: `Medium`
/// - cash or PIX: `Low`
/// - card: `Low` below 100, `Medium` from 100 to 500 inclusive, `High` above 500
pub fn classify_locally(amount: Decimal, method: Option<PaymentMethod>) -> RiskTier {
    match method {
        None => RiskTier::Medium,
        Some(PaymentMethod::Cash) | Some(PaymentMethod::Pix) => RiskTier::Low,
        Some(PaymentMethod::Card) => {
            if amount < CARD_LOW_CEILING {
                RiskTier::Low
            } else if amount <= CARD_HIGH_FLOOR {
                RiskTier::Medium
            } else {
                RiskTier::High
            }
        }
    }
}
