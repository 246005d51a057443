//! Registration model for event / master-course payment plans.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the attendee chose to pay at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Full,
    Partial,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Full => "full",
            PaymentMode::Partial => "partial",
        }
    }
}

/// One successful installment on a registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: String,
    pub amount: Decimal,
    pub method: String,
    #[serde(default)]
    pub description: String,
    pub paid_at: DateTime<Utc>,
}

/// An event or master-course registration with its payment plan state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: String,

    pub event_id: String,

    pub email: String,

    #[serde(default)]
    pub attendee_name: String,

    pub payment_mode: PaymentMode,

    /// Total owed for the registration
    pub total_amount: Decimal,

    /// Sum of successful payments so far
    pub total_paid: Decimal,

    #[serde(default)]
    pub payments: Vec<PaymentRecord>,

    pub created_at: DateTime<Utc>,
}

impl Registration {
    /// Remaining balance, never negative.
    pub fn remaining_balance(&self) -> Decimal {
        (self.total_amount - self.total_paid).max(Decimal::ZERO)
    }

    /// Terminal state: nothing left to pay.
    pub fn is_fully_paid(&self) -> bool {
        self.remaining_balance().round_dp(2).is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn registration(total: Decimal, paid: Decimal) -> Registration {
        Registration {
            id: "r1".to_string(),
            event_id: "evt1".to_string(),
            email: "student@example.com".to_string(),
            attendee_name: String::new(),
            payment_mode: PaymentMode::Partial,
            total_amount: total,
            total_paid: paid,
            payments: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_remaining_balance_never_negative() {
        let reg = registration(dec!(500), dec!(600));
        assert_eq!(reg.remaining_balance(), Decimal::ZERO);
        assert!(reg.is_fully_paid());
    }

    #[test]
    fn test_fully_paid_after_rounding() {
        // A residual below half a cent rounds away; a full cent does not.
        let cent_short = registration(dec!(100), dec!(99.99));
        assert!(!cent_short.is_fully_paid());

        let dust = registration(dec!(100), dec!(99.999999999));
        assert!(dust.is_fully_paid());
    }
}
