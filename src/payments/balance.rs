//! Installment balance tracking for event and master-course registrations.
//!
//! The backend re-enforces every rule here and is the source of truth; this
//! module is the optimistic pre-check that rejects obviously invalid
//! amounts before any request is made.

use rust_decimal::Decimal;
use thiserror::Error;

/// Where a registration sits in its payment plan.
///
/// `FinalPaymentDue` is entered when the remaining balance drops below the
/// minimum installment but is not yet zero; at that point only the exact
/// remainder is accepted. `FullyPaid` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentPhase {
    Partial,
    FinalPaymentDue,
    FullyPaid,
}

/// Amount validation failures. Messages carry the exact figures so they can
/// be shown to the user as-is.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("this registration is already fully paid")]
    AlreadyPaid,

    #[error("payment amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("minimum payment amount is {minimum}, got {amount}")]
    BelowMinimum { amount: Decimal, minimum: Decimal },

    #[error("payment of {amount} exceeds the remaining balance of {remaining}")]
    ExceedsBalance { amount: Decimal, remaining: Decimal },

    #[error("the remaining balance of {remaining} must be paid in full; partial amounts are no longer accepted")]
    FinalPaymentMismatch { amount: Decimal, remaining: Decimal },
}

/// Tracks the remaining balance of one registration against the configured
/// minimum installment. All comparisons round both operands to two decimal
/// places first, so float-shaped inputs like 99.999999999 compare equal to
/// 100.00.
#[derive(Debug, Clone, Copy)]
pub struct BalanceTracker {
    remaining: Decimal,
    minimum_installment: Decimal,
}

impl BalanceTracker {
    pub fn new(remaining: Decimal, minimum_installment: Decimal) -> Self {
        Self {
            remaining: remaining.max(Decimal::ZERO),
            minimum_installment,
        }
    }

    pub fn remaining(&self) -> Decimal {
        self.remaining
    }

    /// Current phase of the payment plan.
    pub fn phase(&self) -> PaymentPhase {
        let remaining = self.remaining.round_dp(2);
        if remaining.is_zero() {
            PaymentPhase::FullyPaid
        } else if remaining < self.minimum_installment.round_dp(2) {
            PaymentPhase::FinalPaymentDue
        } else {
            PaymentPhase::Partial
        }
    }

    /// Check a proposed payment amount against the phase rules:
    /// `minimum <= amount <= remaining` while partial, and exactly the
    /// remaining balance once in final-payment state.
    pub fn validate_amount(&self, amount: Decimal) -> Result<(), PaymentError> {
        let amount_r = amount.round_dp(2);
        let remaining_r = self.remaining.round_dp(2);

        if amount_r <= Decimal::ZERO {
            return Err(PaymentError::NonPositiveAmount(amount));
        }

        match self.phase() {
            PaymentPhase::FullyPaid => Err(PaymentError::AlreadyPaid),
            PaymentPhase::FinalPaymentDue => {
                if amount_r != remaining_r {
                    Err(PaymentError::FinalPaymentMismatch {
                        amount: amount_r,
                        remaining: remaining_r,
                    })
                } else {
                    Ok(())
                }
            }
            PaymentPhase::Partial => {
                if amount_r < self.minimum_installment.round_dp(2) {
                    Err(PaymentError::BelowMinimum {
                        amount: amount_r,
                        minimum: self.minimum_installment.round_dp(2),
                    })
                } else if amount_r > remaining_r {
                    Err(PaymentError::ExceedsBalance {
                        amount: amount_r,
                        remaining: remaining_r,
                    })
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Apply a validated payment, returning the tracker for the new
    /// balance. The balance never goes negative.
    pub fn apply_payment(&self, amount: Decimal) -> Result<Self, PaymentError> {
        self.validate_amount(amount)?;
        Ok(Self {
            remaining: (self.remaining - amount).max(Decimal::ZERO),
            minimum_installment: self.minimum_installment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tracker(remaining: Decimal) -> BalanceTracker {
        BalanceTracker::new(remaining, dec!(50))
    }

    #[test]
    fn test_partial_phase_bounds() {
        let t = tracker(dec!(500));
        assert_eq!(t.phase(), PaymentPhase::Partial);

        assert!(matches!(
            t.validate_amount(dec!(49.99)),
            Err(PaymentError::BelowMinimum { .. })
        ));
        assert!(matches!(
            t.validate_amount(dec!(500.01)),
            Err(PaymentError::ExceedsBalance { .. })
        ));
        assert!(t.validate_amount(dec!(50.00)).is_ok());
        assert!(t.validate_amount(dec!(500.00)).is_ok());
    }

    #[test]
    fn test_final_payment_requires_exact_amount() {
        let t = tracker(dec!(42.37));
        assert_eq!(t.phase(), PaymentPhase::FinalPaymentDue);

        assert!(matches!(
            t.validate_amount(dec!(42.36)),
            Err(PaymentError::FinalPaymentMismatch { .. })
        ));
        assert!(matches!(
            t.validate_amount(dec!(50.00)),
            Err(PaymentError::FinalPaymentMismatch { .. })
        ));
        assert!(t.validate_amount(dec!(42.37)).is_ok());
    }

    #[test]
    fn test_final_payment_error_names_required_figure() {
        let t = tracker(dec!(42.37));
        let err = t.validate_amount(dec!(40)).unwrap_err();
        assert!(err.to_string().contains("42.37"));
    }

    #[test]
    fn test_rounding_before_comparison() {
        // 42.369999999 rounds to 42.37 and must be accepted.
        let t = tracker(dec!(42.37));
        assert!(t.validate_amount(dec!(42.369999999)).is_ok());

        // A remaining balance that is float dust above the minimum stays
        // in the partial phase.
        let t = BalanceTracker::new(dec!(50.0000001), dec!(50));
        assert_eq!(t.phase(), PaymentPhase::Partial);
    }

    #[test]
    fn test_phase_transitions_to_fully_paid() {
        let t = tracker(dec!(90));
        assert_eq!(t.phase(), PaymentPhase::Partial);

        // Pay 50: remaining 40, below the 50 minimum -> final payment due.
        let t = t.apply_payment(dec!(50)).expect("valid installment");
        assert_eq!(t.remaining(), dec!(40));
        assert_eq!(t.phase(), PaymentPhase::FinalPaymentDue);

        // Only the exact remainder closes it out.
        let t = t.apply_payment(dec!(40)).expect("exact final payment");
        assert_eq!(t.phase(), PaymentPhase::FullyPaid);

        assert_eq!(
            t.validate_amount(dec!(10)),
            Err(PaymentError::AlreadyPaid)
        );
    }

    #[test]
    fn test_balance_never_negative() {
        let t = tracker(dec!(42.37));
        let t = t.apply_payment(dec!(42.37)).expect("exact final payment");
        assert_eq!(t.remaining(), Decimal::ZERO);
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let t = tracker(dec!(500));
        assert!(matches!(
            t.validate_amount(Decimal::ZERO),
            Err(PaymentError::NonPositiveAmount(_))
        ));
        assert!(matches!(
            t.validate_amount(dec!(-10)),
            Err(PaymentError::NonPositiveAmount(_))
        ));
    }
}
