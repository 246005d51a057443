//! Trade lifecycle: validation for the single Open -> Closed transition.
//!
//! Closed is terminal; there is no reopen. All validation happens before
//! any network call, and a rejected close leaves the trade untouched.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{ExitDetails, ExitReason, Trade};

/// Client-side validation failures that block a close submission. No
/// request is made when any of these fire.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CloseValidationError {
    #[error("trade {0} is already closed")]
    AlreadyClosed(String),

    #[error("exit price is required to close this trade")]
    MissingExitPrice,

    #[error("exit premium is required to close an options trade")]
    MissingExitPremium,

    #[error("exit price must be a positive number, got {0}")]
    InvalidExitPrice(Decimal),

    #[error("an exit reason must be selected")]
    MissingExitReason,

    #[error("please answer whether you would repeat this trade")]
    MissingWouldRepeat,

    #[error("exit time {exit} is before entry time {entry}")]
    ExitBeforeEntry {
        entry: DateTime<Utc>,
        exit: DateTime<Utc>,
    },
}

/// Raw close-form input as the user supplied it. Everything optional;
/// [`CloseForm::validate`] decides what is actually required for the trade
/// at hand.
#[derive(Debug, Clone, Default)]
pub struct CloseForm {
    /// Exit price, or exit premium for options
    pub exit_price: Option<Decimal>,
    /// Defaults to now when absent
    pub exit_time: Option<DateTime<Utc>>,
    pub reason: Option<ExitReason>,
    pub notes: String,
    pub emotional_state: String,
    pub lessons_learned: String,
    /// Mandatory reflection answer; `None` blocks submission
    pub would_repeat: Option<bool>,
    /// Informational, options only
    pub underlying_price_at_exit: Option<Decimal>,
}

impl CloseForm {
    /// Validate the form against the trade being closed, producing the
    /// exit details to submit. Options require an exit premium; everything
    /// else requires an exit price. The would-repeat answer and exit
    /// reason are mandatory for both.
    pub fn validate(self, trade: &Trade) -> Result<ExitDetails, CloseValidationError> {
        if !trade.is_open() {
            return Err(CloseValidationError::AlreadyClosed(trade.id.clone()));
        }

        let exit_price = match self.exit_price {
            Some(p) => p,
            None if trade.instrument.is_option() => {
                return Err(CloseValidationError::MissingExitPremium)
            }
            None => return Err(CloseValidationError::MissingExitPrice),
        };
        if exit_price <= Decimal::ZERO {
            return Err(CloseValidationError::InvalidExitPrice(exit_price));
        }

        let reason = self.reason.ok_or(CloseValidationError::MissingExitReason)?;
        let would_repeat = self
            .would_repeat
            .ok_or(CloseValidationError::MissingWouldRepeat)?;

        let exit_time = self.exit_time.unwrap_or_else(Utc::now);
        if exit_time < trade.entry_time {
            return Err(CloseValidationError::ExitBeforeEntry {
                entry: trade.entry_time,
                exit: exit_time,
            });
        }

        Ok(ExitDetails {
            exit_price,
            exit_time,
            reason,
            notes: self.notes,
            emotional_state: self.emotional_state,
            lessons_learned: self.lessons_learned,
            would_repeat,
            underlying_price_at_exit: if trade.instrument.is_option() {
                self.underlying_price_at_exit
            } else {
                None
            },
        })
    }
}
