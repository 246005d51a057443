//! Data models for trades, registrations, and mentor feedback.

mod feedback;
mod registration;
mod trade;

pub use feedback::Feedback;
pub use registration::{PaymentMode, PaymentRecord, Registration};
pub use trade::{
    Direction, ExitDetails, ExitReason, Instrument, Market, OptionType, Trade, TradeResults,
};
