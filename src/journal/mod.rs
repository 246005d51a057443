//! Journal logic: P&L preview, risk sizing, and the close-trade lifecycle.

mod config;
mod lifecycle;
pub mod pnl;
pub mod risk;

pub use config::JournalConfig;
pub use lifecycle::{CloseForm, CloseValidationError};
pub use pnl::{PnlBreakdown, PnlInputs};
