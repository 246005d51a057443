//! Payment-plan logic for event and master-course registrations.

mod balance;

pub use balance::{BalanceTracker, PaymentError, PaymentPhase};
