//! Backend API client, wire types, and submission-state tracking.

mod client;
mod request;
mod types;

pub use client::JournalClient;
pub use request::{AlreadyInFlight, RequestGuard, RequestState};
pub use types::*;
