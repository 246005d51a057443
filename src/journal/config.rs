//! Journal configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Configuration for the journal client and its local calculations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Backend API base URL
    pub api_url: String,

    /// Bearer token for the backend, if required
    pub api_token: Option<String>,

    /// Minimum installment accepted on a partial payment plan
    pub minimum_installment: Decimal,

    /// Commission applied to a trade when none is recorded
    pub default_commission: Decimal,

    /// Account size used to derive risk percentage, if known
    pub account_size: Option<Decimal>,

    /// Confidence bounds for the pre-trade rating
    pub min_confidence: u8,
    pub max_confidence: u8,
}

impl JournalConfig {
    /// Load config from the environment, falling back to defaults.
    /// Reads `JOURNAL_API_URL`, `JOURNAL_API_TOKEN`, `JOURNAL_ACCOUNT_SIZE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("JOURNAL_API_URL") {
            config.api_url = url;
        }
        if let Ok(token) = std::env::var("JOURNAL_API_TOKEN") {
            config.api_token = Some(token);
        }
        if let Ok(size) = std::env::var("JOURNAL_ACCOUNT_SIZE") {
            config.account_size = size.parse().ok();
        }

        config
    }

    pub fn confidence_in_bounds(&self, confidence: u8) -> bool {
        (self.min_confidence..=self.max_confidence).contains(&confidence)
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.example-trading.edu".to_string(),
            api_token: None,
            minimum_installment: dec!(50.00),
            default_commission: Decimal::ZERO,
            account_size: None,
            min_confidence: 1,
            max_confidence: 10,
        }
    }
}
