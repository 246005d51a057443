//! Wire types for the journal/payments backend API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::ExitDetails;

/// Body for POST /trades.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTradeRequest {
    pub symbol: String,
    pub market: String,
    pub direction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_type: Option<String>,
    pub setup: String,
    pub entry_price: Decimal,
    pub position_size: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<Decimal>,
    pub entry_time: DateTime<Utc>,
    pub trade_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_percentage: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub emotion_before: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pre_trade_analysis: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub post_trade_notes: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Screenshot URLs or paths attached to the entry
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<String>,
    /// Client-generated key so a resubmitted create is not duplicated
    pub idempotency_key: String,
}

/// Body for POST /trades/{id}/close.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseTradeRequest {
    pub exit_price: Decimal,
    pub exit_time: DateTime<Utc>,
    pub exit_reason_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub exit_reason_notes: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub exit_emotion_state: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub lessons_learned_on_exit: String,
    pub would_repeat_trade: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_premium: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlying_price_at_exit: Option<Decimal>,
}

impl CloseTradeRequest {
    /// Build the close body from validated exit details. Options submit the
    /// premium under its own field as well as the generic exit price.
    pub fn from_exit(details: &ExitDetails, is_option: bool) -> Self {
        Self {
            exit_price: details.exit_price,
            exit_time: details.exit_time,
            exit_reason_type: details.reason.as_str().to_string(),
            exit_reason_notes: details.notes.clone(),
            exit_emotion_state: details.emotional_state.clone(),
            lessons_learned_on_exit: details.lessons_learned.clone(),
            would_repeat_trade: details.would_repeat,
            exit_premium: is_option.then_some(details.exit_price),
            underlying_price_at_exit: details.underlying_price_at_exit,
        }
    }
}

/// Body for POST /registrations/{id}/payments.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub payment_method: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Successful payment submission: the hosted checkout redirect.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub checkout_url: String,
}

/// Parameters for the registration search endpoint. Either email or
/// registration id, optionally scoped to an event.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

/// Error body the backend uses for business-rule rejections.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}
