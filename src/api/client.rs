//! HTTP client for the journal/payments backend.
//!
//! The backend is the authoritative computer of persisted derived fields;
//! every mutating call here returns what the backend stored. Business-rule
//! rejections carry a `message` body that is surfaced verbatim; anything
//! unstructured falls back to a generic message with the status code. No
//! retry logic: a failed call is reported and the user decides.

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::debug;

use crate::models::{Feedback, Registration, Trade};

use super::types::*;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the trading-education backend.
pub struct JournalClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl JournalClient {
    pub fn new(base_url: String, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Turn a non-success response into the backend's own error message
    /// when one is present, or a generic fallback otherwise.
    async fn check(response: Response, what: &str) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if let Ok(err) = serde_json::from_str::<ApiErrorBody>(&body) {
            if !err.message.is_empty() {
                anyhow::bail!("{}", err.message);
            }
        }
        anyhow::bail!("{} request failed with status {}", what, status);
    }

    /// Create an open trade. POST /trades
    pub async fn create_trade(&self, request: &CreateTradeRequest) -> Result<Trade> {
        let url = format!("{}/trades", self.base_url);
        debug!(url = %url, symbol = %request.symbol, "Creating trade");

        let response = self
            .authorize(self.client.post(&url))
            .json(request)
            .send()
            .await
            .context("Failed to submit trade")?;

        Self::check(response, "Create trade")
            .await?
            .json()
            .await
            .context("Failed to parse created trade")
    }

    /// Fetch one trade. GET /trades/{id}
    pub async fn get_trade(&self, id: &str) -> Result<Trade> {
        let url = format!("{}/trades/{}", self.base_url, id);
        debug!(url = %url, "Fetching trade");

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .context("Failed to fetch trade")?;

        Self::check(response, "Trade")
            .await?
            .json()
            .await
            .context("Failed to parse trade")
    }

    /// List the caller's trades, newest first. GET /trades
    pub async fn list_trades(&self, limit: Option<u32>) -> Result<Vec<Trade>> {
        let mut url = format!("{}/trades", self.base_url);
        if let Some(l) = limit {
            url = format!("{}?limit={}", url, l.min(500));
        }
        debug!(url = %url, "Listing trades");

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .context("Failed to list trades")?;

        Self::check(response, "Trades")
            .await?
            .json()
            .await
            .context("Failed to parse trades")
    }

    /// Close an open trade. POST /trades/{id}/close
    ///
    /// On rejection the trade stays open on the backend and the caller's
    /// copy is left untouched.
    pub async fn close_trade(&self, id: &str, request: &CloseTradeRequest) -> Result<Trade> {
        let url = format!("{}/trades/{}/close", self.base_url, id);
        debug!(url = %url, reason = %request.exit_reason_type, "Closing trade");

        let response = self
            .authorize(self.client.post(&url))
            .json(request)
            .send()
            .await
            .context("Failed to submit close")?;

        Self::check(response, "Close trade")
            .await?
            .json()
            .await
            .context("Failed to parse closed trade")
    }

    /// Delete a trade. DELETE /trades/{id}
    pub async fn delete_trade(&self, id: &str) -> Result<()> {
        let url = format!("{}/trades/{}", self.base_url, id);
        debug!(url = %url, "Deleting trade");

        let response = self
            .authorize(self.client.delete(&url))
            .send()
            .await
            .context("Failed to delete trade")?;

        Self::check(response, "Delete trade").await?;
        Ok(())
    }

    /// Fetch mentor feedback for a trade. GET /trades/{id}/feedback
    pub async fn get_feedback(&self, trade_id: &str) -> Result<Vec<Feedback>> {
        let url = format!("{}/trades/{}/feedback", self.base_url, trade_id);
        debug!(url = %url, "Fetching feedback");

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .context("Failed to fetch feedback")?;

        Self::check(response, "Feedback")
            .await?
            .json()
            .await
            .context("Failed to parse feedback")
    }

    /// Fetch a registration by id. GET /registrations/{id}
    pub async fn get_registration(&self, id: &str) -> Result<Registration> {
        let url = format!("{}/registrations/{}", self.base_url, id);
        debug!(url = %url, "Fetching registration");

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .context("Failed to fetch registration")?;

        Self::check(response, "Registration")
            .await?
            .json()
            .await
            .context("Failed to parse registration")
    }

    /// Search registrations by email or id, optionally scoped to an event.
    /// GET /registrations/search
    pub async fn find_registrations(&self, query: &RegistrationQuery) -> Result<Vec<Registration>> {
        let url = format!("{}/registrations/search", self.base_url);
        debug!(url = %url, "Searching registrations");

        let response = self
            .authorize(self.client.get(&url))
            .query(query)
            .send()
            .await
            .context("Failed to search registrations")?;

        Self::check(response, "Registration search")
            .await?
            .json()
            .await
            .context("Failed to parse registrations")
    }

    /// Submit an installment. POST /registrations/{id}/payments
    ///
    /// Success yields the hosted checkout redirect; a business-rule
    /// rejection (minimum amount, balance exceeded) comes back as the
    /// backend's own message.
    pub async fn submit_payment(
        &self,
        registration_id: &str,
        request: &PaymentRequest,
    ) -> Result<CheckoutResponse> {
        let url = format!("{}/registrations/{}/payments", self.base_url, registration_id);
        debug!(url = %url, amount = %request.amount, "Submitting payment");

        let response = self
            .authorize(self.client.post(&url))
            .json(request)
            .send()
            .await
            .context("Failed to submit payment")?;

        Self::check(response, "Payment")
            .await?
            .json()
            .await
            .context("Failed to parse checkout response")
    }
}
