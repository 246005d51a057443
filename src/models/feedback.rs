//! Mentor feedback attached to a trade. Read-only from the client side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A mentor's review of one journaled trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: String,

    pub trade_id: String,

    #[serde(default)]
    pub mentor_name: String,

    #[serde(default)]
    pub strengths: Vec<String>,

    #[serde(default)]
    pub improvements: Vec<String>,

    #[serde(default)]
    pub entry_analysis: String,

    #[serde(default)]
    pub exit_analysis: String,

    #[serde(default)]
    pub recommendations: String,

    pub created_at: DateTime<Utc>,
}
