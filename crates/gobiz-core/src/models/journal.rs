//! Journal records returned by `POST /journals/search`.
//!
//! Only the fields the summaries read are typed; everything else is kept in
//! `extra` so records round-trip to callers unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One page of search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalSearchResponse {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub results: Vec<Journal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Journal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JournalMetadata>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionDetails>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Journal {
    pub fn transaction(&self) -> Option<&TransactionDetails> {
        self.metadata.as_ref().and_then(|m| m.transaction.as_ref())
    }

    /// Gross amount, counting a missing amount as zero.
    pub fn gross_amount(&self) -> f64 {
        self.transaction()
            .and_then(|t| t.gross_amount)
            .unwrap_or(0.0)
    }
}
