use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::Journal;

const UNKNOWN: &str = "unknown";

/// Count and gross amount for one payment type or status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bucket {
    pub count: u64,
    pub amount: f64,
}

impl Bucket {
    fn add(&mut self, amount: f64) {
        self.count += 1;
        self.amount += amount;
    }
}

/// Totals over every journal in a search window.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalSummary {
    pub total_transactions: u64,
    pub total_amount: f64,
    pub by_payment_type: BTreeMap<String, Bucket>,
    pub by_status: BTreeMap<String, Bucket>,
    pub transactions: Vec<Journal>,
}

/// One page of journals with its gross total, as shown to callers.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalPage {
    pub total: u64,
    pub total_amount: f64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
    pub transactions: Vec<Journal>,
}

/// Sum of gross amounts. Journals without an amount count as zero.
pub fn total_amount(journals: &[Journal]) -> f64 {
    journals.iter().map(Journal::gross_amount).sum()
}

/// Number of pages of `limit` needed for `total` records.
pub fn total_pages(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(u64::from(limit))
}

/// Aggregate journals by payment type and status.
///
/// `total_transactions` is the server-reported total. Journals without
/// transaction metadata are kept in `transactions` but skipped in the buckets.
pub fn summarize(total: u64, transactions: Vec<Journal>) -> JournalSummary {
    let mut summary = JournalSummary {
        total_transactions: total,
        ..JournalSummary::default()
    };

    for tx in transactions.iter().filter_map(Journal::transaction) {
        let amount = tx.gross_amount.unwrap_or(0.0);
        let payment_type = tx.payment_type.as_deref().unwrap_or(UNKNOWN);
        let status = tx.status.as_deref().unwrap_or(UNKNOWN);

        summary.total_amount += amount;
        summary
            .by_payment_type
            .entry(payment_type.to_string())
            .or_default()
            .add(amount);
        summary
            .by_status
            .entry(status.to_string())
            .or_default()
            .add(amount);
    }

    summary.transactions = transactions;
    summary
}
