use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Page size used by a single search when the caller does not choose one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

const TIME_FIELD: &str = "metadata.transaction.transaction_time";
const MERCHANT_FIELD: &str = "metadata.transaction.merchant_id";
const STATUS_FIELD: &str = "metadata.transaction.status";
const PAYMENT_TYPE_FIELD: &str = "metadata.transaction.payment_type";
const SOURCE_FIELDS: [&str; 2] = ["metadata.source", "metadata.gopay.source"];

/// Transaction statuses that count as money received or returned.
pub const ALLOWED_STATUSES: [&str; 4] = ["settlement", "capture", "refund", "partial_refund"];

pub const ALLOWED_PAYMENT_TYPES: [&str; 5] = [
    "qris",
    "gopay",
    "offline_credit_card",
    "offline_debit_card",
    "credit_card",
];

/// Promotional sources excluded from merchant revenue.
pub const EXCLUDED_SOURCES: [&str; 3] = ["GOSAVE_ONLINE", "GoSave", "GODEALS_ONLINE"];

const INCOMING_CATEGORIES: [&str; 2] = ["transaction_share", "action"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Offset pagination as GoBiz expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub from: u64,
    pub size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            from: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(from: u64, size: u32) -> Self {
        Self { from, size }
    }

    /// Pagination for a 1-based page number. Pages below 1 are treated as 1.
    pub fn for_page(page: u32, limit: u32) -> Self {
        let page = page.max(1);
        Self {
            from: u64::from(page - 1) * u64::from(limit),
            size: limit,
        }
    }
}

/// Timestamp format GoBiz compares against, e.g. `2024-05-01T00:00:00.000Z`.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Build the `POST /journals/search` body for one page of a merchant's
/// transactions inside `[from_date, to_date]`.
pub fn build_search_payload(
    from_date: &DateTime<Utc>,
    to_date: &DateTime<Utc>,
    merchant_id: &str,
    pagination: Pagination,
    sort: SortOrder,
) -> Value {
    let excluded_sources: Vec<Value> = SOURCE_FIELDS
        .iter()
        .map(|field| {
            json!({
                "field": field,
                "op": "in",
                "value": EXCLUDED_SOURCES,
            })
        })
        .collect();

    json!({
        "from": pagination.from,
        "size": pagination.size,
        "sort": {
            "time": { "order": sort }
        },
        "included_categories": {
            "incoming": INCOMING_CATEGORIES
        },
        "query": [{
            "op": "and",
            "clauses": [
                {
                    "op": "not",
                    "clauses": [{ "op": "or", "clauses": excluded_sources }]
                },
                {
                    "field": STATUS_FIELD,
                    "op": "in",
                    "value": ALLOWED_STATUSES,
                },
                {
                    "op": "or",
                    "clauses": [{
                        "op": "or",
                        "clauses": [{
                            "field": PAYMENT_TYPE_FIELD,
                            "op": "in",
                            "value": ALLOWED_PAYMENT_TYPES,
                        }]
                    }]
                },
                {
                    "field": TIME_FIELD,
                    "op": "gte",
                    "value": format_timestamp(from_date),
                },
                {
                    "field": TIME_FIELD,
                    "op": "lte",
                    "value": format_timestamp(to_date),
                },
                {
                    "field": MERCHANT_FIELD,
                    "op": "equal",
                    "value": merchant_id,
                }
            ]
        }]
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 31, 23, 59, 59).unwrap(),
        )
    }

    fn clauses(payload: &Value) -> &Vec<Value> {
        payload["query"][0]["clauses"].as_array().expect("clauses array")
    }

    fn clause_for<'a>(payload: &'a Value, field: &str, op: &str) -> &'a Value {
        clauses(payload)
            .iter()
            .find(|c| c["field"] == field && c["op"] == op)
            .unwrap_or_else(|| panic!("no {op} clause on {field}"))
    }

    #[test]
    fn test_time_window_and_merchant() {
        let (from, to) = window();
        let payload = build_search_payload(&from, &to, "M-42", Pagination::default(), SortOrder::Desc);

        assert_eq!(payload["query"][0]["op"], "and");
        assert_eq!(clause_for(&payload, TIME_FIELD, "gte")["value"], "2024-05-01T00:00:00.000Z");
        assert_eq!(clause_for(&payload, TIME_FIELD, "lte")["value"], "2024-05-31T23:59:59.000Z");
        assert_eq!(clause_for(&payload, MERCHANT_FIELD, "equal")["value"], "M-42");
    }

    #[test]
    fn test_status_and_payment_filters() {
        let (from, to) = window();
        let payload = build_search_payload(&from, &to, "M-42", Pagination::default(), SortOrder::Desc);

        assert_eq!(
            clause_for(&payload, STATUS_FIELD, "in")["value"],
            json!(["settlement", "capture", "refund", "partial_refund"])
        );

        let payment = clauses(&payload)
            .iter()
            .find(|c| c["op"] == "or")
            .expect("payment type group");
        let inner = &payment["clauses"][0]["clauses"][0];
        assert_eq!(inner["field"], PAYMENT_TYPE_FIELD);
        assert_eq!(inner["value"].as_array().unwrap().len(), ALLOWED_PAYMENT_TYPES.len());
    }

    #[test]
    fn test_excluded_sources_are_negated() {
        let (from, to) = window();
        let payload = build_search_payload(&from, &to, "M-42", Pagination::default(), SortOrder::Desc);

        let negated = clauses(&payload)
            .iter()
            .find(|c| c["op"] == "not")
            .expect("negated clause");
        let alternatives = &negated["clauses"][0];
        assert_eq!(alternatives["op"], "or");
        let fields: Vec<&str> = alternatives["clauses"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, SOURCE_FIELDS);
        assert_eq!(alternatives["clauses"][0]["value"], json!(EXCLUDED_SOURCES));
    }

    #[test]
    fn test_pagination_and_sort() {
        let (from, to) = window();
        let payload = build_search_payload(&from, &to, "M-42", Pagination::new(200, 100), SortOrder::Asc);
        assert_eq!(payload["from"], 200);
        assert_eq!(payload["size"], 100);
        assert_eq!(payload["sort"]["time"]["order"], "asc");

        let default = build_search_payload(&from, &to, "M-42", Pagination::default(), SortOrder::default());
        assert_eq!(default["from"], 0);
        assert_eq!(default["size"], 20);
        assert_eq!(default["sort"]["time"]["order"], "desc");
        assert_eq!(default["included_categories"]["incoming"], json!(["transaction_share", "action"]));
    }

    #[test]
    fn test_for_page() {
        assert_eq!(Pagination::for_page(1, 20), Pagination::new(0, 20));
        assert_eq!(Pagination::for_page(3, 50), Pagination::new(100, 50));
        assert_eq!(Pagination::for_page(0, 20), Pagination::new(0, 20));
    }
}
