use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use reqwest::Method;
use tracing::{debug, info, warn};

use crate::api::{ApiError, RequestExecutor, Result};
use crate::models::JournalSearchResponse;

use super::query::{build_search_payload, Pagination, SortOrder};
use super::summary::{self, JournalPage, JournalSummary};

const SEARCH_ENDPOINT: &str = "/journals/search";

/// Transaction journal queries for an authenticated user.
#[derive(Clone)]
pub struct JournalSearch {
    executor: RequestExecutor,
    page_size: u32,
    max_pages: u32,
}

impl JournalSearch {
    pub fn new(executor: RequestExecutor, page_size: u32, max_pages: u32) -> Self {
        Self {
            executor,
            page_size: page_size.max(1),
            max_pages: max_pages.max(1),
        }
    }

    /// Fetch one page of a merchant's journals in `[from_date, to_date]`.
    pub async fn search_journals(
        &self,
        user_id: &str,
        merchant_id: &str,
        from_date: &DateTime<Utc>,
        to_date: &DateTime<Utc>,
        pagination: Pagination,
        sort: SortOrder,
    ) -> Result<JournalSearchResponse> {
        let payload = build_search_payload(from_date, to_date, merchant_id, pagination, sort);
        let response = self
            .executor
            .call(user_id, SEARCH_ENDPOINT, Method::POST, Some(&payload))
            .await?;
        let parsed: JournalSearchResponse = serde_json::from_value(response).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse journal search response: {}", e))
        })?;
        debug!(
            user_id,
            from = pagination.from,
            returned = parsed.results.len(),
            total = parsed.total,
            "Journal page received"
        );
        Ok(parsed)
    }

    /// Fetch every page of the window, in server order.
    ///
    /// Stops once the accumulated count reaches the reported total, on an
    /// empty page, or after the configured maximum number of pages.
    pub async fn search_all(
        &self,
        user_id: &str,
        merchant_id: &str,
        from_date: &DateTime<Utc>,
        to_date: &DateTime<Utc>,
    ) -> Result<JournalSearchResponse> {
        let mut results = Vec::new();
        let mut total = 0;

        for page in 0..self.max_pages {
            let pagination = Pagination::new(results.len() as u64, self.page_size);
            let response = self
                .search_journals(user_id, merchant_id, from_date, to_date, pagination, SortOrder::Desc)
                .await?;
            total = response.total;

            if response.results.is_empty() {
                if (results.len() as u64) < total {
                    warn!(user_id, page, total, fetched = results.len(), "Empty page before reaching reported total");
                }
                break;
            }
            results.extend(response.results);

            if results.len() as u64 >= total {
                break;
            }
            if page + 1 == self.max_pages {
                warn!(user_id, max_pages = self.max_pages, total, fetched = results.len(), "Stopped paging at page limit");
            }
        }

        info!(user_id, total, fetched = results.len(), "Journal search complete");
        Ok(JournalSearchResponse { total, results })
    }

    /// One page addressed by 1-based page number, with its gross total.
    pub async fn search_page(
        &self,
        user_id: &str,
        merchant_id: &str,
        from_date: &DateTime<Utc>,
        to_date: &DateTime<Utc>,
        page: u32,
        limit: u32,
    ) -> Result<JournalPage> {
        let page = page.max(1);
        let response = self
            .search_journals(
                user_id,
                merchant_id,
                from_date,
                to_date,
                Pagination::for_page(page, limit),
                SortOrder::Desc,
            )
            .await?;

        Ok(JournalPage {
            total: response.total,
            total_amount: summary::total_amount(&response.results),
            page,
            limit,
            total_pages: summary::total_pages(response.total, limit),
            transactions: response.results,
        })
    }

    /// First page of today's journals in the local time zone.
    pub async fn search_today(&self, user_id: &str, merchant_id: &str, limit: u32) -> Result<JournalPage> {
        let (start, end) = day_window(&Local, Local::now().date_naive())?;
        self.search_page(user_id, merchant_id, &start, &end, 1, limit)
            .await
    }

    /// Aggregate every journal in the window by payment type and status.
    pub async fn summarize(
        &self,
        user_id: &str,
        merchant_id: &str,
        from_date: &DateTime<Utc>,
        to_date: &DateTime<Utc>,
    ) -> Result<JournalSummary> {
        let all = self
            .search_all(user_id, merchant_id, from_date, to_date)
            .await?;
        Ok(summary::summarize(all.total, all.results))
    }
}

/// First and last millisecond of `date` in `tz`, as UTC instants.
pub fn day_bounds<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = date.and_hms_opt(0, 0, 0)?;
    let end = date.and_hms_milli_opt(23, 59, 59, 999)?;
    let start = tz.from_local_datetime(&start).earliest()?;
    let end = tz.from_local_datetime(&end).latest()?;
    Some((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}

fn day_window<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    day_bounds(tz, date).ok_or(ApiError::UnresolvableDate(date))
}
