//! Transaction journal search.
//!
//! - `query`: the filter/sort document sent to `POST /journals/search`
//! - `search`: single pages, exhaustive paging and the today window
//! - `summary`: gross totals grouped by payment type and status

pub mod query;
pub mod search;
pub mod summary;

pub use query::{build_search_payload, Pagination, SortOrder};
pub use search::{day_bounds, JournalSearch};
pub use summary::{summarize, total_amount, Bucket, JournalPage, JournalSummary};
