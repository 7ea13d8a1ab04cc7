//! Data models for GoBiz payloads.
//!
//! - `TokenSet`: access/refresh token pair returned by login and refresh
//! - `Journal` and `JournalSearchResponse`: transaction journal search results

pub mod journal;
pub mod token;

pub use journal::{Journal, JournalMetadata, JournalSearchResponse, TransactionDetails};
pub(crate) use token::TokenResponse;
pub use token::TokenSet;
