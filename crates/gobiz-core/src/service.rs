//! Entry point for a transport layer.
//!
//! `GoBizService` wires one session store, API client, auth flow, executor
//! and journal search together. It is cheap to clone and every clone shares
//! the same sessions, so a web server can hand one to each request handler.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::Value;

use crate::api::{ApiClient, RequestExecutor, Result};
use crate::auth::{AuthFlow, SessionStatus, SessionStore};
use crate::config::Config;
use crate::journals::{JournalPage, JournalSearch, JournalSummary, Pagination, SortOrder};
use crate::models::{JournalSearchResponse, TokenSet};

#[derive(Clone)]
pub struct GoBizService {
    sessions: SessionStore,
    auth: AuthFlow,
    executor: RequestExecutor,
    journals: JournalSearch,
}

impl GoBizService {
    pub fn new(config: &Config) -> Result<Self> {
        let api = ApiClient::new(config)?;
        let sessions = SessionStore::new(config.min_request_interval());
        let auth = AuthFlow::new(api.clone(), sessions.clone(), config.login_settle_delay());
        let executor = RequestExecutor::new(
            api,
            auth.clone(),
            sessions.clone(),
            &config.auth_failure_statuses,
        );
        let journals = JournalSearch::new(
            executor.clone(),
            config.search_page_size,
            config.max_search_pages,
        );

        Ok(Self {
            sessions,
            auth,
            executor,
            journals,
        })
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn login(&self, user_id: &str, email: &str, password: &str) -> Result<TokenSet> {
        self.auth.login(user_id, email, password).await
    }

    pub async fn refresh(&self, user_id: &str) -> Result<TokenSet> {
        self.auth.refresh(user_id).await
    }

    pub async fn logout(&self, user_id: &str) {
        self.auth.logout(user_id).await
    }

    pub async fn attach_merchant(&self, user_id: &str, merchant_id: &str) -> Result<()> {
        self.auth.attach_merchant(user_id, merchant_id).await
    }

    /// Token-free status of a user's session, `None` if there is none.
    pub async fn session_status(&self, user_id: &str) -> Option<SessionStatus> {
        self.sessions
            .snapshot(user_id)
            .await
            .map(|session| session.status())
    }

    /// Authenticated call to any GoBiz endpoint.
    pub async fn call(
        &self,
        user_id: &str,
        endpoint: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value> {
        self.executor.call(user_id, endpoint, method, body).await
    }

    pub async fn search_journals(
        &self,
        user_id: &str,
        merchant_id: &str,
        from_date: &DateTime<Utc>,
        to_date: &DateTime<Utc>,
        pagination: Pagination,
    ) -> Result<JournalSearchResponse> {
        self.journals
            .search_journals(user_id, merchant_id, from_date, to_date, pagination, SortOrder::Desc)
            .await
    }

    pub async fn search_all(
        &self,
        user_id: &str,
        merchant_id: &str,
        from_date: &DateTime<Utc>,
        to_date: &DateTime<Utc>,
    ) -> Result<JournalSearchResponse> {
        self.journals
            .search_all(user_id, merchant_id, from_date, to_date)
            .await
    }

    pub async fn search_page(
        &self,
        user_id: &str,
        merchant_id: &str,
        from_date: &DateTime<Utc>,
        to_date: &DateTime<Utc>,
        page: u32,
        limit: u32,
    ) -> Result<JournalPage> {
        self.journals
            .search_page(user_id, merchant_id, from_date, to_date, page, limit)
            .await
    }

    pub async fn search_today(&self, user_id: &str, merchant_id: &str, limit: u32) -> Result<JournalPage> {
        self.journals.search_today(user_id, merchant_id, limit).await
    }

    pub async fn summarize(
        &self,
        user_id: &str,
        merchant_id: &str,
        from_date: &DateTime<Utc>,
        to_date: &DateTime<Utc>,
    ) -> Result<JournalSummary> {
        self.journals
            .summarize(user_id, merchant_id, from_date, to_date)
            .await
    }
}
