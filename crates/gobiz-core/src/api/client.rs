//! HTTP client for the GoBiz / GoID API.
//!
//! Every call goes through one session: the session's rate gate is applied
//! first, then the request is sent with the dashboard headers and the
//! session's device id.

use reqwest::{Client, Method};
use serde_json::{json, Value};
use tracing::debug;

use crate::auth::Session;
use crate::config::Config;
use crate::models::{TokenResponse, TokenSet};

use super::error::{ApiError, Result};
use super::headers::build_headers;
use super::rate_gate;

const LOGIN_REQUEST_ENDPOINT: &str = "/goid/login/request";
const TOKEN_ENDPOINT: &str = "/goid/token";

/// GoID account type for merchant logins.
const USER_TYPE: &str = "merchant";

/// API client for GoBiz.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    client_id: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.api_base().to_string(),
            client_id: config.client_id.clone(),
        })
    }

    /// Handshake step 1: announce a password login for `email`.
    pub async fn request_login(&self, session: &mut Session, email: &str) -> Result<Value> {
        let body = json!({
            "email": email,
            "login_type": "password",
            "client_id": self.client_id,
        });
        self.send(session, Method::POST, LOGIN_REQUEST_ENDPOINT, None, Some(&body))
            .await
    }

    /// Handshake step 2: exchange the password for a token pair.
    pub async fn password_token(
        &self,
        session: &mut Session,
        email: &str,
        password: &str,
    ) -> Result<TokenSet> {
        let body = json!({
            "client_id": self.client_id,
            "grant_type": "password",
            "data": {
                "email": email,
                "password": password,
                "user_type": USER_TYPE,
            },
        });
        let response = self
            .send(session, Method::POST, TOKEN_ENDPOINT, None, Some(&body))
            .await?;
        Self::parse_tokens(response)
    }

    /// Exchange the session's refresh token for a new token pair.
    pub async fn refresh_token(&self, session: &mut Session) -> Result<TokenSet> {
        let refresh_token = session
            .refresh_token()
            .ok_or_else(|| ApiError::NotAuthenticated(session.user_id().to_string()))?
            .to_string();
        let body = json!({
            "client_id": self.client_id,
            "grant_type": "refresh_token",
            "refresh_token": refresh_token,
        });
        let response = self
            .send(session, Method::POST, TOKEN_ENDPOINT, None, Some(&body))
            .await?;
        Self::parse_tokens(response)
    }

    /// Call `endpoint` with the session's current access token.
    pub async fn authorized(
        &self,
        session: &mut Session,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        let token = session
            .access_token()
            .ok_or_else(|| ApiError::NotAuthenticated(session.user_id().to_string()))?
            .to_string();
        self.send(session, method, endpoint, Some(&token), body).await
    }

    async fn send(
        &self,
        session: &mut Session,
        method: Method,
        endpoint: &str,
        bearer: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Value> {
        rate_gate::throttle(session).await;

        let headers = build_headers(session.device_unique_id(), bearer)?;
        let url = self.url(endpoint);
        debug!(user_id = session.user_id(), %method, url = %url, "Sending GoBiz request");

        let mut request = self.client.request(method, &url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let response = Self::check_response(response).await?;

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{} returned invalid JSON: {}", endpoint, e)))
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(status = %status, "GoBiz request rejected");
            Err(ApiError::from_status(status, &body))
        }
    }

    fn parse_tokens(response: Value) -> Result<TokenSet> {
        let parsed: TokenResponse = serde_json::from_value(response)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse token response: {}", e)))?;
        parsed.into_token_set().ok_or_else(|| {
            ApiError::InvalidResponse("Token response is missing access or refresh token".into())
        })
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }
}
