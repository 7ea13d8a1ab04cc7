#![allow(dead_code)]

use gobiz_core::{Config, GoBizService};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};

pub const EMAIL: &str = "owner@warung.test";
pub const PASSWORD: &str = "hunter2";

/// Config pointed at the mock server, with no pacing or settle delay.
pub fn config(server: &ServerGuard) -> Config {
    Config {
        base_url: server.url(),
        min_request_interval_ms: 0,
        login_settle_delay_ms: 0,
        ..Config::default()
    }
}

pub fn service(server: &ServerGuard) -> GoBizService {
    GoBizService::new(&config(server)).expect("service builds")
}

pub fn token_body(access: &str, refresh: &str) -> String {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "expires_in": 3600,
        "token_type": "Bearer"
    })
    .to_string()
}

pub async fn mock_login_request(server: &mut ServerGuard, hits: usize) -> Mock {
    server
        .mock("POST", "/goid/login/request")
        .match_body(Matcher::PartialJson(json!({
            "login_type": "password",
            "client_id": "go-biz-web-new"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true}"#)
        .expect(hits)
        .create_async()
        .await
}

pub async fn mock_password_token(server: &mut ServerGuard, access: &str, refresh: &str, hits: usize) -> Mock {
    server
        .mock("POST", "/goid/token")
        .match_body(Matcher::PartialJson(json!({
            "grant_type": "password",
            "data": { "user_type": "merchant" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(token_body(access, refresh))
        .expect(hits)
        .create_async()
        .await
}

pub async fn mock_refresh(server: &mut ServerGuard, old_refresh: &str, status: usize, body: String, hits: usize) -> Mock {
    server
        .mock("POST", "/goid/token")
        .match_body(Matcher::PartialJson(json!({
            "grant_type": "refresh_token",
            "refresh_token": old_refresh
        })))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(hits)
        .create_async()
        .await
}

/// Log `user_id` in with tokens `access-1` / `refresh-1`.
pub async fn log_in(server: &mut ServerGuard, service: &GoBizService, user_id: &str) -> (Mock, Mock) {
    let request = mock_login_request(server, 1).await;
    let token = mock_password_token(server, "access-1", "refresh-1", 1).await;
    service
        .login(user_id, EMAIL, PASSWORD)
        .await
        .expect("login succeeds");
    (request, token)
}

/// `count` journals numbered from `start`, each with `amount` gross.
pub fn journals(start: usize, count: usize, amount: u64) -> Vec<Value> {
    (start..start + count)
        .map(|i| {
            json!({
                "id": format!("j{}", i),
                "metadata": {
                    "transaction": {
                        "gross_amount": amount,
                        "payment_type": "qris",
                        "status": "settlement"
                    }
                }
            })
        })
        .collect()
}

pub fn search_body(total: u64, results: Vec<Value>) -> String {
    json!({ "total": total, "results": results }).to_string()
}

pub async fn new_server() -> ServerGuard {
    Server::new_async().await
}
