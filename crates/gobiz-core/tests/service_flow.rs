mod common;

use std::time::Duration;

use gobiz_core::{ApiError, Config, GoBizService};
use mockito::Matcher;
use reqwest::{Method, StatusCode};
use serde_json::json;

use common::*;

#[tokio::test]
async fn login_stores_credentials() {
    let mut server = new_server().await;
    let service = service(&server);

    let request = mock_login_request(&mut server, 1).await;
    let token = mock_password_token(&mut server, "access-1", "refresh-1", 1).await;

    let tokens = service.login("u1", EMAIL, PASSWORD).await.expect("login succeeds");
    assert_eq!(tokens.access_token, "access-1");
    assert_eq!(tokens.refresh_token, "refresh-1");
    assert_eq!(tokens.expires_in, Some(3600));

    request.assert_async().await;
    token.assert_async().await;

    let session = service.sessions().snapshot("u1").await.expect("session exists");
    assert_eq!(session.access_token(), Some("access-1"));
    assert_eq!(session.refresh_token(), Some("refresh-1"));

    let status = service.session_status("u1").await.unwrap();
    assert!(status.authenticated);
    assert!(!status.is_expired);
}

#[tokio::test]
async fn failed_login_request_skips_password_exchange() {
    let mut server = new_server().await;
    let service = service(&server);

    let request = server
        .mock("POST", "/goid/login/request")
        .with_status(400)
        .with_body(r#"{"errors":[{"code":"user:not_found"}]}"#)
        .create_async()
        .await;
    let token = mock_password_token(&mut server, "access-1", "refresh-1", 0).await;

    let err = service.login("u1", EMAIL, PASSWORD).await.unwrap_err();
    assert!(matches!(err, ApiError::DownstreamRejected { status, .. } if status == StatusCode::BAD_REQUEST));

    request.assert_async().await;
    token.assert_async().await;

    let session = service.sessions().snapshot("u1").await.expect("session kept");
    assert!(!session.is_authenticated());

    let err = service.refresh("u1").await.unwrap_err();
    assert!(matches!(err, ApiError::NotAuthenticated(_)));
}

#[tokio::test]
async fn login_sends_device_id_and_no_bearer() {
    let mut server = new_server().await;
    let service = service(&server);

    let request = server
        .mock("POST", "/goid/login/request")
        .match_header("x-uniqueid", Matcher::Regex("^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[0-9a-f]{4}-[0-9a-f]{12}$".into()))
        .match_header("x-user-type", "merchant")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::PartialJson(json!({ "email": EMAIL })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    let token = server
        .mock("POST", "/goid/token")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::PartialJson(json!({
            "grant_type": "password",
            "data": { "email": EMAIL, "password": PASSWORD }
        })))
        .with_status(200)
        .with_body(token_body("access-1", "refresh-1"))
        .create_async()
        .await;

    service.login("u1", EMAIL, PASSWORD).await.expect("login succeeds");
    request.assert_async().await;
    token.assert_async().await;
}

#[tokio::test]
async fn login_replaces_previous_session() {
    let mut server = new_server().await;
    let service = service(&server);

    let _request = mock_login_request(&mut server, 2).await;
    let _token = mock_password_token(&mut server, "access-1", "refresh-1", 2).await;

    service.login("u1", EMAIL, PASSWORD).await.unwrap();
    service.attach_merchant("u1", "M-1").await.unwrap();
    let first = service.sessions().snapshot("u1").await.unwrap();

    service.login("u1", EMAIL, PASSWORD).await.unwrap();
    let second = service.sessions().snapshot("u1").await.unwrap();

    assert_ne!(first.device_unique_id(), second.device_unique_id());
    assert!(second.merchant_id.is_none());
    assert_eq!(service.sessions().len().await, 1);
}

#[tokio::test]
async fn call_with_valid_token_does_not_refresh() {
    let mut server = new_server().await;
    let service = service(&server);
    let _login = log_in(&mut server, &service, "u1").await;
    let device = service.sessions().snapshot("u1").await.unwrap().device_unique_id().to_string();

    let refresh = mock_refresh(&mut server, "refresh-1", 200, token_body("access-2", "refresh-2"), 0).await;
    let endpoint = server
        .mock("GET", "/v1/merchants")
        .match_header("authorization", "Bearer access-1")
        .match_header("x-uniqueid", device.as_str())
        .with_status(200)
        .with_body(r#"{"merchants":[{"id":"M-1"}]}"#)
        .create_async()
        .await;

    let value = service
        .call("u1", "/v1/merchants", Method::GET, None)
        .await
        .expect("call succeeds");
    assert_eq!(value["merchants"][0]["id"], "M-1");

    endpoint.assert_async().await;
    refresh.assert_async().await;
}

#[tokio::test]
async fn call_refreshes_once_and_retries() {
    let mut server = new_server().await;
    let service = service(&server);
    let _login = log_in(&mut server, &service, "u1").await;

    let rejected = server
        .mock("POST", "/journals/search")
        .match_header("authorization", "Bearer access-1")
        .with_status(401)
        .with_body(r#"{"message":"token expired"}"#)
        .create_async()
        .await;
    let refresh = mock_refresh(&mut server, "refresh-1", 200, token_body("access-2", "refresh-2"), 1).await;
    let accepted = server
        .mock("POST", "/journals/search")
        .match_header("authorization", "Bearer access-2")
        .with_status(200)
        .with_body(search_body(0, vec![]))
        .create_async()
        .await;

    let body = json!({ "from": 0, "size": 1 });
    let value = service
        .call("u1", "/journals/search", Method::POST, Some(&body))
        .await
        .expect("retry succeeds");
    assert_eq!(value["total"], 0);

    rejected.assert_async().await;
    refresh.assert_async().await;
    accepted.assert_async().await;

    // the refresh token is rotated along with the access token
    let session = service.sessions().snapshot("u1").await.unwrap();
    assert_eq!(session.access_token(), Some("access-2"));
    assert_eq!(session.refresh_token(), Some("refresh-2"));
}

#[tokio::test]
async fn second_auth_failure_is_returned_after_one_refresh() {
    let mut server = new_server().await;
    let service = service(&server);
    let _login = log_in(&mut server, &service, "u1").await;

    let rejected = server
        .mock("POST", "/journals/search")
        .with_status(401)
        .with_body("unauthorized")
        .expect(2)
        .create_async()
        .await;
    let refresh = mock_refresh(&mut server, "refresh-1", 200, token_body("access-2", "refresh-2"), 1).await;

    let err = service
        .call("u1", "/journals/search", Method::POST, Some(&json!({})))
        .await
        .unwrap_err();
    match err {
        ApiError::DownstreamRejected { status, body } => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, "unauthorized");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    rejected.assert_async().await;
    refresh.assert_async().await;
}

#[tokio::test]
async fn non_auth_failure_is_not_retried() {
    let mut server = new_server().await;
    let service = service(&server);
    let _login = log_in(&mut server, &service, "u1").await;

    let failing = server
        .mock("POST", "/journals/search")
        .with_status(500)
        .with_body("boom")
        .expect(1)
        .create_async()
        .await;
    let refresh = mock_refresh(&mut server, "refresh-1", 200, token_body("access-2", "refresh-2"), 0).await;

    let err = service
        .call("u1", "/journals/search", Method::POST, None)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));

    failing.assert_async().await;
    refresh.assert_async().await;
}

#[tokio::test]
async fn configured_statuses_trigger_refresh() {
    let mut server = new_server().await;
    let config = Config {
        auth_failure_statuses: vec![401, 403],
        ..config(&server)
    };
    let service = GoBizService::new(&config).unwrap();
    let _login = log_in(&mut server, &service, "u1").await;

    let _rejected = server
        .mock("GET", "/v1/profile")
        .match_header("authorization", "Bearer access-1")
        .with_status(403)
        .create_async()
        .await;
    let refresh = mock_refresh(&mut server, "refresh-1", 200, token_body("access-2", "refresh-2"), 1).await;
    let _accepted = server
        .mock("GET", "/v1/profile")
        .match_header("authorization", "Bearer access-2")
        .with_status(200)
        .with_body(r#"{"name":"Warung"}"#)
        .create_async()
        .await;

    let value = service.call("u1", "/v1/profile", Method::GET, None).await.unwrap();
    assert_eq!(value["name"], "Warung");
    refresh.assert_async().await;
}

#[tokio::test]
async fn failed_refresh_keeps_previous_credentials() {
    let mut server = new_server().await;
    let service = service(&server);
    let _login = log_in(&mut server, &service, "u1").await;

    let refresh = mock_refresh(&mut server, "refresh-1", 400, r#"{"error":"invalid_grant"}"#.to_string(), 1).await;

    let err = service.refresh("u1").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    refresh.assert_async().await;

    let session = service.sessions().snapshot("u1").await.unwrap();
    assert_eq!(session.access_token(), Some("access-1"));
    assert_eq!(session.refresh_token(), Some("refresh-1"));
}

#[tokio::test]
async fn refresh_missing_session() {
    let server = new_server().await;
    let service = service(&server);
    let err = service.refresh("ghost").await.unwrap_err();
    assert!(matches!(err, ApiError::SessionMissing(ref u) if u == "ghost"));
}

#[tokio::test]
async fn calls_require_a_session_and_credentials() {
    let mut server = new_server().await;
    let service = service(&server);

    let err = service.call("ghost", "/v1/profile", Method::GET, None).await.unwrap_err();
    assert!(matches!(err, ApiError::SessionMissing(_)));

    let _request = server
        .mock("POST", "/goid/login/request")
        .with_status(503)
        .create_async()
        .await;
    assert!(service.login("u1", EMAIL, PASSWORD).await.is_err());

    let err = service.call("u1", "/v1/profile", Method::GET, None).await.unwrap_err();
    assert!(matches!(err, ApiError::NotAuthenticated(_)));
}

#[tokio::test]
async fn logout_removes_session() {
    let mut server = new_server().await;
    let service = service(&server);
    let _login = log_in(&mut server, &service, "u1").await;

    service.logout("u1").await;
    assert!(service.sessions().get("u1").await.is_none());
    assert!(service.session_status("u1").await.is_none());

    // logging out twice is fine
    service.logout("u1").await;

    let err = service.call("u1", "/v1/profile", Method::GET, None).await.unwrap_err();
    assert!(matches!(err, ApiError::SessionMissing(_)));
}

#[tokio::test]
async fn unreachable_platform_is_reported() {
    let config = Config {
        base_url: "http://127.0.0.1:9".into(),
        min_request_interval_ms: 0,
        login_settle_delay_ms: 0,
        request_timeout_secs: 2,
        ..Config::default()
    };
    let service = GoBizService::new(&config).unwrap();

    let err = service.login("u1", EMAIL, PASSWORD).await.unwrap_err();
    assert!(matches!(err, ApiError::DownstreamUnreachable(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pacing_is_per_session() {
    const INTERVAL: Duration = Duration::from_millis(400);

    let mut server = new_server().await;
    let config = Config {
        min_request_interval_ms: INTERVAL.as_millis() as u64,
        ..config(&server)
    };
    let service = GoBizService::new(&config).unwrap();

    let _request = mock_login_request(&mut server, 2).await;
    let _token = mock_password_token(&mut server, "access-1", "refresh-1", 2).await;
    let _profile = server
        .mock("GET", "/v1/profile")
        .with_status(200)
        .with_body("{}")
        .expect(2)
        .create_async()
        .await;

    // each login makes two paced calls; two users must not wait on each other
    let started = std::time::Instant::now();
    let (a, b) = tokio::join!(
        service.login("a", EMAIL, PASSWORD),
        service.login("b", EMAIL, PASSWORD)
    );
    a.unwrap();
    b.unwrap();
    let elapsed = started.elapsed();
    assert!(elapsed >= INTERVAL, "login finished too fast: {elapsed:?}");
    assert!(elapsed < INTERVAL * 2, "users were serialized: {elapsed:?}");

    // consecutive calls through one session start an interval apart
    service.call("a", "/v1/profile", Method::GET, None).await.unwrap();
    let first = service.sessions().snapshot("a").await.unwrap().last_request().unwrap();
    service.call("a", "/v1/profile", Method::GET, None).await.unwrap();
    let second = service.sessions().snapshot("a").await.unwrap().last_request().unwrap();
    assert!(second - first >= INTERVAL);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn same_user_logins_run_one_after_the_other() {
    const INTERVAL: Duration = Duration::from_millis(400);

    let mut server = new_server().await;
    let config = Config {
        min_request_interval_ms: INTERVAL.as_millis() as u64,
        ..config(&server)
    };
    let service = GoBizService::new(&config).unwrap();

    let request = mock_login_request(&mut server, 2).await;
    let token = mock_password_token(&mut server, "access-1", "refresh-1", 2).await;

    // the second login waits for the first, then paces its own two calls
    let started = std::time::Instant::now();
    let (a, b) = tokio::join!(
        service.login("u1", EMAIL, PASSWORD),
        service.login("u1", EMAIL, PASSWORD)
    );
    a.unwrap();
    b.unwrap();
    let elapsed = started.elapsed();
    assert!(elapsed >= INTERVAL * 2, "same-user logins overlapped: {elapsed:?}");

    request.assert_async().await;
    token.assert_async().await;
    assert_eq!(service.sessions().len().await, 1);
    let session = service.sessions().snapshot("u1").await.unwrap();
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn oversized_token_lifetime_is_reported_without_expiry() {
    let mut server = new_server().await;
    let service = service(&server);

    let _request = mock_login_request(&mut server, 1).await;
    let _token = server
        .mock("POST", "/goid/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "expires_in": 9_000_000_000_000_i64
            })
            .to_string(),
        )
        .create_async()
        .await;

    service.login("u1", EMAIL, PASSWORD).await.unwrap();
    let status = service.session_status("u1").await.unwrap();
    assert!(status.authenticated);
    assert!(status.expires_at.is_none());
    assert!(!status.is_expired);
}
