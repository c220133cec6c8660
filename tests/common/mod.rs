#![allow(dead_code)]

use actix_web::dev::ServiceResponse;
use actix_web::test::{self, TestRequest};
use bloodboard_server::{AppState, Settings};
use serde_json::{json, Value};

pub async fn test_state() -> AppState {
    let config = Settings::new_for_test().expect("Failed to load test config");
    AppState::new(config).await.expect("Failed to build state")
}

pub fn signup_request(username: &str, password: &str, role: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/signup")
        .set_json(json!({ "username": username, "password": password, "role": role }))
}

pub fn login_request(username: &str, password: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "username": username, "password": password }))
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Asserts a 200 and returns the `token` field of the body.
pub async fn token_from(response: ServiceResponse) -> String {
    assert_eq!(response.status(), 200);
    let body: Value = test::read_body_json(response).await;
    body["token"].as_str().expect("token missing").to_string()
}

pub async fn error_kind(response: ServiceResponse) -> String {
    let body: Value = test::read_body_json(response).await;
    body["error"]["kind"].as_str().unwrap_or_default().to_string()
}
