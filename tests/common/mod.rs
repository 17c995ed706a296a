#![allow(dead_code)]

use axum_test::TestServer;
use axum_test::http::HeaderName;
use messaging::core::db::connect_in_memory;
use messaging::core::encode_jwt;
use messaging::{AppState, Config};
use serde_json::{Value, json};
use std::sync::Arc;

pub const JWT_SECRET: &str = "integration-tests-secret";

/// Default configuration with the test JWT secret
pub fn test_config() -> Config {
    Config {
        jwt_secret: JWT_SECRET.to_string(),
        ..Config::default()
    }
}

/// Creates an AppState over a fresh in-memory database
pub async fn create_test_state_with(config: Config) -> Arc<AppState> {
    let pool = connect_in_memory()
        .await
        .expect("Failed to open the test database");
    Arc::new(AppState::new(pool, config))
}

pub async fn create_test_state() -> Arc<AppState> {
    create_test_state_with(test_config()).await
}

/// Creates a TestServer over the application router
pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = messaging::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

pub async fn test_server() -> TestServer {
    create_test_server(create_test_state().await)
}

/// Value of the Authorization header for the given identity
pub fn bearer(participant_id: i64) -> String {
    let token = encode_jwt(participant_id, JWT_SECRET).expect("Failed to create JWT token");
    format!("Bearer {}", token)
}

pub fn authorization() -> HeaderName {
    HeaderName::from_static("authorization")
}

/// POST /threads as `requester`, returning the thread JSON
pub async fn create_thread(server: &TestServer, requester: i64, participants: &[i64]) -> Value {
    let response = server
        .post("/threads")
        .add_header(authorization(), bearer(requester))
        .json(&json!({ "participants": participants }))
        .await;

    response.assert_status(axum_test::http::StatusCode::CREATED);
    response.json::<Value>()
}

/// POST /messages/{thread_id} as `sender`, returning the message JSON
pub async fn post_message(server: &TestServer, sender: i64, thread_id: i64, body: &str) -> Value {
    let response = server
        .post(&format!("/messages/{}", thread_id))
        .add_header(authorization(), bearer(sender))
        .json(&json!({ "body": body }))
        .await;

    response.assert_status(axum_test::http::StatusCode::CREATED);
    response.json::<Value>()
}

pub fn id_of(value: &Value) -> i64 {
    value["id"].as_i64().expect("id should be an integer")
}

pub fn ids(values: &Value) -> Vec<i64> {
    values
        .as_array()
        .expect("expected an array")
        .iter()
        .map(|v| v.as_i64().expect("expected an integer"))
        .collect()
}
