#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use chrono::Duration;
use http_body_util::BodyExt;
use tower::ServiceExt;

use shabd_backend::auth::sign_token_for_user;
use shabd_backend::config::Config;
use shabd_backend::db::operations::create_user;
use shabd_backend::db::Database;
use shabd_backend::state::AppState;

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub router: Router,
    pub db: Database,
}

pub async fn create_test_app() -> TestApp {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("in-memory database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: Some(TEST_SECRET.to_string()),
        ..Config::default()
    };

    let router = shabd_backend::build_app(AppState::new(config, Some(db.clone())));
    TestApp { router, db }
}

impl TestApp {
    /// Creates a user and returns `(user_id, bearer token)`.
    pub async fn signed_in_user(&self, email: &str) -> (String, String) {
        let user = create_user(&self.db, "Test Learner", email)
            .await
            .expect("create user");
        let (token, _) =
            sign_token_for_user(&user.id, TEST_SECRET, Duration::hours(1)).expect("sign token");
        (user.id, token)
    }

    pub async fn send(&self, request: Request<Body>) -> (u16, serde_json::Value) {
        let response = self.router.clone().oneshot(request).await.expect("request");
        read_json(response).await
    }
}

pub async fn read_json(response: Response<Body>) -> (u16, serde_json::Value) {
    let status = response.status().as_u16();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}
