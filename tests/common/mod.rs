//! Common test utilities for all integration tests.
//!
//! Builds the full router over a fresh in-memory database and drives it with `oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, Response},
    Router,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower::ServiceExt;
use usergate::{
    api::{build_router, ApiState},
    auth::{AccountService, SessionCookieSettings, TokenCodec},
    config::{DatabaseConfig, ServerConfig},
    storage::{create_pool, DbPool},
};

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

pub struct TestApp {
    pub pool: DbPool,
    pub codec: Arc<TokenCodec>,
    pub accounts: Arc<AccountService>,
    router: Router,
}

/// How a request presents its token.
#[derive(Clone, Copy)]
pub enum Credential<'a> {
    None,
    Bearer(&'a str),
    Cookie(&'a str),
    /// Verbatim `Authorization` header value
    Raw(&'a str),
}

impl TestApp {
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Register an account through the API and return its token.
    pub async fn register(&self, email: &str, password: &str) -> String {
        let response = send_request(
            self,
            Method::POST,
            "/auth/register",
            Credential::None,
            Some(json!({
                "email": email,
                "password": password,
                "firstName": "Test",
                "lastName": "User"
            })),
        )
        .await;
        assert_eq!(response.status(), 201, "registration of {} failed", email);

        let body: Value = read_json(response).await;
        body["token"].as_str().expect("token in body").to_string()
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_server(ServerConfig::default()).await
}

pub async fn setup_test_app_with_server(server: ServerConfig) -> TestApp {
    let database = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 5,
        ..Default::default()
    };
    let pool = create_pool(&database).await.expect("create sqlite pool");

    let codec = Arc::new(TokenCodec::new(TEST_SECRET).expect("token codec"));
    let accounts = Arc::new(AccountService::with_sqlx(pool.clone(), codec.clone()));
    let state = ApiState::new(accounts.clone(), SessionCookieSettings::default(), pool.clone());
    let router = build_router(state, &server).expect("build router");

    TestApp { pool, codec, accounts, router }
}

pub async fn send_request(
    app: &TestApp,
    method: Method,
    path: &str,
    credential: Credential<'_>,
    body: Option<Value>,
) -> Response<Body> {
    let builder = Request::builder().method(method).uri(path);
    let builder = match credential {
        Credential::None => builder,
        Credential::Bearer(token) => {
            builder.header(header::AUTHORIZATION, format!("Bearer {}", token))
        }
        Credential::Cookie(token) => builder.header(header::COOKIE, format!("jwt={}", token)),
        Credential::Raw(value) => builder.header(header::AUTHORIZATION, value),
    };

    let request = if let Some(json) = body {
        let bytes = serde_json::to_vec(&json).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("build request")
    } else {
        builder.body(Body::empty()).expect("build request")
    };

    app.router().oneshot(request).await.expect("request")
}

pub async fn read_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

/// Every `Set-Cookie` header value on the response.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().expect("ascii cookie").to_string())
        .collect()
}
