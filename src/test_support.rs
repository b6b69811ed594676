//! Router-level helpers shared by the handler tests.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    app::build_app,
    config::{AppConfig, JwtConfig},
    state::AppState,
    users::{InMemoryUserRepo, UserRepo},
};

pub fn test_state() -> AppState {
    test_state_with(Arc::new(InMemoryUserRepo::new()))
}

pub fn test_state_with(users: Arc<dyn UserRepo>) -> AppState {
    let config = AppConfig {
        database_url: "memory://".into(),
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 60,
        },
        bcrypt_cost: 4,
        host: "127.0.0.1".into(),
        port: 0,
    };
    AppState::from_parts(users, config)
}

pub fn test_app(state: AppState) -> Router {
    build_app(state)
}

pub async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.expect("request");
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    authorization: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = authorization {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let req = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");
    call(app, req).await
}

pub async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    body: &str,
    content_type: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(ct) = content_type {
        builder = builder.header(header::CONTENT_TYPE, ct);
    }
    let req = builder.body(Body::from(body.to_owned())).expect("request");
    call(app, req).await
}
