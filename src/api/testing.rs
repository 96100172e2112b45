//! Router test helpers: an app over an in-memory database and small
//! request builders for `tower::ServiceExt::oneshot`.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use tower::ServiceExt;

use crate::api::{build_router, AppState};
use crate::config::Config;
use crate::db::{create_test_pool, migrations::run_migrations};
use crate::services::RegisterInput;

pub const PASSWORD: &str = "correct-horse-battery";

pub async fn test_app() -> (Router, AppState) {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    run_migrations(&pool).await.expect("Failed to run migrations");
    let state = AppState::new(pool, Config::default()).expect("Failed to build state");
    (build_router(state.clone()), state)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("Request failed")
}

pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

pub async fn post_form(app: &Router, uri: &str, body: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).expect("Body is not JSON")
}

/// `name=value` of the first `Set-Cookie` header, ready for a `Cookie` header
pub fn cookie_of(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("Response has no Set-Cookie header")
        .to_string()
}

pub fn location_of(response: &Response) -> &str {
    assert_eq!(response.status(), StatusCode::FOUND);
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("Redirect has no Location header")
}

/// Register `username` and log in; returns the session cookie
pub async fn logged_in(app: &Router, state: &AppState, username: &str) -> String {
    state
        .redactor_service
        .register(RegisterInput::new(username, PASSWORD))
        .await
        .expect("Failed to register redactor");

    let response = post_form(
        app,
        "/login/",
        &format!("username={}&password={}", username, PASSWORD),
        None,
    )
    .await;
    assert_eq!(location_of(&response), "/");
    cookie_of(&response)
}
