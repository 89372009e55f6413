//! End-to-end request flow through the router: sessions, listing, metrics.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use marquee_core::error::{MarqueeError, Result};
use marquee_core::model::Movie;
use marquee_server::app_state::{AppState, Collaborators};
use marquee_server::config::{self, AppConfig};
use marquee_server::listing::ListingGateway;
use marquee_server::router::build_router;

const GET_ROOT: [&str; 2] = ["GET", "/"];
const POST_LOGIN: [&str; 2] = ["POST", "/login"];
const POST_LOGOUT: [&str; 2] = ["POST", "/logout"];

fn cfg_with_catalog(rows: usize) -> AppConfig {
    if rows == 0 {
        return config::load_from_str("version: 1\n").unwrap();
    }
    let mut yaml = String::from("version: 1\ncatalog:\n");
    for i in 0..rows {
        yaml.push_str(&format!(
            "  - {{ title: \"Movie {i}\", release_date: \"2001-01-01\", tagline: \"Tagline {i}\" }}\n"
        ));
    }
    config::load_from_str(&yaml).unwrap()
}

fn app(rows: usize) -> (Router, AppState) {
    let state = AppState::new(cfg_with_catalog(rows)).unwrap();
    (build_router(state.clone()), state)
}

struct FailingGateway;

#[async_trait]
impl ListingGateway for FailingGateway {
    async fn fetch_listing(&self) -> Result<Vec<Movie>> {
        Err(MarqueeError::DataQuery("SQLITE_ERROR: no such table: movies".into()))
    }
}

fn failing_app() -> (Router, AppState) {
    let cfg = cfg_with_catalog(0);
    let mut parts = Collaborators::from_config(&cfg);
    parts.listing = Arc::new(FailingGateway);
    let state = AppState::with_collaborators(cfg, parts).unwrap();
    (build_router(state.clone()), state)
}

fn login_req(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={username}&password={password}")))
        .unwrap()
}

fn logout_req(cookie: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().method("POST").uri("/logout");
    if let Some(c) = cookie {
        b = b.header(header::COOKIE, c);
    }
    b.body(Body::empty()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().split(';').next().unwrap().to_string());
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, cookie, body.to_vec())
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn login_success_sets_cookie_and_gauge() {
    let (app, state) = app(0);
    let (status, cookie, body) = send(&app, login_req("user1", "password1")).await;

    assert_eq!(status, StatusCode::OK);
    let v = json(&body);
    assert_eq!(v["message"], "Login successful");
    assert_eq!(v["username"], "user1");
    assert!(cookie.unwrap().starts_with("sessionId="));
    assert_eq!(state.metrics().logged_in_users.get(), 1);
}

#[tokio::test]
async fn login_with_wrong_password_is_401() {
    let (app, state) = app(0);
    let (status, cookie, body) = send(&app, login_req("user1", "wrong")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&body)["error"], "Invalid username or password");
    assert!(cookie.is_none());
    assert_eq!(state.metrics().logged_in_users.get(), 0);
}

#[tokio::test]
async fn logout_without_login_is_401() {
    let (app, state) = app(0);
    let (status, _, body) = send(&app, logout_req(None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&body)["error"], "Not logged in");
    assert_eq!(state.metrics().logged_in_users.get(), 0);
}

#[tokio::test]
async fn login_then_logout_returns_gauge_to_zero() {
    let (app, state) = app(0);
    let (_, cookie, _) = send(&app, login_req("user2", "password2")).await;
    let cookie = cookie.unwrap();
    assert_eq!(state.metrics().logged_in_users.get(), 1);

    let (status, _, body) = send(&app, logout_req(Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["message"], "Logout successful");
    assert_eq!(state.metrics().logged_in_users.get(), 0);

    // The session is gone; replaying the cookie is a no-op failure.
    let (status, _, _) = send(&app, logout_req(Some(&cookie))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(state.metrics().logged_in_users.get(), 0);
}

#[tokio::test]
async fn listing_is_capped_at_eight_rows() {
    let (app, _) = app(12);
    let (status, _, body) = send(&app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    let rows = json(&body);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 8);
    assert_eq!(rows[0]["title"], "Movie 0");
    assert_eq!(rows[7]["title"], "Movie 7");
    assert!(rows[0].get("release_date").is_some());
    assert!(rows[0].get("tagline").is_some());
}

#[tokio::test]
async fn short_listing_is_returned_whole() {
    let (app, _) = app(3);
    let (_, _, body) = send(&app, get("/")).await;
    assert_eq!(json(&body).as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn each_listing_request_is_counted_timed_and_sized_once() {
    let (app, state) = app(5);
    let m = state.metrics();

    for n in 1..=3u64 {
        let (_, _, body) = send(&app, get("/")).await;
        assert_eq!(m.http_requests.get(&GET_ROOT), n);
        assert_eq!(m.query_duration.sample_count(&GET_ROOT), n);
        assert_eq!(m.response_size.sample_count(&GET_ROOT), n);
        assert!(m.response_size.sample_sum(&GET_ROOT) >= body.len() as f64);
    }
    // Every response carries the same five rows, so the sum is exact.
    let (_, _, body) = send(&app, get("/")).await;
    assert_eq!(m.response_size.sample_sum(&GET_ROOT), 4.0 * body.len() as f64);
}

#[tokio::test]
async fn session_routes_never_record_response_size() {
    let (app, state) = app(2);
    let m = state.metrics();

    let (_, cookie, _) = send(&app, login_req("user1", "password1")).await;
    send(&app, login_req("user1", "bad")).await;
    send(&app, logout_req(cookie.as_deref())).await;
    send(&app, logout_req(None)).await;

    assert_eq!(m.http_requests.get(&POST_LOGIN), 2);
    assert_eq!(m.http_requests.get(&POST_LOGOUT), 2);
    assert_eq!(m.response_size.sample_count(&POST_LOGIN), 0);
    assert_eq!(m.response_size.sample_count(&POST_LOGOUT), 0);
    assert_eq!(m.response_size.sample_count(&GET_ROOT), 0);
    assert_eq!(m.query_duration.sample_count(&GET_ROOT), 0);
}

#[tokio::test]
async fn query_failure_is_500_without_duration_sample() {
    let (app, state) = failing_app();
    let m = state.metrics();

    let (status, _, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let v = json(&body);
    assert_eq!(v["error"], "Internal Server Error");
    assert!(!String::from_utf8_lossy(&body).contains("SQLITE"));

    assert_eq!(m.http_requests.get(&GET_ROOT), 1);
    assert_eq!(m.query_duration.sample_count(&GET_ROOT), 0);
    // The error payload is still an outgoing response on the tracked route.
    assert_eq!(m.response_size.sample_count(&GET_ROOT), 1);
}

#[tokio::test]
async fn metrics_endpoint_exposes_all_instruments() {
    let (app, _) = app(1);
    send(&app, get("/")).await;
    send(&app, login_req("user1", "password1")).await;

    let resp = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain; version=0.0.4"));
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    assert!(text.contains("# TYPE http_requests_total counter"));
    assert!(text.contains("http_requests_total{method=\"GET\",route=\"/\"} 1"));
    assert!(text.contains("http_requests_total{method=\"POST\",route=\"/login\"} 1"));
    assert!(text.contains("# TYPE logged_in_users gauge"));
    assert!(text.contains("logged_in_users 1"));
    assert!(text.contains("# TYPE db_query_duration_seconds histogram"));
    assert!(text.contains("db_query_duration_seconds_count{method=\"GET\",route=\"/\"} 1"));
    assert!(text.contains("db_query_duration_seconds_bucket{method=\"GET\",route=\"/\",le=\"0.005\"}"));
    assert!(text.contains("# TYPE http_response_size_bytes summary"));
    assert!(text.contains("http_response_size_bytes_count{method=\"GET\",route=\"/\"} 1"));
    // Scraping is not itself instrumented.
    assert!(!text.contains("route=\"/metrics\""));
}

#[tokio::test]
async fn unknown_routes_are_not_instrumented() {
    let (app, state) = app(1);
    let resp = app.clone().oneshot(get("/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let healthz = app.clone().oneshot(get("/healthz")).await.unwrap();
    assert_eq!(healthz.status(), StatusCode::OK);

    let m = state.metrics();
    assert_eq!(m.http_requests.get(&GET_ROOT), 0);
    assert!(!m.render().contains("/nope"));
}

#[tokio::test]
async fn head_listing_is_served_but_not_instrumented() {
    let (app, state) = app(3);
    let req = Request::builder().method("HEAD").uri("/").body(Body::empty()).unwrap();
    let (status, _, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    let m = state.metrics();
    assert_eq!(m.http_requests.get(&GET_ROOT), 0);
    assert_eq!(m.query_duration.sample_count(&GET_ROOT), 0);
    assert_eq!(m.response_size.sample_count(&GET_ROOT), 0);
    assert_eq!(m.request_duration.sample_count(&GET_ROOT), 0);
}

#[tokio::test]
async fn whole_request_duration_is_observed_per_counted_route() {
    let (app, state) = app(2);
    let m = state.metrics();

    send(&app, get("/")).await;
    send(&app, login_req("user1", "password1")).await;
    send(&app, logout_req(None)).await;
    send(&app, get("/healthz")).await;

    assert_eq!(m.request_duration.sample_count(&GET_ROOT), 1);
    assert_eq!(m.request_duration.sample_count(&POST_LOGIN), 1);
    assert_eq!(m.request_duration.sample_count(&POST_LOGOUT), 1);
    // The request window encloses the query window.
    assert!(m.request_duration.sample_sum(&GET_ROOT) >= m.query_duration.sample_sum(&GET_ROOT));

    let text = m.render();
    assert!(text.contains("# TYPE http_request_duration_seconds histogram"));
    assert!(text.contains(
        "http_request_duration_seconds_bucket{method=\"GET\",route=\"/\",le=\"+Inf\"} 1"
    ));
    assert!(!text.contains("route=\"/healthz\""));
}

#[tokio::test]
async fn relogin_keeps_previous_session_until_logout() {
    let (app, state) = app(0);
    let (_, first, _) = send(&app, login_req("user1", "password1")).await;
    let (_, second, _) = send(&app, login_req("user1", "password1")).await;
    let (first, second) = (first.unwrap(), second.unwrap());
    assert_ne!(first, second);
    assert_eq!(state.metrics().logged_in_users.get(), 2);

    let (status, _, _) = send(&app, logout_req(Some(&first))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(&app, logout_req(Some(&second))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.metrics().logged_in_users.get(), 0);
}
