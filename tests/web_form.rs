//! HTTP tests for the web form

#![cfg(feature = "server")]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use expense_tracker::server::{create_router, AppState, SESSION_COOKIE};
use expense_tracker::{open_in_memory, Config};
use http_body_util::BodyExt;
use tower::util::ServiceExt;

fn app() -> Router {
    create_router(AppState::new(open_in_memory().unwrap(), Config::default()))
}

fn form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

/// Register and log in; returns the `name=value` cookie pair
async fn login_as(app: &Router, name: &str, email: &str) -> String {
    let body = format!("name={}&email={}&password=pw", name, email.replace('@', "%40"));
    let response = app.clone().oneshot(form("/register", None, &body)).await.unwrap();
    assert!(location(&response).starts_with("/?msg="));

    let body = format!("email={}&password=pw", email.replace('@', "%40"));
    let response = app.clone().oneshot(form("/login", None, &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    let pair = set_cookie.split(';').next().unwrap().to_string();
    assert!(pair.starts_with(SESSION_COOKIE));
    pair
}

#[tokio::test]
async fn test_logged_out_menu() {
    let response = app().oneshot(get("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("action=\"/register\""));
    assert!(html.contains("action=\"/login\""));
    assert!(!html.contains("action=\"/expenses\""));
}

#[tokio::test]
async fn test_full_flow() {
    let app = app();
    let cookie = login_as(&app, "alice", "alice@example.com").await;

    // Logged-in menu greets the user
    let html = body_text(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains("alice"));
    assert!(html.contains("action=\"/expenses\""));

    // Add Expense
    let response = app
        .clone()
        .oneshot(form(
            "/expenses",
            Some(&cookie),
            "date=2024-01-01&item=coffee&amount=3.5",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?msg=Expense%20saved%21");

    let html = body_text(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains("(1 expenses recorded)"));

    // View Report
    let response = app
        .clone()
        .oneshot(get("/report?start=2024-01-01&end=2024-01-31", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("2024-01-01 | coffee | Rs.3.5"));
    assert!(html.contains("/report.pdf?start=2024-01-01&amp;end=2024-01-31"));

    // Download PDF
    let response = app
        .clone()
        .oneshot(get("/report.pdf?start=2024-01-01&end=2024-01-31", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"report.pdf\""
    );
    assert!(body_bytes(response).await.starts_with(b"%PDF-1.4"));

    // JSON listing
    let response = app
        .clone()
        .oneshot(get("/api/expenses", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"][0]["item"], "coffee");
    assert_eq!(json["data"][0]["amount"], 3.5);
}

#[tokio::test]
async fn test_empty_report_shows_no_data() {
    let app = app();
    let cookie = login_as(&app, "alice", "alice@example.com").await;

    let response = app
        .clone()
        .oneshot(get("/report?start=2024-02-01&end=2024-02-28", Some(&cookie)))
        .await
        .unwrap();
    assert!(body_text(response).await.contains("No data found."));

    let response = app
        .clone()
        .oneshot(get("/report.pdf?start=2024-02-01&end=2024-02-28", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_registration_errors_come_back_as_flash() {
    let app = app();
    login_as(&app, "alice", "alice@example.com").await;

    let response = app
        .clone()
        .oneshot(form("/register", None, "name=alice&email=x%40example.com&password=pw"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/?err=Name%20already%20taken"));

    let response = app
        .clone()
        .oneshot(form("/register", None, "name=bob&email=alice%40example.com&password=pw"))
        .await
        .unwrap();
    assert!(location(&response).starts_with("/?err=Email%20already%20registered"));

    let response = app
        .clone()
        .oneshot(form("/register", None, "name=carol&email=a%40%40b.com&password=pw"))
        .await
        .unwrap();
    assert!(location(&response).starts_with("/?err=Invalid%20email%20format"));
}

#[tokio::test]
async fn test_bad_login_and_protected_pages() {
    let app = app();
    login_as(&app, "alice", "alice@example.com").await;

    let response = app
        .clone()
        .oneshot(form("/login", None, "email=alice%40example.com&password=nope"))
        .await
        .unwrap();
    assert_eq!(location(&response), "/?err=Invalid%20credentials.");
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let response = app.clone().oneshot(get("/report", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/?err="));

    let response = app.clone().oneshot(get("/api/expenses", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_expense_input() {
    let app = app();
    let cookie = login_as(&app, "alice", "alice@example.com").await;

    let response = app
        .clone()
        .oneshot(form("/expenses", Some(&cookie), "date=2024-01-01&item=x&amount=-1"))
        .await
        .unwrap();
    assert!(location(&response).starts_with("/?err=Amount%20must"));

    let response = app
        .clone()
        .oneshot(form("/expenses", Some(&cookie), "date=someday&item=x&amount=1"))
        .await
        .unwrap();
    assert!(location(&response).starts_with("/?err=Invalid%20date"));
}

#[tokio::test]
async fn test_logout_resets_session() {
    let app = app();
    let cookie = login_as(&app, "alice", "alice@example.com").await;

    let response = app
        .clone()
        .oneshot(form("/logout", Some(&cookie), ""))
        .await
        .unwrap();
    assert_eq!(location(&response), "/");
    let cleared = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.starts_with(&format!("{}=;", SESSION_COOKIE)));
    assert!(cleared.contains("Max-Age=0"));

    let response = app.clone().oneshot(get("/report", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let html = body_text(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains("action=\"/login\""));
}

#[tokio::test]
async fn test_logout_forgets_every_session() {
    let state = AppState::new(open_in_memory().unwrap(), Config::default());
    let app = create_router(state.clone());
    let mut cookie = login_as(&app, "alice", "alice@example.com").await;

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(form("/logout", Some(&cookie), ""))
            .await
            .unwrap();
        assert_eq!(location(&response), "/");
        assert_eq!(state.sessions().len(), 0);

        let response = app
            .clone()
            .oneshot(form("/login", None, "email=alice%40example.com&password=pw"))
            .await
            .unwrap();
        let set_cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        let fresh = set_cookie.split(';').next().unwrap().to_string();
        assert_ne!(fresh, cookie);
        assert_eq!(state.sessions().len(), 1);
        cookie = fresh;
    }

    // Logging in again over a live cookie swaps the token instead of adding one
    let response = app
        .clone()
        .oneshot(form("/login", Some(&cookie), "email=alice%40example.com&password=pw"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(state.sessions().len(), 1);

    let set_cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    let latest = set_cookie.split(';').next().unwrap().to_string();
    app.clone()
        .oneshot(form("/logout", Some(&latest), ""))
        .await
        .unwrap();
    assert!(state.sessions().is_empty());
}

#[tokio::test]
async fn test_health() {
    let response = app().oneshot(get("/api/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["data"], "OK");
}
