// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login and logout tests.
//!
//! These tests verify the session cookie attributes set on login, that
//! logout clears the cookie with matching attributes, and that a signed-out
//! token no longer opens the dashboard.

use academy_portal::backend::MemoryBackend;
use academy_portal::models::Role;
use axum::{
    body::Body,
    http::{header, StatusCode},
};

mod common;
use common::{create_test_app, location, request, set_cookie_headers, PASSWORD};

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

async fn seed(backend: &MemoryBackend) {
    backend
        .create_account("ana@example.com", PASSWORD, "Ana", Role::User)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_form_login_sets_session_cookie() {
    let app = create_test_app();
    seed(&app.backend).await;

    let response = app
        .send(
            request("POST", "/login", None)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(format!(
                    "email=ANA%40example.com&password={PASSWORD}"
                )))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");

    let cookie = find_cookie(&set_cookie_headers(&response), "academy_session");
    assert!(cookie.contains("HttpOnly"), "{cookie}");
    assert!(cookie.contains("SameSite=Lax"), "{cookie}");
    assert!(cookie.contains("Path=/"), "{cookie}");
    assert!(!cookie.contains("Secure"), "{cookie}");
}

#[tokio::test]
async fn test_json_login_then_dashboard() {
    let app = create_test_app();
    seed(&app.backend).await;

    let response = app
        .send(
            request("POST", "/login", None)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({ "email": "ana@example.com", "password": PASSWORD })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let cookie = find_cookie(&set_cookie_headers(&response), "academy_session");
    let token = cookie
        .trim_start_matches("academy_session=")
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let dashboard = app
        .send(
            request("GET", "/dashboard", Some(token.as_str()))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(dashboard.status(), StatusCode::OK);

    let body = common::body_json(dashboard).await;
    assert_eq!(body["viewer"]["role"], "user");
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = create_test_app();
    seed(&app.backend).await;

    let response = app
        .send(
            request("POST", "/login", None)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("email=ana%40example.com&password=wrong-one"))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie_headers(&response).is_empty());
}

#[tokio::test]
async fn test_empty_credentials_rejected() {
    let app = create_test_app();

    let response = app
        .send(
            request("POST", "/login", None)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("email=&password="))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_logout_clears_cookie_and_revokes_token() {
    let app = create_test_app();
    let member = app.member("ana@example.com", Role::User, None).await;

    let response = app
        .send(
            request("POST", "/logout", Some(member.token.as_str()))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let cookie = find_cookie(&set_cookie_headers(&response), "academy_session");
    assert!(cookie.contains("Max-Age=0"), "{cookie}");
    assert!(cookie.contains("Path=/"), "{cookie}");
    assert!(cookie.contains("HttpOnly"), "{cookie}");

    let after = app
        .send(
            request("GET", "/dashboard", Some(member.token.as_str()))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(after.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&after), "/login");
}
