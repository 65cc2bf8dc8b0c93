// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use academy_portal::backend::{AuthProvider, MemoryBackend, Store};
use academy_portal::config::{Config, SESSION_COOKIE};
use academy_portal::models::{GroupInput, ProfileUpdate, Role};
use academy_portal::routes::create_router;
use academy_portal::AppState;
use axum::body::Body;
use axum::http::{header, request, Request, Response};
use std::sync::Arc;
use tower::ServiceExt;

pub const PASSWORD: &str = "judo-secret";

/// Router plus direct handles on the in-memory backend.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub backend: Arc<MemoryBackend>,
}

/// A signed-in account.
#[allow(dead_code)]
pub struct Member {
    pub id: String,
    pub token: String,
}

/// Create a test app backed by a fresh memory backend.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    let config = Config::test_default();
    let backend = Arc::new(MemoryBackend::new(&config.session_signing_key));
    let state = Arc::new(AppState::new(
        config,
        backend.clone(),
        backend.clone(),
        backend.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        backend,
    }
}

#[allow(dead_code)]
impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Create an account, optionally place it in a group, and sign it in.
    pub async fn member(&self, email: &str, role: Role, group_id: Option<&str>) -> Member {
        let identity = self
            .backend
            .create_account(email, PASSWORD, "Test", role)
            .await
            .unwrap();

        if let Some(group_id) = group_id {
            let profile = self.backend.get_profile(&identity.id).await.unwrap().unwrap();
            let update = ProfileUpdate {
                contact: profile.contact_details(),
                birth_date: profile.birth_date,
                role: profile.role,
                group_id: Some(group_id.to_string()),
                active: profile.active,
            };
            self.backend.update_profile(&identity.id, &update).await.unwrap();
        }

        let session = self.backend.sign_in(email, PASSWORD).await.unwrap();
        Member {
            id: identity.id,
            token: session.access_token,
        }
    }

    pub async fn group(&self, name: &str) -> String {
        let input = GroupInput {
            name: name.to_string(),
            description: None,
        };
        self.backend.insert_group(&input).await.unwrap().id
    }
}

/// Request builder carrying the session cookie when a token is given.
#[allow(dead_code)]
pub fn request(method: &str, uri: &str, token: Option<&str>) -> request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token)),
        None => builder,
    }
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    request(method, uri, Some(token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a multipart/form-data request with text fields and an optional file.
#[allow(dead_code)]
pub fn multipart_request(
    method: &str,
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> Request<Body> {
    let boundary = "academy-portal-test-boundary";
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    request(method, uri, Some(token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}
