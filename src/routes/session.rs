// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login, logout and the root redirect.

use crate::access::{DASHBOARD_PATH, LOGIN_PATH};
use crate::error::{AppError, Result};
use crate::middleware::session::{clear_session_cookie, session_cookie};
use crate::middleware::RequestContext;
use crate::AppState;
use axum::{
    extract::{FromRequest, Request, State},
    http::header,
    response::Redirect,
    routing::{get, post},
    Extension, Form, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route(LOGIN_PATH, get(login_page).post(login))
        .route("/logout", post(logout))
}

/// Credentials posted to the login page.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// What the login page needs to render its form.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginPage {
    pub action: String,
    pub fields: Vec<String>,
}

/// The gate redirects `/` before this runs; reaching it means the caller
/// already has a session.
async fn root() -> Redirect {
    Redirect::to(DASHBOARD_PATH)
}

async fn login_page() -> Json<LoginPage> {
    Json(LoginPage {
        action: LOGIN_PATH.to_string(),
        fields: vec!["email".to_string(), "password".to_string()],
    })
}

/// Accepts the form either URL-encoded or as JSON.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
) -> Result<(CookieJar, Redirect)> {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    let form = if is_json {
        Json::<LoginForm>::from_request(request, &())
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
            .0
    } else {
        Form::<LoginForm>::from_request(request, &())
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
            .0
    };

    let email = form.email.trim().to_lowercase();
    if email.is_empty() || form.password.is_empty() {
        return Err(AppError::Validation(
            "email and password are required".to_string(),
        ));
    }

    let session = state.auth.sign_in(&email, &form.password).await?;
    tracing::info!(identity = %session.identity.id, "Signed in");

    Ok((
        jar.add(session_cookie(&state.config, session.access_token)),
        Redirect::to(DASHBOARD_PATH),
    ))
}

/// Sign out with the provider (best effort) and drop the cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    if let Err(e) = state.auth.sign_out(&ctx.access_token).await {
        tracing::warn!(identity = %ctx.identity.id, error = %e, "Provider sign-out failed");
    } else {
        tracing::info!(identity = %ctx.identity.id, "Signed out");
    }

    (
        clear_session_cookie(jar, &state.config),
        Redirect::to(LOGIN_PATH),
    )
}
