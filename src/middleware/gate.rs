// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access gate middleware, run before every non-bypass route.

use super::session::{clear_session_cookie, load_profile, resolve_session, RequestContext};
use crate::access::{decide, Decision, RouteClass, DASHBOARD_PATH, LOGIN_PATH};
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Resolve session and profile, then allow or redirect.
///
/// Allowed requests with a profile carry a [`RequestContext`] extension.
/// A session whose profile is missing is cleared on the way to the login
/// page, otherwise the login page would bounce straight back here.
pub async fn require_access(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let route = RouteClass::classify(request.uri().path());
    if route == RouteClass::Bypass {
        return next.run(request).await;
    }

    let session = resolve_session(&state, &jar, request.headers()).await;
    let profile = match &session {
        Some(s) => load_profile(&state, &s.identity).await,
        None => None,
    };

    let decision = decide(session.is_some(), profile.as_ref(), route);
    tracing::debug!(
        path = %request.uri().path(),
        ?route,
        ?decision,
        identity = session.as_ref().map(|s| s.identity.id.as_str()),
        "Access decision"
    );

    match decision {
        Decision::Allow => {
            if let (Some(session), Some(profile)) = (session, profile) {
                request.extensions_mut().insert(RequestContext {
                    access_token: session.access_token,
                    identity: session.identity,
                    profile,
                });
            }
            next.run(request).await
        }
        Decision::RedirectLogin if session.is_some() => (
            clear_session_cookie(jar, &state.config),
            Redirect::to(LOGIN_PATH),
        )
            .into_response(),
        Decision::RedirectLogin => Redirect::to(LOGIN_PATH).into_response(),
        Decision::RedirectDashboard => Redirect::to(DASHBOARD_PATH).into_response(),
    }
}
