// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session resolution and profile loading.
//!
//! The access token is read from the session cookie first, then from an
//! `Authorization: Bearer` header, and resolved through the auth provider.

use crate::backend::Identity;
use crate::config::{Config, SESSION_COOKIE};
use crate::error::AppError;
use crate::models::Profile;
use crate::AppState;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// Identity plus the token it was resolved from.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub access_token: String,
    pub identity: Identity,
}

/// Request-scoped context for pages that passed the gate.
///
/// Inserted into request extensions; handlers take it with
/// `Extension<RequestContext>`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub access_token: String,
    pub identity: Identity,
    pub profile: Profile,
}

/// Extractor for admin handlers: the gate's context, required to carry an
/// administrator profile.
#[derive(Debug, Clone)]
pub struct AdminContext(pub RequestContext);

impl<S> FromRequestParts<S> for AdminContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)?;

        if ctx.profile.is_admin() {
            Ok(AdminContext(ctx))
        } else {
            Err(AppError::Forbidden)
        }
    }
}

fn token_from_request(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Resolve the caller's identity. Provider failures count as anonymous.
pub async fn resolve_session(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Option<ResolvedSession> {
    let access_token = token_from_request(jar, headers)?;

    match state.auth.get_user(&access_token).await {
        Ok(Some(identity)) => Some(ResolvedSession {
            access_token,
            identity,
        }),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Session lookup failed; treating request as anonymous");
            None
        }
    }
}

/// Load the profile for an identity. A failed fetch is treated as absent.
pub async fn load_profile(state: &AppState, identity: &Identity) -> Option<Profile> {
    match state.store.get_profile(&identity.id).await {
        Ok(profile) => {
            if profile.is_none() {
                tracing::warn!(identity = %identity.id, "No profile for authenticated identity");
            }
            profile
        }
        Err(e) => {
            tracing::warn!(identity = %identity.id, error = %e, "Profile load failed");
            None
        }
    }
}

/// Session cookie carrying `access_token`.
pub fn session_cookie(config: &Config, access_token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, access_token))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Jar with the session cookie removed (matching path and attributes).
pub fn clear_session_cookie(jar: CookieJar, config: &Config) -> CookieJar {
    jar.remove(
        Cookie::build(SESSION_COOKIE)
            .path("/")
            .http_only(true)
            .secure(config.cookie_secure)
            .same_site(SameSite::Lax),
    )
}
