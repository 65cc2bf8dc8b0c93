// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route classification and the access decision run before every page.

use crate::models::Profile;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
const ADMIN_PREFIX: &str = "/dashboard/admin";

const BYPASS_PREFIXES: [&str; 3] = ["/_next", "/api", "/static"];
const IMAGE_EXTENSIONS: [&str; 7] = [".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp", ".ico"];

/// How a request path is treated by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Static assets and API routes; never gated.
    Bypass,
    /// `/`
    Root,
    /// `/login`
    Login,
    /// Any other page; requires a valid session.
    Protected,
    /// Pages under `/dashboard/admin`; requires the administrator role.
    AdminOnly,
}

impl RouteClass {
    pub fn classify(path: &str) -> Self {
        // Page paths are never static assets, whatever their extension.
        let is_asset = !is_page_path(path)
            && (path == "/favicon.ico" || IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)));
        if BYPASS_PREFIXES.iter().any(|p| path.starts_with(p)) || is_asset {
            return RouteClass::Bypass;
        }

        match path {
            "/" => RouteClass::Root,
            LOGIN_PATH => RouteClass::Login,
            _ if is_admin_path(path) => RouteClass::AdminOnly,
            _ => RouteClass::Protected,
        }
    }
}

fn is_under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .map(|rest| rest.is_empty() || rest.starts_with('/'))
        .unwrap_or(false)
}

fn is_page_path(path: &str) -> bool {
    is_under(path, LOGIN_PATH) || is_under(path, DASHBOARD_PATH)
}

fn is_admin_path(path: &str) -> bool {
    is_under(path, ADMIN_PREFIX)
}

/// Outcome of the gate for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectLogin,
    RedirectDashboard,
}

/// Decide whether a request may proceed.
///
/// `profile` is `None` both when no profile exists and when loading it
/// failed; the two are indistinguishable here.
pub fn decide(identity_present: bool, profile: Option<&Profile>, route: RouteClass) -> Decision {
    match route {
        RouteClass::Bypass => Decision::Allow,
        RouteClass::Login if identity_present => Decision::RedirectDashboard,
        RouteClass::Login => Decision::Allow,
        RouteClass::Root if identity_present => Decision::RedirectDashboard,
        RouteClass::Root => Decision::RedirectLogin,
        RouteClass::Protected | RouteClass::AdminOnly => {
            let Some(profile) = profile.filter(|_| identity_present) else {
                return Decision::RedirectLogin;
            };
            if route == RouteClass::AdminOnly && !profile.is_admin() {
                Decision::RedirectDashboard
            } else {
                Decision::Allow
            }
        }
    }
}
