// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (session, access gate, security headers).

pub mod gate;
pub mod security;
pub mod session;

pub use gate::require_access;
pub use session::{AdminContext, RequestContext};
