// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authorization decisions: route gating, document scoping and the group
//! deletion guard. Everything here is pure; callers do the I/O.

pub mod gate;
pub mod guard;
pub mod scope;

pub use gate::{decide, Decision, RouteClass, DASHBOARD_PATH, LOGIN_PATH};
pub use guard::{can_delete, DeletionVerdict};
pub use scope::{is_visible, scope};
