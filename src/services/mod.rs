// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod documents;
pub mod groups;
pub mod users;

pub use documents::{DocumentFilter, DocumentForm, DocumentService, Upload};
pub use groups::GroupService;
pub use users::{EditUserForm, NewUserForm, UserFilter, UserService};
