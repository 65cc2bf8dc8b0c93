// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod document;
pub mod group;
pub mod profile;

pub use document::{BlobRef, Document, DocumentKind, DocumentUpdate, NewDocument};
pub use group::{Group, GroupInput, GroupWithMembers};
pub use profile::{ContactDetails, Profile, ProfileUpdate, Role};
