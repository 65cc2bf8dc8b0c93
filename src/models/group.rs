// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Group model: a named cohort that scopes documents and organizes members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Stored group record (`groups` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Group {
    pub id: String,
    /// Unique by convention only
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Group plus the number of profiles that reference it.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GroupWithMembers {
    #[serde(flatten)]
    pub group: Group,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub member_count: u64,
}

/// Fields an administrator may set when creating or editing a group.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GroupInput {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl GroupInput {
    /// Trim whitespace and turn an empty description into `None`.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self
    }
}
