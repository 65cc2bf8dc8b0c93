// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Group deletion guard.

use crate::models::Group;

/// Whether a group may be deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionVerdict {
    Allow,
    Deny(String),
}

/// Refuse deletion while any profile references the group.
pub fn can_delete(group: &Group, member_count: u64) -> DeletionVerdict {
    if member_count > 0 {
        tracing::debug!(group_id = %group.id, member_count, "Group deletion denied");
        DeletionVerdict::Deny("has members".to_string())
    } else {
        DeletionVerdict::Allow
    }
}
