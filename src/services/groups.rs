// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Group administration.

use crate::access::{can_delete, DeletionVerdict};
use crate::backend::Store;
use crate::error::{AppError, Result};
use crate::models::{Group, GroupInput, GroupWithMembers};
use std::sync::Arc;
use validator::Validate;

#[derive(Clone)]
pub struct GroupService {
    store: Arc<dyn Store>,
}

impl GroupService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<GroupWithMembers>> {
        Ok(self.store.list_groups().await?)
    }

    pub async fn get(&self, id: &str) -> Result<Group> {
        self.store
            .get_group(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", id)))
    }

    pub async fn create(&self, input: GroupInput) -> Result<Group> {
        let input = input.normalized();
        input.validate()?;
        let group = self.store.insert_group(&input).await?;
        tracing::info!(group_id = %group.id, name = %group.name, "Group created");
        Ok(group)
    }

    pub async fn update(&self, id: &str, input: GroupInput) -> Result<Group> {
        let input = input.normalized();
        input.validate()?;
        Ok(self.store.update_group(id, &input).await?)
    }

    /// Delete a group that no profile references.
    ///
    /// The store enforces the same rule; the check here produces the
    /// message shown to the administrator.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let group = self.get(id).await?;
        let member_count = self.store.count_group_members(id).await?;

        if let DeletionVerdict::Deny(reason) = can_delete(&group, member_count) {
            return Err(AppError::Conflict(format!(
                "Cannot delete group \"{}\": {} ({} assigned)",
                group.name, reason, member_count
            )));
        }

        self.store.delete_group(id).await?;
        tracing::info!(group_id = %id, name = %group.name, "Group deleted");
        Ok(())
    }
}
