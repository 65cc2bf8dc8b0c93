// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile administration and self-service edits.

use crate::backend::{AuthProvider, SignUpMetadata, Store};
use crate::error::{AppError, Result};
use crate::models::{ContactDetails, Group, Profile, ProfileUpdate, Role};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Admin form for creating an account.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUserForm {
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub profile: ProfileUpdate,
}

/// Admin form for editing an account.
///
/// `role` and `active` must be sent on every edit; a missing field would
/// otherwise demote or reactivate the account.
#[derive(Debug, Clone, Deserialize)]
pub struct EditUserForm {
    #[serde(flatten)]
    pub contact: ContactDetails,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    pub role: Role,
    #[serde(default)]
    pub group_id: Option<String>,
    pub active: bool,
    /// Passwords are managed by the auth provider; any value is refused.
    #[serde(default)]
    pub password: Option<String>,
}

impl From<EditUserForm> for ProfileUpdate {
    fn from(form: EditUserForm) -> Self {
        ProfileUpdate {
            contact: form.contact,
            birth_date: form.birth_date,
            role: form.role,
            group_id: form.group_id,
            active: form.active,
        }
    }
}

/// Role filter for the admin listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleFilter {
    #[default]
    All,
    #[serde(alias = "administrador")]
    Administrator,
    #[serde(alias = "usuario")]
    User,
}

/// Admin listing filters: role plus a case-insensitive search over name,
/// surname and email.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    #[serde(default)]
    pub role: RoleFilter,
    #[serde(default)]
    pub q: Option<String>,
}

impl UserFilter {
    pub fn matches(&self, profile: &Profile) -> bool {
        let role_match = match self.role {
            RoleFilter::All => true,
            RoleFilter::Administrator => profile.role == Role::Administrator,
            RoleFilter::User => profile.role == Role::User,
        };

        let term = self
            .q
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .unwrap_or_default();
        let search_match = term.is_empty()
            || profile.name.to_lowercase().contains(&term)
            || profile
                .surname
                .as_deref()
                .map(|s| s.to_lowercase().contains(&term))
                .unwrap_or(false)
            || profile.email.to_lowercase().contains(&term);

        role_match && search_match
    }
}

/// Service for profile reads and writes.
#[derive(Clone)]
pub struct UserService {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(auth: Arc<dyn AuthProvider>, store: Arc<dyn Store>) -> Self {
        Self { auth, store }
    }

    pub async fn list(&self, filter: &UserFilter) -> Result<Vec<Profile>> {
        let profiles = self.store.list_profiles().await?;
        Ok(profiles.into_iter().filter(|p| filter.matches(p)).collect())
    }

    pub async fn get(&self, id: &str) -> Result<Profile> {
        self.store
            .get_profile(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", id)))
    }

    /// A profile together with its group, if it has one.
    pub async fn get_with_group(&self, id: &str) -> Result<(Profile, Option<Group>)> {
        let profile = self.get(id).await?;
        let group = match profile.group_id.as_deref() {
            Some(group_id) => self.store.get_group(group_id).await?,
            None => None,
        };
        Ok((profile, group))
    }

    /// Register an account with the auth provider, then fill in the profile
    /// the provider created for it.
    pub async fn create(&self, form: NewUserForm) -> Result<Profile> {
        let form = NewUserForm {
            email: form.email.trim().to_lowercase(),
            profile: form.profile.normalized(),
            ..form
        };
        form.validate()?;
        // Checked before sign-up so a bad group never leaves a half-made account.
        if let Some(group_id) = form.profile.group_id.as_deref() {
            if self.store.get_group(group_id).await?.is_none() {
                return Err(AppError::BadRequest(format!(
                    "group {} does not exist",
                    group_id
                )));
            }
        }

        let metadata = SignUpMetadata {
            name: form.profile.contact.name.clone(),
            role: form.profile.role,
        };
        let identity = self
            .auth
            .sign_up(&form.email, &form.password, &metadata)
            .await?;

        let profile = self.store.update_profile(&identity.id, &form.profile).await?;
        tracing::info!(profile_id = %profile.id, role = profile.role.as_str(), "User created");
        Ok(profile)
    }

    pub async fn update(&self, id: &str, form: EditUserForm) -> Result<Profile> {
        if form.password.as_deref().is_some_and(|p| !p.is_empty()) {
            return Err(AppError::BadRequest(
                "Passwords are changed through the auth provider".to_string(),
            ));
        }
        let update = ProfileUpdate::from(form).normalized();
        update.validate()?;

        let profile = self.store.update_profile(id, &update).await?;
        tracing::info!(profile_id = %id, active = profile.active, "User updated");
        Ok(profile)
    }

    /// Soft-delete: profiles are never removed, only deactivated.
    pub async fn deactivate(&self, id: &str) -> Result<()> {
        self.get(id).await?;
        self.store.set_profile_active(id, false).await?;
        tracing::info!(profile_id = %id, "User deactivated");
        Ok(())
    }

    /// Self-service edit of the caller's own contact details.
    pub async fn update_own(&self, profile: &Profile, details: ContactDetails) -> Result<Profile> {
        let details = details.normalized();
        details.validate()?;
        Ok(self.store.update_profile_contact(&profile.id, &details).await?)
    }
}
