// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Profile model: the application-level record linked 1:1 to an identity.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Profile role. The store historically used Spanish values, which are
/// still accepted on read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "administrador")]
    Administrator,
    #[default]
    #[serde(alias = "usuario")]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::User => "user",
        }
    }
}

/// Stored profile record (`profiles` table). The id equals the identity id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub surname: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub role: Role,
    pub group_id: Option<String>,
    /// Profiles are never deleted, only deactivated
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }

    /// "Name Surname", or just the name when no surname is set.
    pub fn full_name(&self) -> String {
        match self.surname.as_deref().filter(|s| !s.is_empty()) {
            Some(surname) => format!("{} {}", self.name, surname),
            None => self.name.clone(),
        }
    }

    pub fn contact_details(&self) -> ContactDetails {
        ContactDetails {
            name: self.name.clone(),
            surname: self.surname.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            postal_code: self.postal_code.clone(),
        }
    }
}

/// Fields a user may edit on their own profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ContactDetails {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    #[validate(length(max = 10))]
    pub postal_code: Option<String>,
}

impl ContactDetails {
    /// Trim text fields; blank optional fields become `None`.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            surname: blank_to_none(self.surname),
            phone: blank_to_none(self.phone),
            address: blank_to_none(self.address),
            city: blank_to_none(self.city),
            postal_code: blank_to_none(self.postal_code),
        }
    }
}

/// Full set of fields an administrator may edit on any profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[serde(flatten)]
    #[validate(nested)]
    pub contact: ContactDetails,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl ProfileUpdate {
    pub fn normalized(self) -> Self {
        Self {
            contact: self.contact.normalized(),
            group_id: blank_to_none(self.group_id),
            ..self
        }
    }
}

pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
