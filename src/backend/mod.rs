// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contracts for the hosted backend: auth provider, relational store and
//! blob store.
//!
//! Two implementations exist:
//! - [`RestBackend`] talks to the hosted service over HTTP
//! - [`MemoryBackend`] keeps everything in process (local dev, tests)

pub mod memory;
pub mod rest;

pub use memory::MemoryBackend;
pub use rest::RestBackend;

use crate::models::{
    ContactDetails, Document, DocumentUpdate, Group, GroupInput, GroupWithMembers, NewDocument,
    Profile, ProfileUpdate, Role,
};
use async_trait::async_trait;
use axum::body::Bytes;
use serde::{Deserialize, Serialize};

/// Table names in the relational store.
pub mod tables {
    pub const GROUPS: &str = "groups";
    pub const PROFILES: &str = "profiles";
    pub const DOCUMENTS: &str = "documents";
}

/// Errors reported by a backend call.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(String),

    /// A write touched a row that another row references, or referenced a
    /// row that does not exist.
    #[error("foreign key violation: {0}")]
    ForeignKey(String),

    /// The service refused the request (e.g. duplicate email on signup).
    #[error("{0}")]
    Rejected(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Authenticated-user handle issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Result of a successful sign-in.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub identity: Identity,
}

/// Metadata attached to a new account; the provider copies it into the
/// profile it creates.
#[derive(Debug, Clone, Serialize)]
pub struct SignUpMetadata {
    pub name: String,
    pub role: Role,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve an access token. Unknown or expired tokens yield `Ok(None)`.
    async fn get_user(&self, access_token: &str) -> BackendResult<Option<Identity>>;

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session>;

    async fn sign_out(&self, access_token: &str) -> BackendResult<()>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> BackendResult<Identity>;
}

#[async_trait]
pub trait Store: Send + Sync {
    // ─── Groups ──────────────────────────────────────────────────

    /// All groups ordered by name, with member counts.
    async fn list_groups(&self) -> BackendResult<Vec<GroupWithMembers>>;

    async fn get_group(&self, id: &str) -> BackendResult<Option<Group>>;

    async fn insert_group(&self, input: &GroupInput) -> BackendResult<Group>;

    async fn update_group(&self, id: &str, input: &GroupInput) -> BackendResult<Group>;

    async fn count_group_members(&self, id: &str) -> BackendResult<u64>;

    /// Delete a group. Fails with [`BackendError::Conflict`] while any
    /// profile references it.
    async fn delete_group(&self, id: &str) -> BackendResult<()>;

    // ─── Profiles ────────────────────────────────────────────────

    async fn get_profile(&self, id: &str) -> BackendResult<Option<Profile>>;

    /// All profiles, newest first.
    async fn list_profiles(&self) -> BackendResult<Vec<Profile>>;

    async fn update_profile_contact(
        &self,
        id: &str,
        details: &ContactDetails,
    ) -> BackendResult<Profile>;

    async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> BackendResult<Profile>;

    async fn set_profile_active(&self, id: &str, active: bool) -> BackendResult<()>;

    // ─── Documents ───────────────────────────────────────────────

    /// All documents, newest first.
    async fn list_documents(&self) -> BackendResult<Vec<Document>>;

    async fn get_document(&self, id: &str) -> BackendResult<Option<Document>>;

    async fn insert_document(&self, document: &NewDocument) -> BackendResult<Document>;

    async fn update_document(&self, id: &str, update: &DocumentUpdate)
        -> BackendResult<Document>;

    async fn delete_document(&self, id: &str) -> BackendResult<()>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, key: &str, data: Bytes, content_type: Option<&str>)
        -> BackendResult<()>;

    async fn download(&self, key: &str) -> BackendResult<Bytes>;

    async fn remove(&self, keys: &[String]) -> BackendResult<()>;
}
