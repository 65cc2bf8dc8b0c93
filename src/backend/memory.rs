// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process backend for local development and tests.
//!
//! Sessions are HS256 JWTs signed with the configured session key. Accounts
//! created through `sign_up` get a profile immediately, mirroring the hosted
//! provider's signup trigger. Tables live behind a single mutex so the group
//! member check and the delete happen atomically.

use super::{
    AuthProvider, BackendError, BackendResult, BlobStore, Identity, Session, SignUpMetadata,
    Store,
};
use crate::models::{
    ContactDetails, Document, DocumentUpdate, Group, GroupInput, GroupWithMembers, NewDocument,
    Profile, ProfileUpdate, Role,
};
use async_trait::async_trait;
use axum::body::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Session lifetime for issued tokens.
const SESSION_TTL_SECS: usize = 7 * 24 * 60 * 60;
const MIN_PASSWORD_LEN: usize = 6;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
struct Claims {
    /// Identity id
    sub: String,
    /// Expiration time (Unix timestamp)
    exp: usize,
    /// Issued at (Unix timestamp)
    iat: usize,
    /// Token id, so sign-out revokes only this session
    jti: String,
}

struct Account {
    identity: Identity,
    password_digest: Vec<u8>,
}

#[derive(Default)]
struct Tables {
    groups: Vec<Group>,
    profiles: Vec<Profile>,
    documents: Vec<Document>,
}

impl Tables {
    /// Reject a `group_id` that names no group, as the store's foreign key does.
    fn check_group_ref(&self, group_id: Option<&str>) -> BackendResult<()> {
        match group_id {
            Some(id) if !self.groups.iter().any(|g| g.id == id) => Err(BackendError::Rejected(
                format!("group {} does not exist", id),
            )),
            _ => Ok(()),
        }
    }
}

/// Switches that make selected operations fail, for exercising error paths.
#[derive(Debug, Default)]
pub struct FaultInjection {
    pub fail_profile_reads: AtomicBool,
    pub fail_document_insert: AtomicBool,
    pub fail_document_update: AtomicBool,
    pub fail_blob_upload: AtomicBool,
}

impl FaultInjection {
    fn check(flag: &AtomicBool, what: &str) -> BackendResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(BackendError::Transport(format!("injected failure: {}", what)))
        } else {
            Ok(())
        }
    }
}

pub struct MemoryBackend {
    signing_key: Vec<u8>,
    /// Keyed by lowercase email
    accounts: DashMap<String, Account>,
    /// Signed-out token ids with their expiry; pruned once expired
    revoked: DashMap<String, usize>,
    tables: Mutex<Tables>,
    blobs: DashMap<String, Bytes>,
    pub faults: FaultInjection,
}

impl MemoryBackend {
    pub fn new(signing_key: &[u8]) -> Self {
        Self {
            signing_key: signing_key.to_vec(),
            accounts: DashMap::new(),
            revoked: DashMap::new(),
            tables: Mutex::new(Tables::default()),
            blobs: DashMap::new(),
            faults: FaultInjection::default(),
        }
    }

    /// Register an account and its profile in one step.
    pub async fn create_account(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: Role,
    ) -> BackendResult<Identity> {
        let metadata = SignUpMetadata {
            name: name.to_string(),
            role,
        };
        self.sign_up(email, password, &metadata).await
    }

    /// Whether a blob is currently stored under `key`.
    pub fn has_blob(&self, key: &str) -> bool {
        self.blobs.contains_key(key)
    }

    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }

    fn tables(&self) -> BackendResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| BackendError::Transport("memory store lock poisoned".to_string()))
    }

    fn issue_token(&self, identity: &Identity) -> BackendResult<String> {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: identity.id.clone(),
            iat: now,
            exp: now + SESSION_TTL_SECS,
            jti: new_id()?,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.signing_key),
        )
        .map_err(|e| BackendError::Transport(format!("token signing failed: {}", e)))
    }

    fn decode_token(&self, token: &str) -> Option<Claims> {
        let key = DecodingKey::from_secret(&self.signing_key);
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &key, &validation)
            .ok()
            .map(|data| data.claims)
    }
}

fn new_id() -> BackendResult<String> {
    crate::random::hex_id(16).map_err(|e| BackendError::Transport(e.to_string()))
}

fn digest(password: &str) -> Vec<u8> {
    ring::digest::digest(&ring::digest::SHA256, password.as_bytes())
        .as_ref()
        .to_vec()
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    async fn get_user(&self, access_token: &str) -> BackendResult<Option<Identity>> {
        let Some(claims) = self.decode_token(access_token) else {
            return Ok(None);
        };
        if self.revoked.contains_key(&claims.jti) {
            return Ok(None);
        }
        Ok(self
            .accounts
            .iter()
            .find(|entry| entry.identity.id == claims.sub)
            .map(|entry| entry.identity.clone()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session> {
        let identity = {
            let account = self
                .accounts
                .get(&email.trim().to_lowercase())
                .ok_or(BackendError::InvalidCredentials)?;
            if account.password_digest != digest(password) {
                return Err(BackendError::InvalidCredentials);
            }
            account.identity.clone()
        };

        let access_token = self.issue_token(&identity)?;
        Ok(Session {
            access_token,
            identity,
        })
    }

    async fn sign_out(&self, access_token: &str) -> BackendResult<()> {
        if let Some(claims) = self.decode_token(access_token) {
            // Expired tokens fail validation anyway, so their ids can go.
            let now = Utc::now().timestamp() as usize;
            self.revoked.retain(|_, exp| *exp > now);
            self.revoked.insert(claims.jti, claims.exp);
        }
        Ok(())
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> BackendResult<Identity> {
        let email = email.trim().to_lowercase();
        if password.len() < MIN_PASSWORD_LEN {
            return Err(BackendError::Rejected(format!(
                "Password should be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if self.accounts.contains_key(&email) {
            return Err(BackendError::Rejected("User already registered".to_string()));
        }

        let identity = Identity {
            id: new_id()?,
            email: Some(email.clone()),
        };
        let now = Utc::now();
        let profile = Profile {
            id: identity.id.clone(),
            name: metadata.name.clone(),
            surname: None,
            email: email.clone(),
            phone: None,
            address: None,
            city: None,
            postal_code: None,
            birth_date: None,
            role: metadata.role,
            group_id: None,
            active: true,
            created_at: now,
            updated_at: now,
        };

        self.tables()?.profiles.push(profile);
        self.accounts.insert(
            email,
            Account {
                identity: identity.clone(),
                password_digest: digest(password),
            },
        );

        tracing::debug!(id = %identity.id, "Memory account created");
        Ok(identity)
    }
}

#[async_trait]
impl Store for MemoryBackend {
    async fn list_groups(&self) -> BackendResult<Vec<GroupWithMembers>> {
        let tables = self.tables()?;
        let mut groups: Vec<GroupWithMembers> = tables
            .groups
            .iter()
            .map(|g| GroupWithMembers {
                group: g.clone(),
                member_count: tables
                    .profiles
                    .iter()
                    .filter(|p| p.group_id.as_deref() == Some(g.id.as_str()))
                    .count() as u64,
            })
            .collect();
        groups.sort_by(|a, b| a.group.name.cmp(&b.group.name));
        Ok(groups)
    }

    async fn get_group(&self, id: &str) -> BackendResult<Option<Group>> {
        Ok(self.tables()?.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn insert_group(&self, input: &GroupInput) -> BackendResult<Group> {
        let now = Utc::now();
        let group = Group {
            id: new_id()?,
            name: input.name.clone(),
            description: input.description.clone(),
            created_at: now,
            updated_at: now,
        };
        self.tables()?.groups.push(group.clone());
        Ok(group)
    }

    async fn update_group(&self, id: &str, input: &GroupInput) -> BackendResult<Group> {
        let mut tables = self.tables()?;
        let group = tables
            .groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| BackendError::NotFound(format!("group {}", id)))?;
        group.name = input.name.clone();
        group.description = input.description.clone();
        group.updated_at = Utc::now();
        Ok(group.clone())
    }

    async fn count_group_members(&self, id: &str) -> BackendResult<u64> {
        Ok(self
            .tables()?
            .profiles
            .iter()
            .filter(|p| p.group_id.as_deref() == Some(id))
            .count() as u64)
    }

    async fn delete_group(&self, id: &str) -> BackendResult<()> {
        let mut tables = self.tables()?;
        if tables
            .profiles
            .iter()
            .any(|p| p.group_id.as_deref() == Some(id))
        {
            return Err(BackendError::Conflict("has members".to_string()));
        }
        let before = tables.groups.len();
        tables.groups.retain(|g| g.id != id);
        if tables.groups.len() == before {
            return Err(BackendError::NotFound(format!("group {}", id)));
        }
        Ok(())
    }

    async fn get_profile(&self, id: &str) -> BackendResult<Option<Profile>> {
        FaultInjection::check(&self.faults.fail_profile_reads, "profile read")?;
        Ok(self.tables()?.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn list_profiles(&self) -> BackendResult<Vec<Profile>> {
        Ok(self.tables()?.profiles.iter().rev().cloned().collect())
    }

    async fn update_profile_contact(
        &self,
        id: &str,
        details: &ContactDetails,
    ) -> BackendResult<Profile> {
        let mut tables = self.tables()?;
        let profile = tables
            .profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| BackendError::NotFound(format!("profile {}", id)))?;
        profile.name = details.name.clone();
        profile.surname = details.surname.clone();
        profile.phone = details.phone.clone();
        profile.address = details.address.clone();
        profile.city = details.city.clone();
        profile.postal_code = details.postal_code.clone();
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> BackendResult<Profile> {
        let mut tables = self.tables()?;
        tables.check_group_ref(update.group_id.as_deref())?;
        let profile = tables
            .profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| BackendError::NotFound(format!("profile {}", id)))?;
        let contact = &update.contact;
        profile.name = contact.name.clone();
        profile.surname = contact.surname.clone();
        profile.phone = contact.phone.clone();
        profile.address = contact.address.clone();
        profile.city = contact.city.clone();
        profile.postal_code = contact.postal_code.clone();
        profile.birth_date = update.birth_date;
        profile.role = update.role;
        profile.group_id = update.group_id.clone();
        profile.active = update.active;
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn set_profile_active(&self, id: &str, active: bool) -> BackendResult<()> {
        let mut tables = self.tables()?;
        let profile = tables
            .profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| BackendError::NotFound(format!("profile {}", id)))?;
        profile.active = active;
        profile.updated_at = Utc::now();
        Ok(())
    }

    async fn list_documents(&self) -> BackendResult<Vec<Document>> {
        Ok(self.tables()?.documents.iter().rev().cloned().collect())
    }

    async fn get_document(&self, id: &str) -> BackendResult<Option<Document>> {
        Ok(self
            .tables()?
            .documents
            .iter()
            .find(|d| d.id == id)
            .cloned())
    }

    async fn insert_document(&self, document: &NewDocument) -> BackendResult<Document> {
        FaultInjection::check(&self.faults.fail_document_insert, "document insert")?;

        let mut tables = self.tables()?;
        tables.check_group_ref(document.group_id.as_deref())?;
        let now = Utc::now();
        let stored = Document {
            id: new_id()?,
            title: document.title.clone(),
            description: document.description.clone(),
            kind: document.kind,
            storage_key: document.blob.storage_key.clone(),
            filename: document.blob.filename.clone(),
            byte_size: document.blob.byte_size,
            group_id: document.group_id.clone(),
            uploader_id: document.uploader_id.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.documents.push(stored.clone());
        Ok(stored)
    }

    async fn update_document(
        &self,
        id: &str,
        update: &DocumentUpdate,
    ) -> BackendResult<Document> {
        FaultInjection::check(&self.faults.fail_document_update, "document update")?;

        let mut tables = self.tables()?;
        tables.check_group_ref(update.group_id.as_deref())?;
        let document = tables
            .documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| BackendError::NotFound(format!("document {}", id)))?;
        document.title = update.title.clone();
        document.description = update.description.clone();
        document.kind = update.kind;
        document.group_id = update.group_id.clone();
        if let Some(blob) = &update.blob {
            document.storage_key = blob.storage_key.clone();
            document.filename = blob.filename.clone();
            document.byte_size = blob.byte_size;
        }
        document.updated_at = Utc::now();
        Ok(document.clone())
    }

    async fn delete_document(&self, id: &str) -> BackendResult<()> {
        let mut tables = self.tables()?;
        let before = tables.documents.len();
        tables.documents.retain(|d| d.id != id);
        if tables.documents.len() == before {
            return Err(BackendError::NotFound(format!("document {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBackend {
    async fn upload(
        &self,
        key: &str,
        data: Bytes,
        _content_type: Option<&str>,
    ) -> BackendResult<()> {
        FaultInjection::check(&self.faults.fail_blob_upload, "blob upload")?;
        if self.blobs.contains_key(key) {
            return Err(BackendError::Conflict(format!("blob {} already exists", key)));
        }
        self.blobs.insert(key.to_string(), data);
        Ok(())
    }

    async fn download(&self, key: &str) -> BackendResult<Bytes> {
        self.blobs
            .get(key)
            .map(|b| b.value().clone())
            .ok_or_else(|| BackendError::NotFound(format!("blob {}", key)))
    }

    async fn remove(&self, keys: &[String]) -> BackendResult<()> {
        for key in keys {
            self.blobs.remove(key);
        }
        Ok(())
    }
}
