// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document lifecycle: blob upload plus metadata record.
//!
//! Blob and record writes are separate calls, so every sequence is ordered
//! to leave the record pointing at a live blob:
//! - create: upload, insert; a failed insert removes the new blob
//! - replace: upload new, update, then remove old; a failed update removes
//!   the new blob and keeps the old one
//! - delete: delete the record, then remove the blob
//!
//! Blob removals that fail after the record is settled only leave an
//! orphaned blob; they are logged and not reported to the caller.

use crate::access::{is_visible, scope};
use crate::backend::{BlobStore, Store};
use crate::error::{AppError, Result};
use crate::models::{BlobRef, Document, DocumentKind, DocumentUpdate, NewDocument, Profile};
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Random suffix length in generated storage keys.
const KEY_SUFFIX_LEN: usize = 7;
const MAX_EXTENSION_LEN: usize = 10;

/// A file received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Metadata fields of the document form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DocumentForm {
    #[validate(length(min = 1, max = 200, message = "title is required"))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Inferred from the upload's content type when absent
    #[serde(default)]
    pub kind: Option<DocumentKind>,
    #[serde(default)]
    pub group_id: Option<String>,
}

impl DocumentForm {
    fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: crate::models::profile::blank_to_none(self.description),
            kind: self.kind,
            group_id: crate::models::profile::blank_to_none(self.group_id),
        }
    }
}

/// Kind filter for listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindFilter {
    #[default]
    All,
    #[serde(alias = "documento")]
    Document,
    #[serde(alias = "imagen")]
    Image,
}

/// Listing filters applied after scoping.
///
/// `group` is `all` (or absent), `none` for ungrouped documents, or a
/// group id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentFilter {
    #[serde(default)]
    pub kind: KindFilter,
    #[serde(default)]
    pub group: Option<String>,
}

impl DocumentFilter {
    pub fn matches(&self, document: &Document) -> bool {
        let kind_match = match self.kind {
            KindFilter::All => true,
            KindFilter::Document => document.kind == DocumentKind::Document,
            KindFilter::Image => document.kind == DocumentKind::Image,
        };
        let group_match = match self.group.as_deref() {
            None | Some("") | Some("all") => true,
            Some("none") | Some("sin-grupo") => document.group_id.is_none(),
            Some(id) => document.group_id.as_deref() == Some(id),
        };
        kind_match && group_match
    }
}

/// Build a storage key: `<unix millis>-<random base36>.<extension>`.
pub fn storage_key(filename: &str, now: DateTime<Utc>) -> anyhow::Result<String> {
    let suffix = crate::random::base36(KEY_SUFFIX_LEN)?;
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    Ok(format!("{}-{}{}", now.timestamp_millis(), suffix, extension))
}

/// Service for document records and their blobs.
#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn Store>,
    blobs: Arc<dyn BlobStore>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn Store>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Documents visible to `profile`, newest first, narrowed by `filter`.
    pub async fn list_for(&self, profile: &Profile, filter: &DocumentFilter) -> Result<Vec<Document>> {
        let documents = self.store.list_documents().await?;
        Ok(scope(documents, profile)
            .into_iter()
            .filter(|d| filter.matches(d))
            .collect())
    }

    pub async fn get(&self, id: &str) -> Result<Document> {
        self.store
            .get_document(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))
    }

    pub async fn create(
        &self,
        form: DocumentForm,
        upload: Option<Upload>,
        uploader: &Profile,
    ) -> Result<Document> {
        let form = form.normalized();
        form.validate()?;
        let upload = upload
            .filter(|u| !u.data.is_empty())
            .ok_or_else(|| AppError::Validation("file: a file is required".to_string()))?;

        let kind = form
            .kind
            .unwrap_or_else(|| DocumentKind::from_content_type(upload.content_type.as_deref()));
        let blob = self.store_blob(&upload).await?;
        let key = blob.storage_key.clone();

        let new_document = NewDocument {
            title: form.title,
            description: form.description,
            kind,
            blob,
            group_id: form.group_id,
            uploader_id: Some(uploader.id.clone()),
        };

        match self.store.insert_document(&new_document).await {
            Ok(document) => {
                tracing::info!(
                    document_id = %document.id,
                    storage_key = %key,
                    uploader = %uploader.id,
                    "Document created"
                );
                Ok(document)
            }
            Err(e) => {
                tracing::warn!(error = %e, storage_key = %key, "Document insert failed, removing uploaded blob");
                self.discard_blob(&key).await;
                Err(e.into())
            }
        }
    }

    pub async fn update(
        &self,
        id: &str,
        form: DocumentForm,
        upload: Option<Upload>,
    ) -> Result<Document> {
        let form = form.normalized();
        form.validate()?;
        let existing = self.get(id).await?;

        let Some(upload) = upload.filter(|u| !u.data.is_empty()) else {
            let update = DocumentUpdate {
                title: form.title,
                description: form.description,
                kind: form.kind.unwrap_or(existing.kind),
                group_id: form.group_id,
                blob: None,
            };
            return Ok(self.store.update_document(id, &update).await?);
        };

        let kind = form
            .kind
            .unwrap_or_else(|| DocumentKind::from_content_type(upload.content_type.as_deref()));
        let blob = self.store_blob(&upload).await?;
        let new_key = blob.storage_key.clone();

        let update = DocumentUpdate {
            title: form.title,
            description: form.description,
            kind,
            group_id: form.group_id,
            blob: Some(blob),
        };

        match self.store.update_document(id, &update).await {
            Ok(document) => {
                self.discard_blob(&existing.storage_key).await;
                tracing::info!(
                    document_id = %id,
                    old_key = %existing.storage_key,
                    new_key = %new_key,
                    "Document file replaced"
                );
                Ok(document)
            }
            Err(e) => {
                tracing::warn!(error = %e, storage_key = %new_key, "Document update failed, keeping previous file");
                self.discard_blob(&new_key).await;
                Err(e.into())
            }
        }
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let existing = self.get(id).await?;
        self.store.delete_document(id).await?;
        self.discard_blob(&existing.storage_key).await;
        tracing::info!(document_id = %id, "Document deleted");
        Ok(())
    }

    /// Fetch a document's file, checking that `profile` may see it.
    ///
    /// Documents outside the caller's scope are reported as not found.
    pub async fn download(&self, id: &str, profile: &Profile) -> Result<(Document, Bytes)> {
        let document = self.get(id).await?;
        if !is_visible(&document, profile) {
            tracing::warn!(document_id = %id, profile_id = %profile.id, "Download outside scope");
            return Err(AppError::NotFound(format!("Document {} not found", id)));
        }
        let data = self.blobs.download(&document.storage_key).await?;
        Ok((document, data))
    }

    async fn store_blob(&self, upload: &Upload) -> Result<BlobRef> {
        let key = storage_key(&upload.filename, Utc::now())?;
        self.blobs
            .upload(&key, upload.data.clone(), upload.content_type.as_deref())
            .await?;
        Ok(BlobRef {
            storage_key: key,
            filename: upload.filename.clone(),
            byte_size: Some(upload.data.len() as u64),
        })
    }

    async fn discard_blob(&self, key: &str) {
        if let Err(e) = self.blobs.remove(&[key.to_string()]).await {
            tracing::warn!(error = %e, storage_key = %key, "Failed to remove blob; it is now orphaned");
        }
    }
}
