// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Document model: metadata record for an uploaded file or image.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Kind of uploaded resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    #[default]
    #[serde(alias = "documento")]
    Document,
    #[serde(alias = "imagen")]
    Image,
}

impl DocumentKind {
    /// Infer the kind from an upload's content type.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.starts_with("image/") => DocumentKind::Image,
            _ => DocumentKind::Document,
        }
    }
}

/// Stored document record (`documents` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub kind: DocumentKind,
    /// Blob key in the storage bucket
    pub storage_key: String,
    /// Original filename, used for downloads
    pub filename: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub byte_size: Option<u64>,
    pub group_id: Option<String>,
    /// Weak reference to the uploading profile
    pub uploader_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reference to a stored blob as recorded on a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobRef {
    pub storage_key: String,
    pub filename: String,
    pub byte_size: Option<u64>,
}

/// Insert payload for a new document.
#[derive(Debug, Clone, Serialize)]
pub struct NewDocument {
    pub title: String,
    pub description: Option<String>,
    pub kind: DocumentKind,
    #[serde(flatten)]
    pub blob: BlobRef,
    pub group_id: Option<String>,
    pub uploader_id: Option<String>,
}

/// In-place update of a document. `blob` is set only when the file is replaced.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentUpdate {
    pub title: String,
    pub description: Option<String>,
    pub kind: DocumentKind,
    pub group_id: Option<String>,
    #[serde(flatten)]
    pub blob: Option<BlobRef>,
}
