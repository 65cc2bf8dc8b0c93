// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document administration (admin only).

use crate::error::{AppError, Result};
use crate::middleware::AdminContext;
use crate::models::{Document, DocumentKind};
use crate::services::{DocumentFilter, DocumentForm, Upload};
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/dashboard/admin/documentos",
            get(list_documents).post(create_document),
        )
        .route(
            "/dashboard/admin/documentos/{id}",
            get(get_document)
                .put(update_document)
                .delete(delete_document),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// A document as listed, with its group and uploader resolved to names.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DocumentView {
    #[serde(flatten)]
    pub document: Document,
    pub group_name: Option<String>,
    pub uploader_name: Option<String>,
    pub download_url: String,
}

impl DocumentView {
    pub fn new(
        document: Document,
        group_names: &HashMap<String, String>,
        uploader_names: &HashMap<String, String>,
    ) -> Self {
        let group_name = document
            .group_id
            .as_ref()
            .and_then(|id| group_names.get(id))
            .cloned();
        let uploader_name = document
            .uploader_id
            .as_ref()
            .and_then(|id| uploader_names.get(id))
            .cloned();
        let download_url = format!("/dashboard/documentos/{}/descarga", document.id);
        Self {
            document,
            group_name,
            uploader_name,
            download_url,
        }
    }
}

/// Group choice for filter and form selects.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GroupOption {
    pub id: String,
    pub name: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AdminDocumentsResponse {
    pub documents: Vec<DocumentView>,
    pub groups: Vec<GroupOption>,
}

/// All groups as select options, plus an id-to-name lookup.
pub(crate) async fn group_options(
    state: &AppState,
) -> Result<(Vec<GroupOption>, HashMap<String, String>)> {
    let groups = state.groups.list().await?;
    let names = groups
        .iter()
        .map(|g| (g.group.id.clone(), g.group.name.clone()))
        .collect();
    let options = groups
        .into_iter()
        .map(|g| GroupOption {
            id: g.group.id,
            name: g.group.name,
        })
        .collect();
    Ok((options, names))
}

/// Profile id to full name, for showing who uploaded a document.
pub(crate) async fn uploader_names(state: &AppState) -> Result<HashMap<String, String>> {
    Ok(state
        .store
        .list_profiles()
        .await?
        .into_iter()
        .map(|p| (p.id.clone(), p.full_name()))
        .collect())
}

async fn list_documents(
    State(state): State<Arc<AppState>>,
    AdminContext(ctx): AdminContext,
    Query(filter): Query<DocumentFilter>,
) -> Result<Json<AdminDocumentsResponse>> {
    let documents = state.documents.list_for(&ctx.profile, &filter).await?;
    let (groups, names) = group_options(&state).await?;
    let uploaders = uploader_names(&state).await?;

    Ok(Json(AdminDocumentsResponse {
        documents: documents
            .into_iter()
            .map(|d| DocumentView::new(d, &names, &uploaders))
            .collect(),
        groups,
    }))
}

async fn get_document(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Path(id): Path<String>,
) -> Result<Json<DocumentView>> {
    let document = state.documents.get(&id).await?;
    let (_, names) = group_options(&state).await?;
    let uploaders = uploader_names(&state).await?;
    Ok(Json(DocumentView::new(document, &names, &uploaders)))
}

async fn create_document(
    State(state): State<Arc<AppState>>,
    AdminContext(ctx): AdminContext,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Document>)> {
    let (form, upload) = read_document_form(multipart).await?;
    let document = state.documents.create(form, upload, &ctx.profile).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

async fn update_document(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Document>> {
    let (form, upload) = read_document_form(multipart).await?;
    let document = state.documents.update(&id, form, upload).await?;
    Ok(Json(document))
}

async fn delete_document(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.documents.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Collect form fields and the optional `file` part.
///
/// Unknown fields are ignored. An empty file part counts as no file.
async fn read_document_form(mut multipart: Multipart) -> Result<(DocumentForm, Option<Upload>)> {
    let mut form = DocumentForm::default();
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field
                .file_name()
                .map(str::to_string)
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| "file".to_string());
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            if !data.is_empty() {
                upload = Some(Upload {
                    filename,
                    content_type,
                    data,
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        match name.as_str() {
            "title" => form.title = value,
            "description" => form.description = Some(value),
            "kind" => form.kind = parse_kind(&value)?,
            "group_id" => form.group_id = Some(value),
            _ => {}
        }
    }

    Ok((form, upload))
}

fn parse_kind(value: &str) -> Result<Option<DocumentKind>> {
    match value.trim() {
        "" => Ok(None),
        "document" | "documento" => Ok(Some(DocumentKind::Document)),
        "image" | "imagen" => Ok(Some(DocumentKind::Image)),
        other => Err(AppError::Validation(format!("kind: unknown kind {}", other))),
    }
}
