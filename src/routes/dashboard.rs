// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Member dashboard: scoped document listing, own profile, downloads.

use super::documents::{group_options, uploader_names, DocumentView, GroupOption};
use crate::error::Result;
use crate::middleware::RequestContext;
use crate::models::{ContactDetails, Group, Profile, Role};
use crate::services::DocumentFilter;
use crate::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/dashboard/perfil", get(get_profile).put(update_profile))
        .route("/dashboard/documentos/{id}/descarga", get(download))
}

/// Who is looking at the dashboard.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Viewer {
    pub id: String,
    pub full_name: String,
    pub role: Role,
    pub group_id: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardResponse {
    pub viewer: Viewer,
    pub documents: Vec<DocumentView>,
    /// Groups offered as filters; administrators see all of them.
    pub groups: Vec<GroupOption>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub profile: Profile,
    pub group: Option<Group>,
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Query(filter): Query<DocumentFilter>,
) -> Result<Json<DashboardResponse>> {
    let profile = &ctx.profile;
    let documents = state.documents.list_for(profile, &filter).await?;
    let (groups, names) = group_options(&state).await?;
    let uploaders = uploader_names(&state).await?;

    let groups = if profile.is_admin() {
        groups
    } else {
        groups
            .into_iter()
            .filter(|g| profile.group_id.as_deref() == Some(g.id.as_str()))
            .collect()
    };

    Ok(Json(DashboardResponse {
        viewer: Viewer {
            id: profile.id.clone(),
            full_name: profile.full_name(),
            role: profile.role,
            group_id: profile.group_id.clone(),
        },
        documents: documents
            .into_iter()
            .map(|d| DocumentView::new(d, &names, &uploaders))
            .collect(),
        groups,
    }))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<ProfileResponse>> {
    let (profile, group) = state.users.get_with_group(&ctx.profile.id).await?;
    Ok(Json(ProfileResponse { profile, group }))
}

/// Members edit their own contact details; role, group, status and birth
/// date are not part of the payload.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Json(details): Json<ContactDetails>,
) -> Result<Json<ProfileResponse>> {
    state.users.update_own(&ctx.profile, details).await?;
    tracing::info!(profile_id = %ctx.profile.id, "Own profile updated");

    let (profile, group) = state.users.get_with_group(&ctx.profile.id).await?;
    Ok(Json(ProfileResponse { profile, group }))
}

async fn download(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Response> {
    let (document, data) = state.documents.download(&id, &ctx.profile).await?;

    let content_type = HeaderValue::from_static(content_type_for(&document.filename));
    let disposition = HeaderValue::from_str(&content_disposition(&document.filename))
        .map_err(|e| anyhow::anyhow!("Bad Content-Disposition: {}", e))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(data),
    )
        .into_response())
}

fn content_type_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "txt" => "text/plain; charset=utf-8",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

/// `attachment` with an ASCII fallback name plus the RFC 5987 UTF-8 form.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_plain_name() {
        assert_eq!(
            content_disposition("reglamento.pdf"),
            "attachment; filename=\"reglamento.pdf\"; filename*=UTF-8''reglamento.pdf"
        );
    }

    #[test]
    fn test_content_disposition_non_ascii_and_quotes() {
        let value = content_disposition("Cinturón \"negro\".pdf");
        assert!(value.starts_with("attachment; filename=\"Cintur_n _negro_.pdf\""));
        assert!(value.contains("filename*=UTF-8''Cintur%C3%B3n%20%22negro%22.pdf"));
        assert!(HeaderValue::from_str(&value).is_ok());
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.PDF"), "application/pdf");
        assert_eq!(content_type_for("foto.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
