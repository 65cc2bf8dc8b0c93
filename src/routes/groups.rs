// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Group administration routes.

use crate::error::Result;
use crate::middleware::AdminContext;
use crate::models::{Group, GroupInput, GroupWithMembers};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/dashboard/admin/grupos",
            get(list_groups).post(create_group),
        )
        .route(
            "/dashboard/admin/grupos/{id}",
            get(get_group).put(update_group).delete(delete_group),
        )
}

async fn list_groups(State(state): State<Arc<AppState>>) -> Result<Json<Vec<GroupWithMembers>>> {
    Ok(Json(state.groups.list().await?))
}

async fn get_group(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Path(id): Path<String>,
) -> Result<Json<Group>> {
    Ok(Json(state.groups.get(&id).await?))
}

async fn create_group(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Json(input): Json<GroupInput>,
) -> Result<(StatusCode, Json<Group>)> {
    let group = state.groups.create(input).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

async fn update_group(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Path(id): Path<String>,
    Json(input): Json<GroupInput>,
) -> Result<Json<Group>> {
    Ok(Json(state.groups.update(&id, input).await?))
}

/// 409 while any profile still belongs to the group.
async fn delete_group(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.groups.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
