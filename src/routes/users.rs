// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User administration routes.

use super::documents::{group_options, GroupOption};
use crate::error::Result;
use crate::middleware::AdminContext;
use crate::models::{Group, Profile};
use crate::services::{EditUserForm, NewUserForm, UserFilter};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/dashboard/admin/usuarios",
            get(list_users).post(create_user),
        )
        .route(
            "/dashboard/admin/usuarios/{id}",
            get(get_user).put(update_user).delete(deactivate_user),
        )
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserRow {
    #[serde(flatten)]
    pub profile: Profile,
    pub group_name: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UsersResponse {
    pub users: Vec<UserRow>,
    pub groups: Vec<GroupOption>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserDetail {
    pub profile: Profile,
    pub group: Option<Group>,
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Query(filter): Query<UserFilter>,
) -> Result<Json<UsersResponse>> {
    let profiles = state.users.list(&filter).await?;
    let (groups, names) = group_options(&state).await?;

    let users = profiles
        .into_iter()
        .map(|profile| UserRow {
            group_name: profile
                .group_id
                .as_ref()
                .and_then(|id| names.get(id))
                .cloned(),
            profile,
        })
        .collect();

    Ok(Json(UsersResponse { users, groups }))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Path(id): Path<String>,
) -> Result<Json<UserDetail>> {
    let (profile, group) = state.users.get_with_group(&id).await?;
    Ok(Json(UserDetail { profile, group }))
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Json(form): Json<NewUserForm>,
) -> Result<(StatusCode, Json<Profile>)> {
    let profile = state.users.create(form).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Path(id): Path<String>,
    Json(form): Json<EditUserForm>,
) -> Result<Json<Profile>> {
    Ok(Json(state.users.update(&id, form).await?))
}

/// Accounts are deactivated, never removed.
async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.users.deactivate(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
