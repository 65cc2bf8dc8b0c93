// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Academy Portal: membership management for a sports academy
//!
//! Role-gated management of member profiles, groups and shared
//! documents/images on top of a hosted auth, table and blob backend.

pub mod access;
pub mod backend;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod random;
pub mod routes;
pub mod services;

use backend::{AuthProvider, BlobStore, Store};
use config::Config;
use services::{DocumentService, GroupService, UserService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub auth: Arc<dyn AuthProvider>,
    pub store: Arc<dyn Store>,
    pub documents: DocumentService,
    pub groups: GroupService,
    pub users: UserService,
}

impl AppState {
    pub fn new(
        config: Config,
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn Store>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            documents: DocumentService::new(store.clone(), blobs),
            groups: GroupService::new(store.clone()),
            users: UserService::new(auth.clone(), store.clone()),
            config,
            auth,
            store,
        }
    }
}
