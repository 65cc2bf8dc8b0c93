// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Academy Portal API Server
//!
//! Serves the gated dashboard pages and admin actions for the academy's
//! members, groups and documents.

use academy_portal::{
    backend::{MemoryBackend, RestBackend},
    config::{BackendMode, Config},
    models::Role,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, mode = ?config.backend_mode, "Starting Academy Portal");

    let state = match config.backend_mode {
        BackendMode::Rest => {
            let backend = Arc::new(RestBackend::new(&config));
            tracing::info!(url = %config.backend_url, bucket = %config.storage_bucket, "Using hosted backend");
            AppState::new(config.clone(), backend.clone(), backend.clone(), backend)
        }
        BackendMode::Memory => {
            let backend = Arc::new(MemoryBackend::new(&config.session_signing_key));
            if let Some(seed) = &config.seed_admin {
                backend
                    .create_account(&seed.email, &seed.password, "Administrator", Role::Administrator)
                    .await?;
                tracing::info!(email = %seed.email, "Seeded administrator account");
            }
            tracing::warn!("Using in-memory backend; data is lost on restart");
            AppState::new(config.clone(), backend.clone(), backend.clone(), backend)
        }
    };

    // Build router
    let app = academy_portal::routes::create_router(Arc::new(state));

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("academy_portal=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
