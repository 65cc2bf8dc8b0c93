// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development.

use std::env;

/// Name of the session cookie carrying the auth provider's access token.
pub const SESSION_COOKIE: &str = "academy_session";

/// Default blob bucket for uploaded documents and images.
pub const DEFAULT_STORAGE_BUCKET: &str = "documentos-judo";

const DEFAULT_MAX_UPLOAD_MB: usize = 25;

/// Which backend implementation serves auth, tables and blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    /// Hosted backend-as-a-service over HTTP.
    Rest,
    /// In-process backend for local development and tests.
    Memory,
}

impl std::str::FromStr for BackendMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(BackendMode::Rest),
            "memory" => Ok(BackendMode::Memory),
            _ => Err(ConfigError::Invalid("BACKEND_MODE", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Front end origin allowed by CORS
    pub frontend_url: String,
    /// Backend implementation
    pub backend_mode: BackendMode,
    /// Base URL of the hosted backend (REST mode)
    pub backend_url: String,
    /// Public API key sent to the auth endpoints (REST mode)
    pub backend_anon_key: String,
    /// Server-side key for table and blob access (REST mode)
    pub backend_service_key: String,
    /// Blob bucket name
    pub storage_bucket: String,
    /// Signing key for memory-mode session tokens (raw bytes)
    pub session_signing_key: Vec<u8>,
    /// Whether session cookies carry the `Secure` attribute
    pub cookie_secure: bool,
    /// Upper bound for multipart document uploads
    pub max_upload_bytes: usize,
    /// Administrator account created at startup in memory mode
    pub seed_admin: Option<SeedAccount>,
}

/// Credentials for an account seeded into the memory backend.
#[derive(Debug, Clone)]
pub struct SeedAccount {
    pub email: String,
    pub password: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let backend_mode: BackendMode = env::var("BACKEND_MODE")
            .unwrap_or_else(|_| "rest".to_string())
            .parse()?;

        let (backend_url, backend_anon_key, backend_service_key) = match backend_mode {
            BackendMode::Rest => (
                env::var("BACKEND_URL")
                    .map(|v| v.trim().trim_end_matches('/').to_string())
                    .map_err(|_| ConfigError::Missing("BACKEND_URL"))?,
                env::var("BACKEND_ANON_KEY")
                    .map(|v| v.trim().to_string())
                    .map_err(|_| ConfigError::Missing("BACKEND_ANON_KEY"))?,
                env::var("BACKEND_SERVICE_KEY")
                    .map(|v| v.trim().to_string())
                    .map_err(|_| ConfigError::Missing("BACKEND_SERVICE_KEY"))?,
            ),
            BackendMode::Memory => (String::new(), String::new(), String::new()),
        };

        let session_signing_key = match (backend_mode, env::var("SESSION_SIGNING_KEY")) {
            (_, Ok(key)) => key.into_bytes(),
            (BackendMode::Rest, Err(_)) => Vec::new(),
            (BackendMode::Memory, Err(_)) => {
                return Err(ConfigError::Missing("SESSION_SIGNING_KEY"))
            }
        };

        let seed_admin = match (env::var("SEED_ADMIN_EMAIL"), env::var("SEED_ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(SeedAccount { email, password }),
            _ => None,
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            backend_mode,
            backend_url,
            backend_anon_key,
            backend_service_key,
            storage_bucket: env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| DEFAULT_STORAGE_BUCKET.to_string()),
            session_signing_key,
            cookie_secure: env::var("COOKIE_SECURE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            max_upload_bytes: env::var("MAX_UPLOAD_MB")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_MB)
                * 1024
                * 1024,
            seed_admin,
        })
    }

    /// Config for tests: memory backend, insecure cookies.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:3000".to_string(),
            backend_mode: BackendMode::Memory,
            backend_url: String::new(),
            backend_anon_key: String::new(),
            backend_service_key: String::new(),
            storage_bucket: DEFAULT_STORAGE_BUCKET.to_string(),
            session_signing_key: b"test_session_key_32_bytes_min!!".to_vec(),
            cookie_secure: false,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            seed_admin: None,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
