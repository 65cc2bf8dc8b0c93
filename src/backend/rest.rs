// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client for the hosted backend-as-a-service.
//!
//! Endpoints:
//! - `/auth/v1` for sessions and signup (public API key)
//! - `/rest/v1/<table>` for table CRUD with PostgREST-style filters
//! - `/storage/v1/object/<bucket>` for blobs
//!
//! Table and blob calls use the server-side key; authorization is decided
//! by the access gate before any call is made.

use super::{
    tables, AuthProvider, BackendError, BackendResult, BlobStore, Identity, Session,
    SignUpMetadata, Store,
};
use crate::config::Config;
use crate::models::{
    ContactDetails, Document, DocumentUpdate, Group, GroupInput, GroupWithMembers, NewDocument,
    Profile, ProfileUpdate,
};
use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Postgres error code for a foreign-key violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Hosted backend client.
#[derive(Clone)]
pub struct RestBackend {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_key: String,
    bucket: String,
}

/// User object returned by the auth endpoints.
#[derive(Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<AuthUser> for Identity {
    fn from(user: AuthUser) -> Self {
        Identity {
            id: user.id,
            email: user.email,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

/// Signup returns either a bare user or a session wrapping one, depending on
/// whether email confirmation is enabled.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session { user: AuthUser },
    User(AuthUser),
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: &'a SignUpMetadata,
}

#[derive(Deserialize)]
struct CountRow {
    count: u64,
}

/// `groups` row with an embedded `profiles(count)` aggregate.
#[derive(Deserialize)]
struct GroupCountRow {
    #[serde(flatten)]
    group: Group,
    #[serde(default)]
    profiles: Vec<CountRow>,
}

/// Error body returned by the table API.
#[derive(Deserialize, Default)]
struct RestErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
struct ActiveFlag {
    active: bool,
}

#[derive(Serialize)]
struct RemoveRequest<'a> {
    prefixes: &'a [String],
}

impl RestBackend {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.backend_url.clone(),
            anon_key: config.backend_anon_key.clone(),
            service_key: config.backend_service_key.clone(),
            bucket: config.storage_bucket.clone(),
        }
    }

    // ─── Request Helpers ─────────────────────────────────────────

    fn auth_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/auth/v1/{}", self.base_url, path))
            .header("apikey", &self.anon_key)
    }

    fn table_request(&self, method: Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/rest/v1/{}", self.base_url, table))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            urlencoding::encode(key)
        )
    }

    async fn send(request: RequestBuilder) -> BackendResult<reqwest::Response> {
        request
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))
    }

    /// Check response status and return error if not successful.
    async fn check_response(response: reqwest::Response) -> BackendResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed: RestErrorBody = serde_json::from_str(&body).unwrap_or_default();

        let message = parsed.message.unwrap_or(body);
        if parsed.code.as_deref() == Some(FOREIGN_KEY_VIOLATION) {
            return Err(BackendError::ForeignKey(message));
        }

        match status {
            StatusCode::NOT_FOUND => Err(BackendError::NotFound(message)),
            StatusCode::CONFLICT => Err(BackendError::Conflict(message)),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(BackendError::Rejected(message))
            }
            _ => Err(BackendError::Transport(format!("HTTP {}: {}", status, message))),
        }
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> BackendResult<T> {
        Self::check_response(response)
            .await?
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    // ─── Table Helpers ───────────────────────────────────────────

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> BackendResult<Vec<T>> {
        let request = self.table_request(Method::GET, table).query(query);
        Self::check_response_json(Self::send(request).await?).await
    }

    async fn select_by_id<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> BackendResult<Option<T>> {
        let rows: Vec<T> = self
            .select(table, &[("select", "*".to_string()), ("id", format!("eq.{}", id))])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> BackendResult<T> {
        let request = self
            .table_request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(body);
        let rows: Vec<T> = Self::check_response_json(Self::send(request).await?).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::Decode(format!("insert into {} returned no row", table)))
    }

    async fn update_by_id<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
        body: &B,
    ) -> BackendResult<T> {
        let request = self
            .table_request(Method::PATCH, table)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(body);
        let rows: Vec<T> = Self::check_response_json(Self::send(request).await?).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(format!("{} {}", table, id)))
    }

    /// Update a row that may point at a group, reporting a dangling
    /// `group_id` as a rejected request.
    async fn update_with_group<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
        body: &B,
        group_id: Option<&str>,
    ) -> BackendResult<T> {
        self.update_by_id(table, id, body)
            .await
            .map_err(|e| missing_group(e, group_id))
    }

    async fn delete_by_id(&self, table: &str, id: &str) -> BackendResult<()> {
        let request = self
            .table_request(Method::DELETE, table)
            .query(&[("id", format!("eq.{}", id))]);
        Self::check_response(Self::send(request).await?).await?;
        Ok(())
    }
}

/// A foreign-key failure on a write carrying `group_id` means the group is gone.
fn missing_group(err: BackendError, group_id: Option<&str>) -> BackendError {
    match (err, group_id) {
        (BackendError::ForeignKey(_), Some(group_id)) => {
            BackendError::Rejected(format!("group {} does not exist", group_id))
        }
        (err, _) => err,
    }
}

#[async_trait]
impl AuthProvider for RestBackend {
    async fn get_user(&self, access_token: &str) -> BackendResult<Option<Identity>> {
        let request = self.auth_request(Method::GET, "user").bearer_auth(access_token);
        let response = Self::send(request).await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }

        let user: AuthUser = Self::check_response_json(response).await?;
        Ok(Some(user.into()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session> {
        let request = self
            .auth_request(Method::POST, "token")
            .query(&[("grant_type", "password")])
            .json(&Credentials { email, password });
        let response = Self::send(request).await?;

        if response.status() == StatusCode::BAD_REQUEST {
            return Err(BackendError::InvalidCredentials);
        }

        let token: TokenResponse = Self::check_response_json(response).await?;
        Ok(Session {
            access_token: token.access_token,
            identity: token.user.into(),
        })
    }

    async fn sign_out(&self, access_token: &str) -> BackendResult<()> {
        let request = self
            .auth_request(Method::POST, "logout")
            .bearer_auth(access_token);
        Self::check_response(Self::send(request).await?).await?;
        Ok(())
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> BackendResult<Identity> {
        let request = self.auth_request(Method::POST, "signup").json(&SignUpRequest {
            email,
            password,
            data: metadata,
        });
        let response: SignUpResponse = Self::check_response_json(Self::send(request).await?).await?;
        let user = match response {
            SignUpResponse::Session { user } | SignUpResponse::User(user) => user,
        };
        Ok(user.into())
    }
}

#[async_trait]
impl Store for RestBackend {
    async fn list_groups(&self) -> BackendResult<Vec<GroupWithMembers>> {
        let rows: Vec<GroupCountRow> = self
            .select(
                tables::GROUPS,
                &[
                    ("select", "*,profiles(count)".to_string()),
                    ("order", "name.asc".to_string()),
                ],
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| GroupWithMembers {
                member_count: row.profiles.first().map(|c| c.count).unwrap_or(0),
                group: row.group,
            })
            .collect())
    }

    async fn get_group(&self, id: &str) -> BackendResult<Option<Group>> {
        self.select_by_id(tables::GROUPS, id).await
    }

    async fn insert_group(&self, input: &GroupInput) -> BackendResult<Group> {
        self.insert(tables::GROUPS, input).await
    }

    async fn update_group(&self, id: &str, input: &GroupInput) -> BackendResult<Group> {
        self.update_by_id(tables::GROUPS, id, input).await
    }

    async fn count_group_members(&self, id: &str) -> BackendResult<u64> {
        let rows: Vec<serde_json::Value> = self
            .select(
                tables::PROFILES,
                &[
                    ("select", "id".to_string()),
                    ("group_id", format!("eq.{}", id)),
                ],
            )
            .await?;
        Ok(rows.len() as u64)
    }

    async fn delete_group(&self, id: &str) -> BackendResult<()> {
        // profiles.group_id is the real constraint; a violation here means a
        // member was added after the count.
        if self.count_group_members(id).await? > 0 {
            return Err(BackendError::Conflict("has members".to_string()));
        }
        match self.delete_by_id(tables::GROUPS, id).await {
            Err(BackendError::ForeignKey(_)) => {
                Err(BackendError::Conflict("has members".to_string()))
            }
            other => other,
        }
    }

    async fn get_profile(&self, id: &str) -> BackendResult<Option<Profile>> {
        self.select_by_id(tables::PROFILES, id).await
    }

    async fn list_profiles(&self) -> BackendResult<Vec<Profile>> {
        self.select(
            tables::PROFILES,
            &[
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn update_profile_contact(
        &self,
        id: &str,
        details: &ContactDetails,
    ) -> BackendResult<Profile> {
        self.update_by_id(tables::PROFILES, id, details).await
    }

    async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> BackendResult<Profile> {
        self.update_with_group(tables::PROFILES, id, update, update.group_id.as_deref())
            .await
    }

    async fn set_profile_active(&self, id: &str, active: bool) -> BackendResult<()> {
        let _: Profile = self
            .update_by_id(tables::PROFILES, id, &ActiveFlag { active })
            .await?;
        Ok(())
    }

    async fn list_documents(&self) -> BackendResult<Vec<Document>> {
        self.select(
            tables::DOCUMENTS,
            &[
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn get_document(&self, id: &str) -> BackendResult<Option<Document>> {
        self.select_by_id(tables::DOCUMENTS, id).await
    }

    async fn insert_document(&self, document: &NewDocument) -> BackendResult<Document> {
        self.insert(tables::DOCUMENTS, document)
            .await
            .map_err(|e| missing_group(e, document.group_id.as_deref()))
    }

    async fn update_document(
        &self,
        id: &str,
        update: &DocumentUpdate,
    ) -> BackendResult<Document> {
        self.update_with_group(tables::DOCUMENTS, id, update, update.group_id.as_deref())
            .await
    }

    async fn delete_document(&self, id: &str) -> BackendResult<()> {
        self.delete_by_id(tables::DOCUMENTS, id).await
    }
}

#[async_trait]
impl BlobStore for RestBackend {
    async fn upload(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> BackendResult<()> {
        let request = self
            .http
            .post(self.object_url(key))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header(
                reqwest::header::CONTENT_TYPE,
                content_type.unwrap_or("application/octet-stream"),
            )
            .body(data);
        Self::check_response(Self::send(request).await?).await?;
        Ok(())
    }

    async fn download(&self, key: &str) -> BackendResult<Bytes> {
        let request = self
            .http
            .get(self.object_url(key))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key);
        let response = Self::check_response(Self::send(request).await?).await?;
        response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))
    }

    async fn remove(&self, keys: &[String]) -> BackendResult<()> {
        let request = self
            .http
            .delete(format!("{}/storage/v1/object/{}", self.base_url, self.bucket))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&RemoveRequest { prefixes: keys });
        Self::check_response(Self::send(request).await?).await?;
        Ok(())
    }
}
