// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Group and user administration, plus self-service profile edits.

use academy_portal::backend::{AuthProvider, Store};
use academy_portal::models::Role;
use axum::{body::Body, http::StatusCode};
use serde_json::json;

mod common;
use common::{body_json, create_test_app, json_request, request, PASSWORD};

#[tokio::test]
async fn test_group_crud_and_member_counts() {
    let app = create_test_app();
    let admin = app.member("admin@example.com", Role::Administrator, None).await;

    let response = app
        .send(json_request(
            "POST",
            "/dashboard/admin/grupos",
            &admin.token,
            json!({ "name": "  Infantil ", "description": "" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let group = body_json(response).await;
    assert_eq!(group["name"], "Infantil");
    assert!(group["description"].is_null());
    let id = group["id"].as_str().unwrap().to_string();

    app.member("ana@example.com", Role::User, Some(id.as_str())).await;

    let list = app
        .send(
            request("GET", "/dashboard/admin/grupos", Some(admin.token.as_str()))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(list.status(), StatusCode::OK);
    let list = body_json(list).await;
    assert_eq!(list[0]["name"], "Infantil");
    assert_eq!(list[0]["member_count"], 1);

    let renamed = app
        .send(json_request(
            "PUT",
            &format!("/dashboard/admin/grupos/{id}"),
            &admin.token,
            json!({ "name": "Infantil A", "description": "Martes y jueves" }),
        ))
        .await;
    assert_eq!(renamed.status(), StatusCode::OK);
    let renamed = body_json(renamed).await;
    assert_eq!(renamed["name"], "Infantil A");
    assert_eq!(renamed["description"], "Martes y jueves");
}

#[tokio::test]
async fn test_group_requires_name() {
    let app = create_test_app();
    let admin = app.member("admin@example.com", Role::Administrator, None).await;

    let response = app
        .send(json_request(
            "POST",
            "/dashboard/admin/grupos",
            &admin.token,
            json!({ "name": "   " }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
    assert!(app.state.groups.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_group_with_members_cannot_be_deleted() {
    let app = create_test_app();
    let admin = app.member("admin@example.com", Role::Administrator, None).await;
    let group = app.group("Alevín").await;
    app.member("ana@example.com", Role::User, Some(group.as_str())).await;

    let response = app
        .send(
            request(
                "DELETE",
                &format!("/dashboard/admin/grupos/{group}"),
                Some(admin.token.as_str()),
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert!(body["details"].as_str().unwrap().contains("has members"));
    assert!(app.backend.get_group(&group).await.unwrap().is_some());
}

#[tokio::test]
async fn test_empty_group_is_deleted() {
    let app = create_test_app();
    let admin = app.member("admin@example.com", Role::Administrator, None).await;
    let group = app.group("Veteranos").await;

    let response = app
        .send(
            request(
                "DELETE",
                &format!("/dashboard/admin/grupos/{group}"),
                Some(admin.token.as_str()),
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(app.backend.get_group(&group).await.unwrap().is_none());

    let again = app
        .send(
            request(
                "DELETE",
                &format!("/dashboard/admin/grupos/{group}"),
                Some(admin.token.as_str()),
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_user_fills_profile() {
    let app = create_test_app();
    let admin = app.member("admin@example.com", Role::Administrator, None).await;
    let group = app.group("Infantil").await;

    let response = app
        .send(json_request(
            "POST",
            "/dashboard/admin/usuarios",
            &admin.token,
            json!({
                "email": "Luis@Example.com",
                "password": "tatami-2026",
                "name": "Luis",
                "surname": "Pérez",
                "phone": "600111222",
                "birth_date": "2012-05-04",
                "role": "usuario",
                "group_id": group,
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let profile = body_json(response).await;
    assert_eq!(profile["email"], "luis@example.com");
    assert_eq!(profile["surname"], "Pérez");
    assert_eq!(profile["birth_date"], "2012-05-04");
    assert_eq!(profile["role"], "user");
    assert_eq!(profile["group_id"], group.as_str());
    assert_eq!(profile["active"], true);

    let session = app
        .backend
        .sign_in("luis@example.com", "tatami-2026")
        .await
        .unwrap();
    assert_eq!(session.identity.id, profile["id"].as_str().unwrap());
}

#[tokio::test]
async fn test_short_password_rejected_before_sign_up() {
    let app = create_test_app();
    let admin = app.member("admin@example.com", Role::Administrator, None).await;

    let response = app
        .send(json_request(
            "POST",
            "/dashboard/admin/usuarios",
            &admin.token,
            json!({
                "email": "luis@example.com",
                "password": "12345",
                "name": "Luis",
            }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["details"].as_str().unwrap().contains("password"));
    assert!(app
        .backend
        .sign_in("luis@example.com", "12345")
        .await
        .is_err());
    assert_eq!(app.backend.list_profiles().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_email_rejected() {
    let app = create_test_app();
    let admin = app.member("admin@example.com", Role::Administrator, None).await;

    let response = app
        .send(json_request(
            "POST",
            "/dashboard/admin/usuarios",
            &admin.token,
            json!({ "email": "not-an-email", "password": PASSWORD, "name": "Luis" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_duplicate_email_is_bad_request() {
    let app = create_test_app();
    let admin = app.member("admin@example.com", Role::Administrator, None).await;

    let response = app
        .send(json_request(
            "POST",
            "/dashboard/admin/usuarios",
            &admin.token,
            json!({ "email": "admin@example.com", "password": PASSWORD, "name": "Otra" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_edit_user_rejects_password_change() {
    let app = create_test_app();
    let admin = app.member("admin@example.com", Role::Administrator, None).await;
    let ana = app.member("ana@example.com", Role::User, None).await;

    let response = app
        .send(json_request(
            "PUT",
            &format!("/dashboard/admin/usuarios/{}", ana.id),
            &admin.token,
            json!({
                "name": "Ana",
                "role": "user",
                "active": true,
                "password": "nueva-clave",
            }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_edit_user_without_role_or_active_is_rejected() {
    let app = create_test_app();
    let admin = app.member("admin@example.com", Role::Administrator, None).await;
    let eva = app.member("eva@example.com", Role::Administrator, None).await;
    app.state.users.deactivate(&eva.id).await.unwrap();

    for body in [
        json!({ "name": "Eva", "active": false }),
        json!({ "name": "Eva", "role": "administrator" }),
    ] {
        let response = app
            .send(json_request(
                "PUT",
                &format!("/dashboard/admin/usuarios/{}", eva.id),
                &admin.token,
                body,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    let profile = app.backend.get_profile(&eva.id).await.unwrap().unwrap();
    assert_eq!(profile.role, Role::Administrator);
    assert!(!profile.active);
}

#[tokio::test]
async fn test_create_user_with_unknown_group_creates_no_account() {
    let app = create_test_app();
    let admin = app.member("admin@example.com", Role::Administrator, None).await;

    let response = app
        .send(json_request(
            "POST",
            "/dashboard/admin/usuarios",
            &admin.token,
            json!({
                "email": "luis@example.com",
                "password": PASSWORD,
                "name": "Luis",
                "group_id": "ghost-group",
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let err = app.backend.sign_in("luis@example.com", PASSWORD).await;
    assert!(err.is_err());
}

#[tokio::test]
async fn test_edit_user_with_unknown_group_is_rejected() {
    let app = create_test_app();
    let admin = app.member("admin@example.com", Role::Administrator, None).await;
    let ana = app.member("ana@example.com", Role::User, None).await;

    let response = app
        .send(json_request(
            "PUT",
            &format!("/dashboard/admin/usuarios/{}", ana.id),
            &admin.token,
            json!({
                "name": "Ana",
                "role": "user",
                "group_id": "ghost-group",
                "active": true,
            }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["details"], "group ghost-group does not exist");

    let profile = app.backend.get_profile(&ana.id).await.unwrap().unwrap();
    assert_eq!(profile.group_id, None);
}

#[tokio::test]
async fn test_edit_user_promotes_and_assigns_group() {
    let app = create_test_app();
    let admin = app.member("admin@example.com", Role::Administrator, None).await;
    let ana = app.member("ana@example.com", Role::User, None).await;
    let group = app.group("Técnicos").await;

    let response = app
        .send(json_request(
            "PUT",
            &format!("/dashboard/admin/usuarios/{}", ana.id),
            &admin.token,
            json!({
                "name": "Ana",
                "surname": "García",
                "role": "administrador",
                "group_id": group,
                "active": true,
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body_json(response).await;
    assert_eq!(profile["role"], "administrator");
    assert_eq!(profile["group_id"], group.as_str());

    // The new role applies on the next request
    let admin_page = app
        .send(
            request("GET", "/dashboard/admin/usuarios", Some(ana.token.as_str()))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(admin_page.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_user_deactivates() {
    let app = create_test_app();
    let admin = app.member("admin@example.com", Role::Administrator, None).await;
    let ana = app.member("ana@example.com", Role::User, None).await;

    let response = app
        .send(
            request(
                "DELETE",
                &format!("/dashboard/admin/usuarios/{}", ana.id),
                Some(admin.token.as_str()),
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let profile = app.backend.get_profile(&ana.id).await.unwrap().unwrap();
    assert!(!profile.active);

    let missing = app
        .send(
            request(
                "DELETE",
                "/dashboard/admin/usuarios/nobody",
                Some(admin.token.as_str()),
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_list_filters() {
    let app = create_test_app();
    let admin = app.member("admin@example.com", Role::Administrator, None).await;
    let group = app.group("Infantil").await;
    app.member("ana@example.com", Role::User, Some(group.as_str())).await;
    app.member("luis@example.com", Role::User, None).await;

    let admins = app
        .send(
            request(
                "GET",
                "/dashboard/admin/usuarios?role=administrador",
                Some(admin.token.as_str()),
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await;
    let admins = body_json(admins).await;
    let users = admins["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "admin@example.com");

    let search = app
        .send(
            request(
                "GET",
                "/dashboard/admin/usuarios?q=ANA",
                Some(admin.token.as_str()),
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await;
    let search = body_json(search).await;
    let users = search["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "ana@example.com");
    assert_eq!(users[0]["group_name"], "Infantil");

    let all = app
        .send(
            request("GET", "/dashboard/admin/usuarios", Some(admin.token.as_str()))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    let all = body_json(all).await;
    let emails: Vec<&str> = all["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap())
        .collect();
    // Newest first
    assert_eq!(
        emails,
        vec!["luis@example.com", "ana@example.com", "admin@example.com"]
    );
}

#[tokio::test]
async fn test_own_profile_shows_group() {
    let app = create_test_app();
    let group = app.group("Alevín").await;
    let ana = app.member("ana@example.com", Role::User, Some(group.as_str())).await;

    let response = app
        .send(
            request("GET", "/dashboard/perfil", Some(ana.token.as_str()))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["profile"]["email"], "ana@example.com");
    assert_eq!(body["group"]["name"], "Alevín");
}

#[tokio::test]
async fn test_own_profile_edit_limited_to_contact_fields() {
    let app = create_test_app();
    let ana = app.member("ana@example.com", Role::User, None).await;

    let response = app
        .send(json_request(
            "PUT",
            "/dashboard/perfil",
            &ana.token,
            json!({
                "name": "Ana María",
                "phone": " 600123456 ",
                "city": "Zaragoza",
                "postal_code": "50001",
                "role": "administrator",
                "active": false,
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["profile"]["name"], "Ana María");
    assert_eq!(body["profile"]["phone"], "600123456");
    assert_eq!(body["profile"]["city"], "Zaragoza");
    assert_eq!(body["profile"]["role"], "user");
    assert_eq!(body["profile"]["active"], true);
}

#[tokio::test]
async fn test_own_profile_requires_name() {
    let app = create_test_app();
    let ana = app.member("ana@example.com", Role::User, None).await;

    let response = app
        .send(json_request(
            "PUT",
            "/dashboard/perfil",
            &ana.token,
            json!({ "name": "" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let profile = app.backend.get_profile(&ana.id).await.unwrap().unwrap();
    assert_eq!(profile.name, "Test");
}
