mod common;

use axum::http::StatusCode;
use common::TestApp;
use registrar_core::Role;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_missing_token_is_unauthorized(pool: PgPool) {
    let app = TestApp::new(pool);

    let (status, body) = app.request("GET", "/api/users/me", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing authorization header");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_invalid_token_is_unauthorized(pool: PgPool) {
    let app = TestApp::new(pool);

    let (status, _) = app
        .request("GET", "/api/users/me", Some("not-a-token"), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_first_request_creates_user_with_preset_role(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let (token, email) = app.token(Role::Teacher);

    let (status, first) = app.request("GET", "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["email"], email);
    assert_eq!(first["role"], "teacher");

    let (_, second) = app.request("GET", "/api/users/me", Some(&token), None).await;
    assert_eq!(first["id"], second["id"]);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_users_is_admin_only(pool: PgPool) {
    let app = TestApp::new(pool);
    let admin = app.user(Role::Admin).await;
    let student = app.user(Role::Student).await;

    let (status, _) = app
        .request("GET", "/api/users", Some(&student.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request("GET", "/api/users?role=student", Some(&admin.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["email"], student.email);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_changes_role(pool: PgPool) {
    let app = TestApp::new(pool);
    let admin = app.user(Role::Admin).await;
    let student = app.user(Role::Student).await;

    let (status, body) = app
        .request(
            "PATCH",
            &format!("/api/users/{}/role", student.id),
            Some(&admin.token),
            Some(json!({ "role": "teacher" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "teacher");

    let (_, me) = app
        .request("GET", "/api/users/me", Some(&student.token), None)
        .await;
    assert_eq!(me["role"], "teacher");
}
