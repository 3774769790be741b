mod common;

use axum::http::StatusCode;
use chrono::{Duration, Local};
use common::TestApp;
use registrar_core::Role;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_add_slot_is_admin_only(pool: PgPool) {
    let app = TestApp::new(pool);
    let admin = app.user(Role::Admin).await;
    let teacher = app.user(Role::Teacher).await;
    let tomorrow = Local::now().date_naive() + Duration::days(1);
    let slot = json!({ "date": tomorrow, "start_time": "09:30" });

    let (status, _) = app
        .request("POST", "/api/screening-slots", Some(&teacher.token), Some(slot.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request("POST", "/api/screening-slots", Some(&admin.token), Some(slot))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["start_time"], "09:30");
    assert_eq!(body["max_capacity"], 50);
    assert_eq!(body["bookings"], 0);

    let (status, body) = app
        .request("GET", "/api/screening-slots", Some(&admin.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_invalid_start_time_is_rejected(pool: PgPool) {
    let app = TestApp::new(pool);
    let admin = app.user(Role::Admin).await;
    let tomorrow = Local::now().date_naive() + Duration::days(1);

    let (status, _) = app
        .request(
            "POST",
            "/api/screening-slots",
            Some(&admin.token),
            Some(json!({ "date": tomorrow, "start_time": "25:00" })),
        )
        .await;
    assert!(status.is_client_error());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_reserve_fills_earliest_slot(pool: PgPool) {
    let app = TestApp::new(pool);
    let admin = app.user(Role::Admin).await;
    let student = app.user(Role::Student).await;
    let today = Local::now().date_naive();

    let (status, body) = app
        .request("POST", "/api/screening-slots/reserve", Some(&student.token), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    for (days, capacity) in [(-1, 5), (2, 5), (1, 1)] {
        let (status, _) = app
            .request(
                "POST",
                "/api/screening-slots",
                Some(&admin.token),
                Some(json!({
                    "date": today + Duration::days(days),
                    "start_time": "10:00",
                    "max_capacity": capacity,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, next) = app
        .request("GET", "/api/screening-slots/next", Some(&student.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(next["date"], json!(today + Duration::days(1)));

    let (status, first) = app
        .request("POST", "/api/screening-slots/reserve", Some(&student.token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["date"], json!(today + Duration::days(1)));

    // The one-seat slot is full now.
    let other = app.user(Role::Student).await;
    let (status, second) = app
        .request("POST", "/api/screening-slots/reserve", Some(&other.token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["date"], json!(today + Duration::days(2)));

    // Asking again hands back the seat already held.
    let (status, again) = app
        .request("POST", "/api/screening-slots/reserve", Some(&student.token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(again["slot_id"], first["slot_id"]);
}
