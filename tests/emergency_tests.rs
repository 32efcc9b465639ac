// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Emergency QR profile disclosure and access logging.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use bici_registro::models::{EmergencyContact, EmergencyProfile, Role, User};
use bici_registro::AppState;
use serde_json::json;
use tower::ServiceExt;

mod common;

const STICKER_UUID: &str = "5f0c8a52-3b7e-4f0e-9a61-2d9f4c1e7b33";

fn profile() -> EmergencyProfile {
    EmergencyProfile {
        full_name: "Ana López".to_string(),
        blood_type: Some("O+".to_string()),
        allergies: Some("Penicilina".to_string()),
        medical_conditions: None,
        medications: None,
        emergency_contacts: vec![EmergencyContact {
            name: "Luis López".to_string(),
            phone: "+52 55 1234 5678".to_string(),
            relationship: Some("hermano".to_string()),
        }],
    }
}

async fn seed_user(state: &AppState, uid: &str, uuid: &str, with_profile: bool) {
    let mut user = User::new(uid, None, "2026-01-01T00:00:00Z".to_string());
    user.emergency_uuid = Some(uuid.to_string());
    if with_profile {
        user.emergency_profile = Some(profile());
    }
    state.db.upsert_user(&user).await.unwrap();
}

fn access_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/emergency/access")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::USER_AGENT, "Mozilla/5.0 (Android)")
        .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_known_uuid_discloses_profile_and_logs_access() {
    let (app, state) = common::create_test_app();
    seed_user(&state, "uid-ana", STICKER_UUID, true).await;

    let response = app
        .oneshot(access_request(
            json!({ "uuid": STICKER_UUID, "lat": 19.4326, "lng": -99.1332 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["fullName"], "Ana López");
    assert_eq!(body["data"]["bloodType"], "O+");
    assert_eq!(body["data"]["emergencyContacts"][0]["phone"], "+52 55 1234 5678");

    let logs = state.db.list_emergency_access_logs("uid-ana").await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].emergency_uuid, STICKER_UUID);
    assert_eq!(logs[0].lat, Some(19.4326));
    assert_eq!(logs[0].lng, Some(-99.1332));
    assert_eq!(logs[0].ip.as_deref(), Some("203.0.113.9"));
    assert_eq!(logs[0].user_agent.as_deref(), Some("Mozilla/5.0 (Android)"));
}

#[tokio::test]
async fn test_access_without_location_still_logged() {
    let (app, state) = common::create_test_app();
    seed_user(&state, "uid-ana", STICKER_UUID, true).await;

    let response = app
        .oneshot(access_request(json!({ "uuid": STICKER_UUID })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let logs = state.db.list_emergency_access_logs("uid-ana").await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].lat, None);
}

#[tokio::test]
async fn test_unknown_uuid_is_not_found() {
    let (app, state) = common::create_test_app();
    seed_user(&state, "uid-ana", STICKER_UUID, true).await;

    let response = app
        .oneshot(access_request(
            json!({ "uuid": "00000000-0000-4000-8000-000000000000" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(state
        .db
        .list_emergency_access_logs("uid-ana")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_shared_uuid_is_not_disclosed() {
    let (app, state) = common::create_test_app();
    seed_user(&state, "uid-a", STICKER_UUID, true).await;
    seed_user(&state, "uid-b", STICKER_UUID, true).await;

    let response = app
        .oneshot(access_request(json!({ "uuid": STICKER_UUID })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_uuid_without_profile_is_not_found() {
    let (app, state) = common::create_test_app();
    seed_user(&state, "uid-empty", STICKER_UUID, false).await;

    let response = app
        .oneshot(access_request(json!({ "uuid": STICKER_UUID })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_requests_are_rejected() {
    let (app, _) = common::create_test_app();

    for body in [
        json!({ "uuid": "not-a-uuid" }),
        json!({}),
        json!({ "uuid": STICKER_UUID, "lat": 91.0 }),
        json!({ "uuid": STICKER_UUID, "lng": -181.0 }),
        json!({ "uuid": STICKER_UUID, "lat": "x" }),
        json!({ "uuid": 42 }),
    ] {
        let response = app.clone().oneshot(access_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_owner_sees_access_logs() {
    let (app, state) = common::create_test_app();
    seed_user(&state, "uid-ana", STICKER_UUID, true).await;

    let response = app
        .clone()
        .oneshot(access_request(json!({ "uuid": STICKER_UUID })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = common::session_cookie_header(&state, "uid-ana");
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/emergency/logs")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let logs = common::body_json(response).await;
    assert_eq!(logs.as_array().unwrap().len(), 1);
    assert_eq!(logs[0]["userId"], "uid-ana");

    // Someone else's session sees nothing.
    let other = common::login_as(&state, "uid-other", Role::User).await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/emergency/logs")
                .header(header::COOKIE, &other)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(common::body_json(response).await, json!([]));
}
