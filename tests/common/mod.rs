// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::Response;
use bici_registro::config::Config;
use bici_registro::db::FirestoreDb;
use bici_registro::models::{Role, User};
use bici_registro::routes::create_router;
use bici_registro::services::session::create_session_token;
use bici_registro::services::{FirebaseTokenVerifier, ImageProxy, NominatimClient};
use bici_registro::AppState;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde::Serialize;
use std::sync::Arc;

pub const TEST_KID: &str = "test-kid";
const TEST_PRIVATE_KEY: &[u8] = include_bytes!("../fixtures/firebase_test_key.pem");
const TEST_PUBLIC_KEY: &[u8] = include_bytes!("../fixtures/firebase_test_key.pub.pem");

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection against the emulator.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("bici-registro-test")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by the in-memory store and a static-key verifier.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let decoding_key =
        DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY).expect("test public key should parse");
    let token_verifier = Arc::new(
        FirebaseTokenVerifier::new_with_static_key(
            &config.firebase_project_id,
            TEST_KID,
            decoding_key,
        )
        .expect("static verifier"),
    );

    let state = Arc::new(AppState {
        nominatim: NominatimClient::new(&config.nominatim_url).expect("nominatim client"),
        image_proxy: ImageProxy::new().expect("image proxy"),
        db: FirestoreDb::new_in_memory(),
        token_verifier,
        config,
    });

    (create_router(state.clone()), state)
}

#[derive(Serialize)]
struct IdTokenClaims<'a> {
    iss: String,
    aud: &'a str,
    sub: &'a str,
    iat: i64,
    exp: i64,
    auth_time: i64,
    email: &'a str,
    email_verified: bool,
}

/// Create a Firebase-style ID token signed with the test key.
///
/// `signed_in_secs_ago` sets how long ago the user authenticated.
#[allow(dead_code)]
pub fn create_test_id_token(config: &Config, uid: &str, signed_in_secs_ago: i64) -> String {
    create_id_token_for_project(&config.firebase_project_id, uid, signed_in_secs_ago)
}

#[allow(dead_code)]
pub fn create_id_token_for_project(project_id: &str, uid: &str, signed_in_secs_ago: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = IdTokenClaims {
        iss: format!("https://securetoken.google.com/{project_id}"),
        aud: project_id,
        sub: uid,
        iat: now - 5,
        exp: now + 3600,
        auth_time: now - signed_in_secs_ago,
        email: "ciclista@example.com",
        email_verified: true,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(TEST_KID.to_string());

    encode(
        &header,
        &claims,
        &EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY).expect("test private key should parse"),
    )
    .expect("Failed to sign ID token")
}

/// Store a user and return a `Cookie` header value carrying a valid session.
#[allow(dead_code)]
pub async fn login_as(state: &AppState, uid: &str, role: Role) -> String {
    let mut user = User::new(uid, Some(format!("{uid}@example.com")), "2026-01-01T00:00:00Z".to_string());
    user.role = role;
    state.db.upsert_user(&user).await.expect("seed user");
    session_cookie_header(state, uid)
}

/// Session cookie header for `uid` without touching the database.
#[allow(dead_code)]
pub fn session_cookie_header(state: &AppState, uid: &str) -> String {
    let token = create_session_token(
        uid,
        &state.config.session_signing_key,
        state.config.session_max_age_days,
    )
    .expect("session token");
    format!("__session={token}")
}

/// Collect all `Set-Cookie` headers of a response.
#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}
