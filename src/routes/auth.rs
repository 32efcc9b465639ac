// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session routes: exchange a Firebase ID token for a session cookie, and logout.

use axum::{
    extract::State,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::models::User;
use crate::services::session::{create_session_token, removal_cookie, session_cookie};
use crate::services::AuthError;
use crate::time_utils::now_rfc3339;
use crate::AppState;

/// A session may only be minted from a sign-in this recent.
const RECENT_SIGN_IN_SECS: u64 = 5 * 60;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/session", post(create_session))
        .route("/api/auth/logout", get(logout))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 4096))]
    id_token: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub status: String,
}

/// Exchange a Firebase ID token for a session cookie.
async fn create_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ApiJson(body): ApiJson<SessionRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    body.validate()?;

    let verified = state
        .token_verifier
        .verify_id_token(&body.id_token)
        .await
        .map_err(|err| match err {
            AuthError::Rejected(reason) => {
                tracing::warn!(reason = %reason, "Rejected ID token");
                AppError::InvalidToken
            }
            AuthError::Transient(reason) => {
                AppError::Internal(anyhow::anyhow!("ID token verification failed: {}", reason))
            }
        })?;

    let now = chrono::Utc::now().timestamp() as u64;
    if now.saturating_sub(verified.auth_time) > RECENT_SIGN_IN_SECS {
        tracing::warn!(uid = %verified.uid, "Refusing session for stale sign-in");
        return Err(AppError::Unauthorized);
    }

    if state.db.get_user(&verified.uid).await?.is_none() {
        tracing::info!(uid = %verified.uid, "Creating profile for first sign-in");
        let user = User::new(&verified.uid, verified.email.clone(), now_rfc3339());
        state.db.upsert_user(&user).await?;
    }

    let token = create_session_token(
        &verified.uid,
        &state.config.session_signing_key,
        state.config.session_max_age_days,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Session token creation failed: {}", e)))?;

    tracing::info!(uid = %verified.uid, "Session created");

    let cookie = session_cookie(
        token,
        state.config.session_max_age_days,
        state.config.secure_cookies(),
    );

    Ok((
        jar.add(cookie),
        Json(SessionResponse {
            status: "success".to_string(),
        }),
    ))
}

/// Clear the session cookie and go back to the home page.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    (
        jar.add(removal_cookie(state.config.secure_cookies())),
        Redirect::to("/"),
    )
}
