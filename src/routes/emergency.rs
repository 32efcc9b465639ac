// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Emergency QR profile routes.
//!
//! Scanning a sticker posts its UUID here. When the UUID identifies exactly
//! one user with an emergency profile, the profile is disclosed and the scan
//! is logged with whatever location and client metadata is available.

use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::CurrentUser;
use crate::models::{EmergencyAccessLog, EmergencyProfile};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

const MAX_USER_AGENT_LEN: usize = 512;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/emergency/access", post(emergency_access))
}

/// Session-protected routes (layer applied in routes/mod.rs).
pub fn owner_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/emergency/logs", get(list_access_logs))
}

#[derive(Deserialize, Validate)]
pub struct EmergencyAccessRequest {
    #[serde(default)]
    uuid: String,
    #[validate(range(min = -90.0, max = 90.0))]
    lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    lng: Option<f64>,
}

#[derive(Serialize)]
pub struct EmergencyAccessResponse {
    pub success: bool,
    pub data: EmergencyProfile,
}

async fn emergency_access(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<EmergencyAccessRequest>,
) -> Result<Json<EmergencyAccessResponse>> {
    body.validate()?;

    let emergency_uuid = body.uuid.trim();
    if uuid::Uuid::parse_str(emergency_uuid).is_err() {
        return Err(AppError::BadRequest("Invalid emergency UUID".to_string()));
    }

    let not_found = || AppError::NotFound("Emergency profile not found".to_string());

    let users = state.db.find_users_by_emergency_uuid(emergency_uuid).await?;
    let user = match users.as_slice() {
        [user] => user,
        [] => return Err(not_found()),
        _ => {
            tracing::error!(
                emergency_uuid = %emergency_uuid,
                "Emergency UUID shared by multiple users; refusing disclosure"
            );
            return Err(not_found());
        }
    };

    let profile = user.emergency_profile.clone().ok_or_else(not_found)?;

    let log = EmergencyAccessLog {
        user_id: user.uid.clone(),
        emergency_uuid: emergency_uuid.to_string(),
        lat: body.lat,
        lng: body.lng,
        ip: client_ip(&headers),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|ua| ua.chars().take(MAX_USER_AGENT_LEN).collect()),
        accessed_at: now_rfc3339(),
    };

    // Disclosure must not depend on the audit write.
    if let Err(e) = state.db.log_emergency_access(&log).await {
        tracing::warn!(error = %e, uid = %user.uid, "Failed to log emergency access");
    }

    tracing::info!(
        uid = %user.uid,
        has_location = log.lat.is_some() && log.lng.is_some(),
        "Emergency profile accessed"
    );

    Ok(Json(EmergencyAccessResponse {
        success: true,
        data: profile,
    }))
}

/// Client address: first `X-Forwarded-For` hop, then `X-Real-IP`.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
        })
        .map(str::to_string)
}

/// Scans of the current user's emergency QR code.
async fn list_access_logs(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<EmergencyAccessLog>>> {
    let logs = state
        .db
        .list_emergency_access_logs(&current.user.uid)
        .await?;
    Ok(Json(logs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" "));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(client_ip(&headers).as_deref(), Some("198.51.100.4"));

        assert_eq!(client_ip(&HeaderMap::new()), None);
    }
}
