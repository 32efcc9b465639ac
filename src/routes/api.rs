// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users: profile, push tokens, ONG and admin views.

use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::{require_role, CurrentUser};
use crate::models::{Campaign, CampaignStatus, Event, GlobalStats, OngProfile, Role};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// API routes (require a session).
/// The session middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/notifications/token", post(register_push_token))
        .route("/api/ong/dashboard", get(ong_dashboard))
        .route("/api/admin/stats", get(admin_stats))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub role: Role,
    pub emergency_uuid: Option<String>,
    pub has_emergency_profile: bool,
}

async fn get_me(Extension(current): Extension<CurrentUser>) -> Json<UserResponse> {
    let user = current.user;
    Json(UserResponse {
        has_emergency_profile: user.emergency_profile.is_some(),
        uid: user.uid,
        email: user.email,
        display_name: user.display_name,
        role: user.role,
        emergency_uuid: user.emergency_uuid,
    })
}

// ─── Push Notifications ──────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct PushTokenRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 4096))]
    token: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Store a Firebase Cloud Messaging registration token for the current user.
async fn register_push_token(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(body): ApiJson<PushTokenRequest>,
) -> Result<Json<SuccessResponse>> {
    body.validate()?;

    state
        .db
        .add_fcm_token(&current.user.uid, body.token.trim())
        .await?;
    tracing::info!(uid = %current.user.uid, "Push token registered");

    Ok(Json(SuccessResponse { success: true }))
}

// ─── ONG Dashboard ───────────────────────────────────────────

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CampaignTotals {
    pub campaigns: usize,
    pub active_campaigns: usize,
    pub impressions: u64,
    pub clicks: u64,
}

impl CampaignTotals {
    fn from_campaigns(campaigns: &[Campaign]) -> Self {
        Self {
            campaigns: campaigns.len(),
            active_campaigns: campaigns
                .iter()
                .filter(|c| c.status == CampaignStatus::Active)
                .count(),
            impressions: campaigns.iter().map(|c| c.impressions).sum(),
            clicks: campaigns.iter().map(|c| c.clicks).sum(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OngDashboardResponse {
    pub profile: OngProfile,
    pub campaigns: Vec<Campaign>,
    pub events: Vec<Event>,
    pub totals: CampaignTotals,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    ong_id: Option<String>,
}

/// Pick whose dashboard to show: ONGs see their own, admins name one.
fn dashboard_owner(current: &CurrentUser, requested: Option<&str>) -> Result<String> {
    let own = current.user.uid.as_str();
    match requested.map(str::trim).filter(|id| !id.is_empty()) {
        None if current.user.role == Role::Admin => Err(AppError::BadRequest(
            "Admins must pass 'ongId'".to_string(),
        )),
        None => Ok(own.to_string()),
        Some(id) if id == own || current.user.role == Role::Admin => Ok(id.to_string()),
        Some(_) => Err(AppError::Forbidden(
            "Cannot view another ONG's dashboard".to_string(),
        )),
    }
}

/// ONG dashboard: profile, campaigns and events fetched in parallel.
async fn ong_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<OngDashboardResponse>> {
    require_role(&current, &[Role::Ong, Role::Admin])?;
    let ong_id = dashboard_owner(&current, query.ong_id.as_deref())?;
    let ong_id = ong_id.as_str();

    let (profile, campaigns, mut events) = tokio::try_join!(
        state.db.get_ong_profile(ong_id),
        state.db.list_campaigns_for_ong(ong_id),
        state.db.list_events_for_ong(ong_id),
    )?;

    let profile =
        profile.ok_or_else(|| AppError::NotFound(format!("ONG profile {} not found", ong_id)))?;

    events.sort_by(|a, b| a.date.cmp(&b.date));
    let totals = CampaignTotals::from_campaigns(&campaigns);

    tracing::debug!(
        uid = %current.user.uid,
        ong_id = %ong_id,
        campaigns = totals.campaigns,
        events = events.len(),
        "ONG dashboard loaded"
    );

    Ok(Json(OngDashboardResponse {
        profile,
        campaigns,
        events,
        totals,
    }))
}

// ─── Admin ───────────────────────────────────────────────────

async fn admin_stats(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<GlobalStats>> {
    require_role(&current, &[Role::Admin])?;
    Ok(Json(state.db.get_global_stats().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign(status: CampaignStatus, impressions: u64, clicks: u64) -> Campaign {
        Campaign {
            ong_id: "ong-1".to_string(),
            title: "Rodada segura".to_string(),
            status,
            impressions,
            clicks,
            starts_at: None,
            ends_at: None,
        }
    }

    fn caller(uid: &str, role: Role) -> CurrentUser {
        let mut user = crate::models::User::new(uid, None, "2026-01-01T00:00:00Z".to_string());
        user.role = role;
        CurrentUser { user }
    }

    #[test]
    fn test_dashboard_owner() {
        let ong = caller("ong-1", Role::Ong);
        assert_eq!(dashboard_owner(&ong, None).unwrap(), "ong-1");
        assert_eq!(dashboard_owner(&ong, Some("ong-1")).unwrap(), "ong-1");
        assert!(matches!(
            dashboard_owner(&ong, Some("ong-2")),
            Err(AppError::Forbidden(_))
        ));

        let admin = caller("admin-1", Role::Admin);
        assert_eq!(dashboard_owner(&admin, Some(" ong-2 ")).unwrap(), "ong-2");
        assert!(matches!(
            dashboard_owner(&admin, None),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_campaign_totals() {
        let campaigns = vec![
            campaign(CampaignStatus::Active, 100, 7),
            campaign(CampaignStatus::Finished, 50, 3),
            campaign(CampaignStatus::Draft, 0, 0),
        ];

        assert_eq!(
            CampaignTotals::from_campaigns(&campaigns),
            CampaignTotals {
                campaigns: 3,
                active_campaigns: 1,
                impressions: 150,
                clicks: 10,
            }
        );
    }
}
