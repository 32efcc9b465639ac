// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bike routes: serial-number checks, public lookups and owner registration.

use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::CurrentUser;
use crate::models::{Bike, BikeStatus, TheftReport};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

const MAX_SERIAL_LEN: usize = 64;

/// Public bike routes (no session).
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/check-serial", post(check_serial))
        .route("/api/bike-public-info", get(bike_public_info))
}

/// Owner routes (session required; layer applied in routes/mod.rs).
pub fn owner_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/bikes", get(list_my_bikes).post(register_bike))
        .route("/api/bikes/{bike_id}/theft-report", post(report_theft))
}

/// Trim a user-supplied serial and reject blank or oversized values.
fn normalize_serial(raw: Option<&str>) -> Result<String> {
    let serial = raw.map(str::trim).unwrap_or_default();
    if serial.is_empty() {
        return Err(AppError::BadRequest("Serial number is required".to_string()));
    }
    if serial.chars().count() > MAX_SERIAL_LEN {
        return Err(AppError::BadRequest(format!(
            "Serial number must be at most {MAX_SERIAL_LEN} characters"
        )));
    }
    Ok(serial.to_string())
}

/// Trim an optional free-text field; blank becomes `None`.
fn optional_text(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// ─── Serial Check ────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckSerialRequest {
    #[serde(default)]
    serial_number: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSerialResponse {
    pub is_unique: bool,
}

/// Check whether a serial number is already registered.
///
/// Every valid request also bumps the global search counter. The counter is
/// best-effort: a failed increment is logged but does not fail the check.
async fn check_serial(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CheckSerialRequest>,
) -> Result<Json<CheckSerialResponse>> {
    let serial = normalize_serial(body.serial_number.as_deref())?;

    let (existing, counted) = tokio::join!(
        state.db.find_bikes_by_serial(&serial, 1),
        state.db.increment_search_count(),
    );

    if let Err(e) = counted {
        tracing::warn!(error = %e, "Failed to increment search counter");
    }

    let is_unique = existing?.is_empty();
    tracing::debug!(is_unique, "Serial number checked");

    Ok(Json(CheckSerialResponse { is_unique }))
}

// ─── Public Bike Info ────────────────────────────────────────

#[derive(Deserialize)]
struct BikeInfoQuery {
    serial: Option<String>,
}

/// Publicly visible bike data. Owner identity is never included.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicBikeInfo {
    pub serial_number: String,
    pub brand: String,
    pub model: Option<String>,
    pub color: Option<String>,
    pub bike_type: Option<String>,
    pub year: Option<u16>,
    pub status: BikeStatus,
    pub is_stolen: bool,
    pub theft_report: Option<TheftReport>,
}

impl From<Bike> for PublicBikeInfo {
    fn from(bike: Bike) -> Self {
        Self {
            is_stolen: bike.is_stolen(),
            serial_number: bike.serial_number,
            brand: bike.brand,
            model: bike.model,
            color: bike.color,
            bike_type: bike.bike_type,
            year: bike.year,
            status: bike.status,
            theft_report: bike.theft_report,
        }
    }
}

async fn bike_public_info(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BikeInfoQuery>,
) -> Result<Json<PublicBikeInfo>> {
    let serial = normalize_serial(params.serial.as_deref())?;

    let (_, bike) = state
        .db
        .find_bikes_by_serial(&serial, 1)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("No bike registered with that serial".to_string()))?;

    Ok(Json(bike.into()))
}

// ─── Owner Operations ────────────────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBikeRequest {
    #[serde(default)]
    serial_number: Option<String>,
    #[validate(length(min = 1, max = 60))]
    brand: String,
    #[validate(length(max = 60))]
    model: Option<String>,
    #[validate(length(max = 40))]
    color: Option<String>,
    #[validate(length(max = 40))]
    bike_type: Option<String>,
    #[validate(range(min = 1900, max = 2100))]
    year: Option<u16>,
}

#[derive(Serialize)]
pub struct RegisteredBike {
    pub id: String,
    #[serde(flatten)]
    pub bike: Bike,
}

/// Register a bike for the current user. Serial numbers must be unique.
async fn register_bike(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(body): ApiJson<RegisterBikeRequest>,
) -> Result<(StatusCode, Json<RegisteredBike>)> {
    body.validate()?;
    let serial = normalize_serial(body.serial_number.as_deref())?;
    let brand = body.brand.trim();
    if brand.is_empty() {
        return Err(AppError::BadRequest("Brand is required".to_string()));
    }

    if !state.db.find_bikes_by_serial(&serial, 1).await?.is_empty() {
        return Err(AppError::Conflict(
            "A bike with that serial number is already registered".to_string(),
        ));
    }

    let bike = Bike {
        serial_number: serial,
        owner_id: current.user.uid.clone(),
        brand: brand.to_string(),
        model: optional_text(body.model),
        color: optional_text(body.color),
        bike_type: optional_text(body.bike_type),
        year: body.year,
        status: BikeStatus::Active,
        theft_report: None,
        created_at: now_rfc3339(),
    };

    let id = state.db.add_bike(&bike).await?;
    tracing::info!(uid = %current.user.uid, bike_id = %id, "Bike registered");

    Ok((StatusCode::CREATED, Json(RegisteredBike { id, bike })))
}

async fn list_my_bikes(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<RegisteredBike>>> {
    let bikes = state.db.list_bikes_for_owner(&current.user.uid).await?;
    Ok(Json(
        bikes
            .into_iter()
            .map(|(id, bike)| RegisteredBike { id, bike })
            .collect(),
    ))
}

#[derive(Deserialize, Validate)]
pub struct TheftReportRequest {
    #[validate(length(max = 200))]
    location: Option<String>,
    #[validate(length(max = 2000))]
    description: Option<String>,
}

/// Mark one of the current user's bikes as stolen.
async fn report_theft(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(bike_id): Path<String>,
    ApiJson(body): ApiJson<TheftReportRequest>,
) -> Result<Json<RegisteredBike>> {
    body.validate()?;

    let mut bike = state
        .db
        .get_bike(&bike_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bike {} not found", bike_id)))?;

    if bike.owner_id != current.user.uid {
        return Err(AppError::Forbidden("Not the owner of this bike".to_string()));
    }

    bike.status = BikeStatus::Stolen;
    bike.theft_report = Some(TheftReport {
        reported_at: now_rfc3339(),
        location: body.location,
        description: body.description,
    });
    state.db.set_bike(&bike_id, &bike).await?;

    tracing::info!(uid = %current.user.uid, bike_id = %bike_id, "Theft reported");

    Ok(Json(RegisteredBike { id: bike_id, bike }))
}
