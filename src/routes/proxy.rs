// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Proxies to third-party services (geocoding and image hosting).

use crate::error::{AppError, Result};
use crate::services::image_proxy::validate_image_url;
use crate::services::nominatim::GeoResult;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

const MIN_QUERY_CHARS: usize = 3;
const MAX_QUERY_CHARS: usize = 200;
const IMAGE_CACHE_CONTROL: &str = "public, max-age=86400";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/geosearch", get(geosearch))
        .route("/api/image-proxy", get(image_proxy))
}

#[derive(Deserialize)]
struct GeoSearchQuery {
    q: Option<String>,
}

async fn geosearch(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GeoSearchQuery>,
) -> Result<Json<Vec<GeoResult>>> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    let chars = query.chars().count();

    if chars < MIN_QUERY_CHARS {
        return Err(AppError::BadRequest(format!(
            "Query must be at least {MIN_QUERY_CHARS} characters"
        )));
    }
    if chars > MAX_QUERY_CHARS {
        return Err(AppError::BadRequest(format!(
            "Query must be at most {MAX_QUERY_CHARS} characters"
        )));
    }

    let results = state.nominatim.search(query).await?;
    tracing::debug!(count = results.len(), "Geosearch completed");

    Ok(Json(results))
}

#[derive(Deserialize)]
struct ImageProxyQuery {
    url: Option<String>,
}

async fn image_proxy(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ImageProxyQuery>,
) -> Result<Response> {
    let raw = params
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing 'url' parameter".to_string()))?;

    let url = validate_image_url(&raw)?;
    let image = state.image_proxy.fetch(url).await?;

    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, IMAGE_CACHE_CONTROL.to_string()),
        ],
        image.bytes,
    )
        .into_response())
}
