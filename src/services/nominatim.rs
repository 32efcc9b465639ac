// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Nominatim (OpenStreetMap) geocoding client.
//!
//! Used to turn a free-text place into coordinates when reporting a theft
//! or an event location.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const USER_AGENT: &str = concat!("BiciRegistro/", env!("CARGO_PKG_VERSION"));
const RESULT_LIMIT: u32 = 5;
const HTTP_TIMEOUT: Duration = Duration::from_secs(8);

/// Raw Nominatim search hit (only the fields we use).
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: String,
    lat: String,
    lon: String,
}

/// Geocoding result returned to the client.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeoResult {
    pub display_name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Nominatim API client.
#[derive(Clone)]
pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Search for places matching `query`.
    pub async fn search(&self, query: &str) -> Result<Vec<GeoResult>, AppError> {
        let url = format!(
            "{}/search?format=json&addressdetails=0&limit={}&q={}",
            self.base_url,
            RESULT_LIMIT,
            urlencoding::encode(query)
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Nominatim request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Nominatim returned status {}",
                response.status()
            )));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid Nominatim response: {}", e)))?;

        Ok(to_results(places))
    }
}

/// Convert raw hits, dropping any with unparseable coordinates.
fn to_results(places: Vec<NominatimPlace>) -> Vec<GeoResult> {
    places
        .into_iter()
        .filter_map(|place| {
            Some(GeoResult {
                lat: place.lat.parse().ok()?,
                lon: place.lon.parse().ok()?,
                display_name: place.display_name,
            })
        })
        .collect()
}
