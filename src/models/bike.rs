//! Registered bicycle model.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BikeStatus {
    #[default]
    Active,
    Stolen,
    Recovered,
}

/// Theft report attached to a stolen bike.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TheftReport {
    /// When the theft was reported (ISO 8601)
    pub reported_at: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Bike stored in Firestore (`bikes/{auto-id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bike {
    pub serial_number: String,
    /// Owner's Firebase uid
    pub owner_id: String,
    pub brand: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub bike_type: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub status: BikeStatus,
    #[serde(default)]
    pub theft_report: Option<TheftReport>,
    pub created_at: String,
}

impl Bike {
    pub fn is_stolen(&self) -> bool {
        self.status == BikeStatus::Stolen
    }
}
