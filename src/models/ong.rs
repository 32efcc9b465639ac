//! ONG (NGO) tenant records: profile, advertising campaigns and events.

use serde::{Deserialize, Serialize};

/// ONG profile (`ongs/{owner uid}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OngProfile {
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Active,
    Finished,
}

/// Advertising campaign run by an ONG (`campaigns/{auto-id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub ong_id: String,
    pub title: String,
    #[serde(default)]
    pub status: CampaignStatus,
    #[serde(default)]
    pub impressions: u64,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub ends_at: Option<String>,
}

/// Community event organized by an ONG (`events/{auto-id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub ong_id: String,
    pub title: String,
    /// Event date (ISO 8601)
    pub date: String,
    #[serde(default)]
    pub location: Option<String>,
}
