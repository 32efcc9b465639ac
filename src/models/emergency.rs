//! Emergency medical profile and access log.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub relationship: Option<String>,
}

/// Medical information the user chose to disclose through the QR sticker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyProfile {
    pub full_name: String,
    #[serde(default)]
    pub blood_type: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub medical_conditions: Option<String>,
    #[serde(default)]
    pub medications: Option<String>,
    #[serde(default)]
    pub emergency_contacts: Vec<EmergencyContact>,
}

/// One scan of an emergency QR code (`emergencyAccessLogs/{auto-id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyAccessLog {
    pub user_id: String,
    pub emergency_uuid: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub accessed_at: String,
}
