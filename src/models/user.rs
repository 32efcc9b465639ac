//! User model for storage and API.

use crate::models::EmergencyProfile;
use serde::{Deserialize, Serialize};

/// Platform role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Ong,
    Admin,
}

/// User profile stored in Firestore (`users/{uid}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Firebase uid (also used as document ID)
    pub uid: String,
    /// Email address
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// Public UUID printed in the emergency QR sticker (opt-in)
    #[serde(default)]
    pub emergency_uuid: Option<String>,
    #[serde(default)]
    pub emergency_profile: Option<EmergencyProfile>,
    /// Firebase Cloud Messaging registration tokens
    #[serde(default)]
    pub fcm_tokens: Vec<String>,
    /// When the profile was created (ISO 8601)
    pub created_at: String,
}

impl User {
    /// Minimal profile for a user seen for the first time.
    pub fn new(uid: &str, email: Option<String>, created_at: String) -> Self {
        Self {
            uid: uid.to_string(),
            email,
            display_name: None,
            role: Role::User,
            emergency_uuid: None,
            emergency_profile: None,
            fcm_tokens: Vec::new(),
            created_at,
        }
    }

    pub fn has_role(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.role)
    }
}
