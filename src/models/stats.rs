//! Platform-wide counters.

use serde::{Deserialize, Serialize};

/// Global counters (`stats/global`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    /// Number of serial-number searches (fraud-prevention signal)
    #[serde(default)]
    pub search_count: u64,
}
