//! Database layer (Firestore, with an in-memory backend for tests and local runs).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const BIKES: &str = "bikes";
    pub const ONGS: &str = "ongs";
    pub const CAMPAIGNS: &str = "campaigns";
    pub const EVENTS: &str = "events";
    pub const EMERGENCY_ACCESS_LOGS: &str = "emergencyAccessLogs";
    /// Platform counters (single `global` document)
    pub const STATS: &str = "stats";
}

/// Document ID of the global counters document.
pub const GLOBAL_STATS_DOC: &str = "global";
