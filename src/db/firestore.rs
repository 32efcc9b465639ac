// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profiles, emergency UUID lookups, FCM tokens)
//! - Bikes (serial-number queries, registration)
//! - ONG profiles, campaigns and events
//! - Emergency access logs and global counters

use crate::db::{collections, memory::MemoryStore, GLOBAL_STATS_DOC};
use crate::error::AppError;
use crate::models::{Bike, Campaign, EmergencyAccessLog, Event, GlobalStats, OngProfile, User};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// Upper bound for list queries backing dashboards.
const MAX_LIST_RESULTS: u32 = 200;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<MemoryStore>),
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create an in-memory database (tests and `BICI_IN_MEMORY_DB` local runs).
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::new())),
        }
    }

    // ─── Generic Document Operations ─────────────────────────────

    /// Fetch a document by ID.
    pub async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collection)
                .obj()
                .one(id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => store
                .get(collection, id)
                .map(from_json)
                .transpose(),
        }
    }

    /// Create or replace a document.
    pub async fn set_doc<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collection)
                    .document_id(id)
                    .object(doc)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            Backend::Memory(store) => store.set(collection, id, to_json(doc)?),
        }
        Ok(())
    }

    /// Create a document with a generated ID and return the ID.
    pub async fn add_doc<T>(&self, collection: &str, doc: &T) -> Result<String, AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.set_doc(collection, &id, doc).await?;
        Ok(id)
    }

    /// Equality query on a single field, returning `(id, document)` pairs.
    pub async fn find_by_field<T>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        limit: u32,
    ) -> Result<Vec<(String, T)>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let field = field.to_string();
                let value = value.to_string();
                let docs = client
                    .fluent()
                    .select()
                    .from(collection)
                    .filter(move |q| q.for_all([q.field(field.as_str()).eq(value.clone())]))
                    .limit(limit)
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                docs.into_iter()
                    .map(|doc| {
                        let id = doc
                            .name
                            .rsplit('/')
                            .next()
                            .unwrap_or_default()
                            .to_string();
                        firestore::FirestoreDb::deserialize_doc_to::<T>(&doc)
                            .map(|obj| (id, obj))
                            .map_err(|e| AppError::Database(e.to_string()))
                    })
                    .collect()
            }
            Backend::Memory(store) => store
                .find_by_field(
                    collection,
                    field,
                    &serde_json::Value::from(value),
                    limit as usize,
                )
                .into_iter()
                .map(|(id, doc)| from_json(doc).map(|obj| (id, obj)))
                .collect(),
        }
    }

    /// Atomically add `by` to a numeric field (server-side transform).
    pub async fn increment_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        by: i64,
    ) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let mut transaction = client.begin_transaction().await.map_err(|e| {
                    AppError::Database(format!("Failed to begin transaction: {}", e))
                })?;

                client
                    .fluent()
                    .update()
                    .in_col(collection)
                    .document_id(id)
                    .transforms(|t| t.fields([t.field(field).increment(by)]))
                    .only_transform()
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!("Failed to add increment to transaction: {}", e))
                    })?;

                transaction.commit().await.map_err(|e| {
                    AppError::Database(format!("Increment commit failed: {}", e))
                })?;
            }
            Backend::Memory(store) => store.increment(collection, id, field, by),
        }
        Ok(())
    }

    /// Atomically append a string to an array field unless it is already present.
    pub async fn array_union_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        element: &str,
    ) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let mut transaction = client.begin_transaction().await.map_err(|e| {
                    AppError::Database(format!("Failed to begin transaction: {}", e))
                })?;

                client
                    .fluent()
                    .update()
                    .in_col(collection)
                    .document_id(id)
                    .transforms(|t| {
                        t.fields([t.field(field).append_missing_elements([element.to_string()])])
                    })
                    .only_transform()
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!("Failed to add array union to transaction: {}", e))
                    })?;

                transaction.commit().await.map_err(|e| {
                    AppError::Database(format!("Array union commit failed: {}", e))
                })?;
            }
            Backend::Memory(store) => {
                store.array_union(collection, id, field, serde_json::Value::from(element))
            }
        }
        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by Firebase uid.
    pub async fn get_user(&self, uid: &str) -> Result<Option<User>, AppError> {
        self.get_doc(collections::USERS, uid).await
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.set_doc(collections::USERS, &user.uid, user).await
    }

    /// Find users whose emergency UUID equals `emergency_uuid`.
    ///
    /// At most two are returned, which is enough to tell "exactly one"
    /// apart from an ambiguous match.
    pub async fn find_users_by_emergency_uuid(
        &self,
        emergency_uuid: &str,
    ) -> Result<Vec<User>, AppError> {
        let users: Vec<(String, User)> = self
            .find_by_field(collections::USERS, "emergencyUuid", emergency_uuid, 2)
            .await?;
        Ok(users.into_iter().map(|(_, user)| user).collect())
    }

    /// Register a Firebase Cloud Messaging token for a user.
    pub async fn add_fcm_token(&self, uid: &str, token: &str) -> Result<(), AppError> {
        self.array_union_field(collections::USERS, uid, "fcmTokens", token)
            .await
    }

    // ─── Bike Operations ─────────────────────────────────────────

    /// Find bikes registered under an exact serial number.
    pub async fn find_bikes_by_serial(
        &self,
        serial_number: &str,
        limit: u32,
    ) -> Result<Vec<(String, Bike)>, AppError> {
        self.find_by_field(collections::BIKES, "serialNumber", serial_number, limit)
            .await
    }

    /// Get a bike by document ID.
    pub async fn get_bike(&self, bike_id: &str) -> Result<Option<Bike>, AppError> {
        self.get_doc(collections::BIKES, bike_id).await
    }

    /// Register a new bike, returning its document ID.
    pub async fn add_bike(&self, bike: &Bike) -> Result<String, AppError> {
        self.add_doc(collections::BIKES, bike).await
    }

    /// Replace a bike document.
    pub async fn set_bike(&self, bike_id: &str, bike: &Bike) -> Result<(), AppError> {
        self.set_doc(collections::BIKES, bike_id, bike).await
    }

    /// List the bikes owned by a user.
    pub async fn list_bikes_for_owner(&self, uid: &str) -> Result<Vec<(String, Bike)>, AppError> {
        self.find_by_field(collections::BIKES, "ownerId", uid, MAX_LIST_RESULTS)
            .await
    }

    // ─── Counters ────────────────────────────────────────────────

    /// Count one serial-number search.
    pub async fn increment_search_count(&self) -> Result<(), AppError> {
        self.increment_field(collections::STATS, GLOBAL_STATS_DOC, "searchCount", 1)
            .await
    }

    pub async fn get_global_stats(&self) -> Result<GlobalStats, AppError> {
        Ok(self
            .get_doc(collections::STATS, GLOBAL_STATS_DOC)
            .await?
            .unwrap_or_default())
    }

    // ─── Emergency Access ────────────────────────────────────────

    /// Record a scan of an emergency QR code.
    pub async fn log_emergency_access(&self, log: &EmergencyAccessLog) -> Result<String, AppError> {
        self.add_doc(collections::EMERGENCY_ACCESS_LOGS, log).await
    }

    /// Scans of a user's emergency QR code, oldest first.
    pub async fn list_emergency_access_logs(
        &self,
        user_id: &str,
    ) -> Result<Vec<EmergencyAccessLog>, AppError> {
        let logs: Vec<(String, EmergencyAccessLog)> = self
            .find_by_field(
                collections::EMERGENCY_ACCESS_LOGS,
                "userId",
                user_id,
                MAX_LIST_RESULTS,
            )
            .await?;

        let mut logs: Vec<EmergencyAccessLog> = logs.into_iter().map(|(_, log)| log).collect();
        logs.sort_by(|a, b| a.accessed_at.cmp(&b.accessed_at));
        Ok(logs)
    }

    // ─── ONG Operations ──────────────────────────────────────────

    pub async fn get_ong_profile(&self, owner_id: &str) -> Result<Option<OngProfile>, AppError> {
        self.get_doc(collections::ONGS, owner_id).await
    }

    pub async fn set_ong_profile(&self, profile: &OngProfile) -> Result<(), AppError> {
        self.set_doc(collections::ONGS, &profile.owner_id, profile)
            .await
    }

    pub async fn list_campaigns_for_ong(&self, ong_id: &str) -> Result<Vec<Campaign>, AppError> {
        let campaigns: Vec<(String, Campaign)> = self
            .find_by_field(collections::CAMPAIGNS, "ongId", ong_id, MAX_LIST_RESULTS)
            .await?;
        Ok(campaigns.into_iter().map(|(_, c)| c).collect())
    }

    pub async fn add_campaign(&self, campaign: &Campaign) -> Result<String, AppError> {
        self.add_doc(collections::CAMPAIGNS, campaign).await
    }

    pub async fn list_events_for_ong(&self, ong_id: &str) -> Result<Vec<Event>, AppError> {
        let events: Vec<(String, Event)> = self
            .find_by_field(collections::EVENTS, "ongId", ong_id, MAX_LIST_RESULTS)
            .await?;
        Ok(events.into_iter().map(|(_, e)| e).collect())
    }

    pub async fn add_event(&self, event: &Event) -> Result<String, AppError> {
        self.add_doc(collections::EVENTS, event).await
    }
}

fn to_json<T: Serialize>(doc: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(doc).map_err(|e| AppError::Database(format!("Serialize failed: {}", e)))
}

fn from_json<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, AppError> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Database(format!("Deserialize failed: {}", e)))
}
