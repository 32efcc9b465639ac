// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory document store with Firestore-like semantics.
//!
//! Documents are kept as JSON values keyed by `(collection, id)`, so the same
//! serde models round-trip through it exactly as they would through Firestore.

use dashmap::DashMap;
use serde_json::{Map, Value};

#[derive(Default)]
pub struct MemoryStore {
    docs: DashMap<(String, String), Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<Value> {
        self.docs
            .get(&(collection.to_string(), id.to_string()))
            .map(|doc| doc.value().clone())
    }

    /// Replace a document. Fields not present in `value` are dropped, like a
    /// Firestore `set` without merge.
    pub fn set(&self, collection: &str, id: &str, value: Value) {
        self.docs
            .insert((collection.to_string(), id.to_string()), value);
    }

    /// Equality query on a top-level field, ordered by document ID.
    pub fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        limit: usize,
    ) -> Vec<(String, Value)> {
        let mut matches: Vec<(String, Value)> = self
            .docs
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .filter(|entry| entry.value().get(field) == Some(value))
            .map(|entry| (entry.key().1.clone(), entry.value().clone()))
            .collect();

        matches.sort_by(|a, b| a.0.cmp(&b.0));
        matches.truncate(limit);
        matches
    }

    /// Atomically add `by` to a numeric field, creating the document and
    /// field as needed.
    pub fn increment(&self, collection: &str, id: &str, field: &str, by: i64) {
        let mut doc = self
            .docs
            .entry((collection.to_string(), id.to_string()))
            .or_insert_with(|| Value::Object(Map::new()));

        if let Value::Object(fields) = doc.value_mut() {
            let current = fields.get(field).and_then(Value::as_i64).unwrap_or(0);
            fields.insert(field.to_string(), Value::from(current + by));
        }
    }

    /// Atomically append `element` to an array field unless already present.
    pub fn array_union(&self, collection: &str, id: &str, field: &str, element: Value) {
        let mut doc = self
            .docs
            .entry((collection.to_string(), id.to_string()))
            .or_insert_with(|| Value::Object(Map::new()));

        if let Value::Object(fields) = doc.value_mut() {
            let array = fields
                .entry(field.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if !array.is_array() {
                *array = Value::Array(Vec::new());
            }
            if let Value::Array(items) = array {
                if !items.contains(&element) {
                    items.push(element);
                }
            }
        }
    }
}
