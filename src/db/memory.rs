// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process [`DocumentStore`] backed by `dashmap`.
//!
//! Mirrors Firestore's `$set` upsert semantics closely enough for tests and
//! offline runs. Writes to a collection can be made to fail on demand.

use crate::db::DocumentStore;
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared in-memory document store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<DashMap<String, BTreeMap<String, Value>>>,
    failing: Arc<DashSet<String>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write to `collection` fail.
    pub fn fail_writes_to(&self, collection: &str) {
        self.failing.insert(collection.to_string());
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    /// Total documents across all collections.
    pub fn total_documents(&self) -> usize {
        self.collections.iter().map(|docs| docs.len()).sum()
    }

    /// All documents in a collection, ordered by ID.
    pub fn documents(&self, collection: &str) -> Vec<Value> {
        self.collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    fn check_writable(&self, collection: &str) -> Result<()> {
        if self.failing.contains(collection) {
            return Err(SyncError::Database(format!(
                "Writes to {} are disabled",
                collection
            )));
        }
        Ok(())
    }
}

fn to_object<T: Serialize>(doc: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(doc) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(SyncError::Database(
            "Document must serialize to an object".to_string(),
        )),
        Err(e) => Err(SyncError::Database(format!(
            "Failed to serialize document: {}",
            e
        ))),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn upsert<T>(&self, collection: &str, id: &str, doc: &T) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        self.check_writable(collection)?;
        let fields = to_object(doc)?;

        let mut docs = self.collections.entry(collection.to_string()).or_default();
        let existing = docs
            .entry(id.to_string())
            .or_insert_with(|| Value::Object(Map::new()));

        if let Value::Object(target) = existing {
            for (key, value) in fields {
                target.insert(key, value);
            }
        }
        Ok(())
    }

    async fn append<T>(&self, collection: &str, doc: &T) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        self.check_writable(collection)?;
        let fields = to_object(doc)?;

        let id = format!("{:020}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, Value::Object(fields));
        Ok(())
    }

    async fn get<T>(&self, collection: &str, id: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        let value = self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id).cloned());

        value
            .map(|v| serde_json::from_value(v).map_err(|e| SyncError::Database(e.to_string())))
            .transpose()
    }
}
