//! Database layer (Firestore, plus an in-process store for tests).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::{Result, SyncError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Collection names as constants.
pub mod collections {
    pub const SCOUTS: &str = "scouts";
    pub const ADULTS: &str = "adults";
    pub const PARENTS: &str = "parents";
    pub const ADVANCEMENTS: &str = "advancements";
    pub const REQUIREMENTS: &str = "requirements";
    pub const EVENTS: &str = "events";
    pub const CALENDARS: &str = "calendar_subscriptions";
    /// Dashboard snapshots (keyed by org GUID and dashboard kind)
    pub const DASHBOARDS: &str = "dashboards";
    /// Append-only audit log
    pub const SYNC_LOG: &str = "sync_log";
}

/// Document persistence used by the sync orchestrator.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or update a document with `$set` semantics: every top-level
    /// field of `doc` is replaced, fields not present in `doc` are left alone.
    async fn upsert<T>(&self, collection: &str, id: &str, doc: &T) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Send + Sync;

    /// Insert a new document under a generated ID.
    async fn append<T>(&self, collection: &str, doc: &T) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Send + Sync;

    /// Fetch a document by ID.
    async fn get<T>(&self, collection: &str, id: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send;
}

/// Build a document ID from external identifiers.
///
/// Each component is percent-encoded so IDs never contain `/`.
pub fn document_id(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| urlencoding::encode(p).into_owned())
        .collect::<Vec<_>>()
        .join("_")
}

/// Top-level field names of a document, used as the `$set` field mask.
pub(crate) fn top_level_fields<T: Serialize>(doc: &T) -> Result<Vec<String>> {
    match serde_json::to_value(doc) {
        Ok(serde_json::Value::Object(map)) => Ok(map.keys().cloned().collect()),
        Ok(_) => Err(SyncError::Database(
            "Document must serialize to an object".to_string(),
        )),
        Err(e) => Err(SyncError::Database(format!(
            "Failed to serialize document: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_joins_and_escapes() {
        assert_eq!(document_id(&["123", "rank", "4"]), "123_rank_4");
        assert_eq!(document_id(&["a/b", "meritBadge"]), "a%2Fb_meritBadge");
    }

    #[test]
    fn test_top_level_fields() {
        let doc = serde_json::json!({"user_id": "1", "nested": {"x": 1}});
        let mut fields = top_level_fields(&doc).unwrap();
        fields.sort();
        assert_eq!(fields, vec!["nested".to_string(), "user_id".to_string()]);

        assert!(top_level_fields(&vec![1, 2, 3]).is_err());
    }
}
