// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper implementing [`DocumentStore`].

use crate::db::{top_level_fields, DocumentStore};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| SyncError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self> {
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
            SyncError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client; every operation returns an error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb> {
        self.client
            .as_ref()
            .ok_or_else(|| SyncError::Database("Database not connected (offline mode)".to_string()))
    }
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    async fn upsert<T>(&self, collection: &str, id: &str, doc: &T) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        // Restricting the update mask to the document's own fields gives `$set`
        // semantics: other fields on an existing document survive.
        let fields = top_level_fields(doc)?;

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(fields)
            .in_col(collection)
            .document_id(id)
            .object(doc)
            .execute()
            .await
            .map_err(|e| SyncError::Database(e.to_string()))?;
        Ok(())
    }

    async fn append<T>(&self, collection: &str, doc: &T) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .insert()
            .into(collection)
            .generate_document_id()
            .object(doc)
            .execute()
            .await
            .map_err(|e| SyncError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get<T>(&self, collection: &str, id: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| SyncError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::collections;
    use crate::models::{SyncCounts, SyncLogEntry, SyncOperation, SyncOutcome};

    async fn write_through<S: DocumentStore>(store: &S, entry: &SyncLogEntry) -> Result<()> {
        store.upsert(collections::SYNC_LOG, "1", entry).await?;
        store.append(collections::SYNC_LOG, entry).await
    }

    #[tokio::test]
    async fn test_store_accepts_model_documents() {
        let entry = SyncLogEntry {
            operation: SyncOperation::Roster,
            target: None,
            result: SyncOutcome::Success,
            counts: SyncCounts::default(),
            error: None,
            duration_ms: 5,
            timestamp: chrono::Utc::now(),
        };

        let offline = FirestoreDb::new_mock();
        assert!(matches!(
            write_through(&offline, &entry).await,
            Err(SyncError::Database(_))
        ));

        let memory = crate::db::MemoryStore::new();
        write_through(&memory, &entry).await.unwrap();
        assert_eq!(memory.count(collections::SYNC_LOG), 2);
    }
}
