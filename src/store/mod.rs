//! Qdrant vector database integration
//!
//! Wraps the Qdrant client with multi-collection support:
//! - Collection lifecycle (create on first ingest, inspect, delete)
//! - Point upsert and vector search per collection
//! - Per-collection-name serialization so a delete cannot interleave with an
//!   in-flight add to the same collection

mod payload;

pub use payload::*;

use crate::error::{Error, Result};
use crate::models::Confirmation;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, ScrollPointsBuilder, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Vector store handle over all collections
pub struct VectorStore {
    client: Qdrant,
    dimension: usize,
    collection_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

/// Search result from one collection
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: String,
    pub score: f32,
    pub payload: ChunkPayload,
}

/// A stored chunk as returned by inspection
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoredChunk {
    pub id: String,
    pub payload: ChunkPayload,
}

/// Per-collection statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct CollectionStats {
    pub name: String,
    pub points_count: usize,
}

impl VectorStore {
    /// Connect to Qdrant
    pub fn connect(url: &str, api_key: Option<String>, dimension: usize) -> Result<Self> {
        debug!("Connecting to Qdrant at {}", url);

        let mut builder = Qdrant::from_url(url).skip_compatibility_check();
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        let client = builder.build().map_err(Error::from)?;

        Ok(Self {
            client,
            dimension,
            collection_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Get the expected vector dimension for this store
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Serialization point for mutations of one collection name
    fn collection_lock(&self, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .collection_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Ensure a collection exists with the expected configuration
    pub async fn ensure_collection(&self, name: &str) -> Result<()> {
        if self.client.collection_exists(name).await? {
            debug!("Collection {} already exists", name);
            return Ok(());
        }

        info!("Creating collection {} with dimension {}", name, self.dimension);

        let vectors_config = VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine);

        self.client
            .create_collection(CreateCollectionBuilder::new(name).vectors_config(vectors_config))
            .await?;

        Ok(())
    }

    /// Check if a collection exists
    pub async fn collection_exists(&self, name: &str) -> Result<bool> {
        let exists = self.client.collection_exists(name).await?;
        Ok(exists)
    }

    /// List all collection names
    pub async fn list_collections(&self) -> Result<Vec<String>> {
        let response = self.client.list_collections().await?;
        let mut names: Vec<String> = response
            .collections
            .into_iter()
            .map(|c| c.name)
            .collect();
        names.sort();
        Ok(names)
    }

    /// Upsert chunk points into a collection, creating it if absent.
    ///
    /// The whole batch goes up in one call after every vector passed the
    /// dimension check, so a failed ingest leaves no partial collection state.
    pub async fn upsert_points(&self, collection: &str, points: Vec<ChunkPoint>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        if let Some(mismatch) = points.iter().find(|p| p.vector.len() != self.dimension) {
            return Err(Error::Upstream(format!(
                "Vector dimension mismatch for collection '{}': expected {}, got {}",
                collection,
                self.dimension,
                mismatch.vector.len()
            )));
        }

        let lock = self.collection_lock(collection);
        let _guard = lock.lock().await;

        self.ensure_collection(collection).await?;

        debug!("Upserting {} points to collection {}", points.len(), collection);

        let point_structs: Vec<_> = points.into_iter().map(|p| p.to_point_struct()).collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, point_structs))
            .await?;

        Ok(())
    }

    /// Search a collection for the nearest chunks.
    ///
    /// Fails with NotFound for an unknown collection. Scores are clamped into
    /// [0, 1], higher meaning more similar; Qdrant returns results in
    /// descending score order with stable ordering for ties.
    pub async fn search(
        &self,
        collection: &str,
        query_vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        if !self.client.collection_exists(collection).await? {
            return Err(Error::NotFound(format!("collection '{}'", collection)));
        }

        debug!("Searching collection {} with limit {}", collection, limit);

        let search = SearchPointsBuilder::new(collection, query_vector, limit as u64)
            .with_payload(true);

        let response = self.client.search_points(search).await?;

        let results: Vec<SearchResult> = response
            .result
            .into_iter()
            .map(|p| {
                let payload: ChunkPayload = p
                    .payload
                    .into_iter()
                    .map(|(k, v)| (k, json_from_qdrant_value(v)))
                    .collect::<serde_json::Map<String, Value>>()
                    .into();

                SearchResult {
                    id: point_id_to_string(p.id),
                    score: p.score.clamp(0.0, 1.0),
                    payload,
                }
            })
            .collect();

        Ok(results)
    }

    /// Number of points stored in a collection
    pub async fn count(&self, collection: &str) -> Result<usize> {
        if !self.client.collection_exists(collection).await? {
            return Err(Error::NotFound(format!("collection '{}'", collection)));
        }

        let info = self.client.collection_info(collection).await?;
        let count = info
            .result
            .and_then(|r| r.points_count)
            .unwrap_or(0);
        Ok(count as usize)
    }

    /// Inspect up to `limit` stored chunks of a collection
    pub async fn peek(&self, collection: &str, limit: usize) -> Result<Vec<StoredChunk>> {
        if !self.client.collection_exists(collection).await? {
            return Err(Error::NotFound(format!("collection '{}'", collection)));
        }

        let scroll = ScrollPointsBuilder::new(collection)
            .limit(limit as u32)
            .with_payload(true)
            .with_vectors(false);

        let response = self.client.scroll(scroll).await?;

        let chunks = response
            .result
            .into_iter()
            .map(|p| {
                let payload: ChunkPayload = p
                    .payload
                    .into_iter()
                    .map(|(k, v)| (k, json_from_qdrant_value(v)))
                    .collect::<serde_json::Map<String, Value>>()
                    .into();

                StoredChunk {
                    id: point_id_to_string(p.id),
                    payload,
                }
            })
            .collect();

        Ok(chunks)
    }

    /// Delete a collection. Destructive and irreversible, so it takes an
    /// explicit confirmation and fails with NotFound for unknown names.
    pub async fn delete_collection(&self, name: &str, confirm: Confirmation) -> Result<()> {
        confirm.require(&format!("deleting collection '{}'", name))?;

        let lock = self.collection_lock(name);
        let _guard = lock.lock().await;

        if !self.client.collection_exists(name).await? {
            return Err(Error::NotFound(format!("collection '{}'", name)));
        }

        info!("Deleting collection {}", name);
        self.client.delete_collection(name).await?;
        Ok(())
    }

    /// Statistics for every collection
    pub async fn stats(&self) -> Result<Vec<CollectionStats>> {
        let names = self.list_collections().await?;
        let mut stats = Vec::with_capacity(names.len());

        for name in names {
            let points_count = self.count(&name).await?;
            stats.push(CollectionStats {
                name,
                points_count,
            });
        }

        Ok(stats)
    }
}

/// Convert PointId to string
fn point_id_to_string(id: Option<qdrant_client::qdrant::PointId>) -> String {
    use qdrant_client::qdrant::point_id::PointIdOptions;

    match id.and_then(|i| i.point_id_options) {
        Some(PointIdOptions::Uuid(uuid)) => uuid,
        Some(PointIdOptions::Num(num)) => num.to_string(),
        None => String::new(),
    }
}

/// Convert Qdrant value to serde_json Value
fn json_from_qdrant_value(v: qdrant_client::qdrant::Value) -> Value {
    use qdrant_client::qdrant::value::Kind;

    match v.kind {
        Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => Value::Array(
            list.values
                .into_iter()
                .map(json_from_qdrant_value)
                .collect(),
        ),
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, json_from_qdrant_value(v)))
                .collect(),
        ),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn offline_store(dimension: usize) -> VectorStore {
        // Client construction is lazy; nothing here touches the network
        VectorStore::connect("http://127.0.0.1:6334", None, dimension)
            .expect("store should initialize")
    }

    fn test_payload() -> ChunkPayload {
        ChunkPayload::new(
            "doc-456".to_string(),
            "notes.txt".to_string(),
            "chunk body".to_string(),
            0,
            0,
            None,
            "hash123".to_string(),
            "2024-01-01T00:00:00Z".to_string(),
        )
    }

    #[tokio::test]
    async fn test_upsert_points_rejects_dimension_mismatch() {
        let store = offline_store(3);

        let point = ChunkPoint {
            id: Uuid::new_v4(),
            vector: vec![0.1, 0.2],
            payload: test_payload(),
        };

        let err = store
            .upsert_points("test_collection", vec![point])
            .await
            .expect_err("should reject mismatched vector length");

        match err {
            Error::Upstream(message) => assert!(message.contains("dimension mismatch")),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_without_confirmation_fails_before_any_io() {
        let store = offline_store(3);

        // No Qdrant is running on this address; the precondition check must
        // reject the call before any network traffic
        let err = store
            .delete_collection("test_collection", Confirmation::Unconfirmed)
            .await
            .expect_err("unconfirmed delete must fail");

        assert!(matches!(err, Error::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn test_upsert_empty_batch_is_a_no_op() {
        let store = offline_store(3);
        store
            .upsert_points("test_collection", Vec::new())
            .await
            .expect("empty batch should not touch the store");
    }

    #[test]
    fn test_score_clamping() {
        assert_eq!(1.2_f32.clamp(0.0, 1.0), 1.0);
        assert_eq!((-0.3_f32).clamp(0.0, 1.0), 0.0);
        assert_eq!(0.42_f32.clamp(0.0, 1.0), 0.42);
    }
}
