//! Payload schema for Qdrant points

use qdrant_client::qdrant::{PointStruct, Value as QdrantValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// A point ready to be upserted to Qdrant
#[derive(Debug, Clone)]
pub struct ChunkPoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

impl ChunkPoint {
    /// Convert to qdrant-client PointStruct
    pub fn to_point_struct(self) -> PointStruct {
        let payload_map = self.payload.to_qdrant_payload();
        PointStruct::new(self.id.to_string(), self.vector, payload_map)
    }
}

/// Payload stored with each chunk in Qdrant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPayload {
    /// Document ID (stable per ingested file or text batch)
    pub doc_id: String,

    /// Source file name or content title
    pub source: String,

    /// The chunk text itself
    pub text: String,

    /// Chunk index within the document
    pub chunk_index: i32,

    /// Byte offset of the chunk in the extracted text
    pub char_offset: i64,

    /// Page number, for paged documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,

    /// Hash of the chunk content
    pub chunk_hash: String,

    /// When this chunk was stored
    pub stored_at: String,
}

impl ChunkPayload {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        doc_id: String,
        source: String,
        text: String,
        chunk_index: i32,
        char_offset: i64,
        page: Option<i64>,
        chunk_hash: String,
        stored_at: String,
    ) -> Self {
        Self {
            doc_id,
            source,
            text,
            chunk_index,
            char_offset,
            page,
            chunk_hash,
            stored_at,
        }
    }

    /// Convert to Qdrant payload format
    pub fn to_qdrant_payload(self) -> HashMap<String, QdrantValue> {
        let mut map = HashMap::new();

        map.insert("doc_id".to_string(), string_to_qdrant(&self.doc_id));
        map.insert("source".to_string(), string_to_qdrant(&self.source));
        map.insert("text".to_string(), string_to_qdrant(&self.text));
        map.insert(
            "chunk_index".to_string(),
            int_to_qdrant(self.chunk_index as i64),
        );
        map.insert("char_offset".to_string(), int_to_qdrant(self.char_offset));
        map.insert("chunk_hash".to_string(), string_to_qdrant(&self.chunk_hash));
        map.insert("stored_at".to_string(), string_to_qdrant(&self.stored_at));

        if let Some(page) = self.page {
            map.insert("page".to_string(), int_to_qdrant(page));
        }

        map
    }
}

fn string_to_qdrant(s: &str) -> QdrantValue {
    QdrantValue {
        kind: Some(qdrant_client::qdrant::value::Kind::StringValue(
            s.to_string(),
        )),
    }
}

fn int_to_qdrant(i: i64) -> QdrantValue {
    QdrantValue {
        kind: Some(qdrant_client::qdrant::value::Kind::IntegerValue(i)),
    }
}

impl From<Map<String, Value>> for ChunkPayload {
    fn from(map: Map<String, Value>) -> Self {
        serde_json::from_value(Value::Object(map)).unwrap_or_else(|_| ChunkPayload {
            doc_id: String::new(),
            source: String::new(),
            text: String::new(),
            chunk_index: 0,
            char_offset: 0,
            page: None,
            chunk_hash: String::new(),
            stored_at: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_serialization() {
        let payload = ChunkPayload::new(
            "doc-123".to_string(),
            "report.pdf".to_string(),
            "Mangrove cover increased.".to_string(),
            0,
            0,
            Some(3),
            "hash123".to_string(),
            "2024-01-01T00:00:00Z".to_string(),
        );

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("doc_id"));
        assert!(json.contains("report.pdf"));

        let parsed: ChunkPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.doc_id, "doc-123");
        assert_eq!(parsed.page, Some(3));
    }

    #[test]
    fn test_payload_from_map_tolerates_missing_fields() {
        let map = serde_json::json!({"doc_id": "d", "text": "t"});
        let Value::Object(map) = map else { unreachable!() };

        // Partial payloads decode to the empty default rather than panicking
        let payload = ChunkPayload::from(map);
        assert!(payload.doc_id.is_empty());
        assert_eq!(payload.chunk_index, 0);
    }
}
