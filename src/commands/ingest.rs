//! Ingest command implementation
//!
//! Extraction → chunking → embedding → one batched upsert. The upsert only
//! happens after every chunk embedded successfully, so a failed ingest
//! leaves no partial collection state.

use crate::chunk::{chunk_text, compute_chunk_hash, compute_text_hash};
use crate::config::Config;
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::extract::{extract_file, ExtractedDocument};
use crate::models::sanitize_collection_name;
use crate::progress::add_progress_bar;
use crate::store::{ChunkPayload, ChunkPoint, VectorStore};
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Result of one ingest call
#[derive(Debug, Clone, Serialize)]
pub struct IngestStats {
    pub document_id: String,
    pub source: String,
    pub collection: String,
    pub chunks_created: usize,
}

/// One titled block of text to ingest
#[derive(Debug, Clone)]
pub struct TextItem {
    pub content: String,
    pub title: Option<String>,
}

/// Staged chunk before embedding
struct PendingChunk {
    text: String,
    chunk_index: i32,
    char_offset: i64,
    page: Option<i64>,
    source: String,
}

/// Ingest a file (PDF or plain text) into a collection
pub async fn cmd_ingest_file(
    config: &Config,
    store: &VectorStore,
    embedder: &dyn Embedder,
    path: &Path,
    collection: Option<&str>,
) -> Result<IngestStats> {
    let collection =
        sanitize_collection_name(collection.unwrap_or(&config.default_collection))?;

    let document = extract_file(path)?;
    info!(
        "Extracted {} bytes from {} ({} pages)",
        document.text_len(),
        document.source,
        document.pages.len()
    );

    let pending = stage_document(&document, config);
    if pending.is_empty() {
        return Err(Error::Ingestion(format!(
            "no text extracted from '{}'",
            path.display()
        )));
    }

    store_chunks(config, store, embedder, &collection, document.source, pending).await
}

/// Ingest text content directly into a collection
pub async fn cmd_ingest_text(
    config: &Config,
    store: &VectorStore,
    embedder: &dyn Embedder,
    collection: &str,
    items: Vec<TextItem>,
    chunk_content: bool,
) -> Result<IngestStats> {
    let collection = sanitize_collection_name(collection)?;

    let mut pending = Vec::new();
    let mut chunk_index = 0i32;

    for (i, item) in items.iter().enumerate() {
        if item.content.trim().is_empty() {
            continue;
        }

        let source = item
            .title
            .clone()
            .unwrap_or_else(|| format!("content_{}", i + 1));

        if chunk_content {
            for segment in chunk_text(&item.content, &config.chunk) {
                pending.push(PendingChunk {
                    text: segment.text,
                    chunk_index,
                    char_offset: segment.char_start as i64,
                    page: None,
                    source: source.clone(),
                });
                chunk_index += 1;
            }
        } else {
            pending.push(PendingChunk {
                text: item.content.clone(),
                chunk_index,
                char_offset: 0,
                page: None,
                source,
            });
            chunk_index += 1;
        }
    }

    if pending.is_empty() {
        return Err(Error::Validation("no valid content to ingest".to_string()));
    }

    let source = pending[0].source.clone();
    store_chunks(config, store, embedder, &collection, source, pending).await
}

fn stage_document(document: &ExtractedDocument, config: &Config) -> Vec<PendingChunk> {
    let mut pending = Vec::new();
    let mut chunk_index = 0i32;

    for page in &document.pages {
        if page.text.trim().is_empty() {
            continue;
        }

        for segment in chunk_text(&page.text, &config.chunk) {
            pending.push(PendingChunk {
                text: segment.text,
                chunk_index,
                char_offset: segment.char_start as i64,
                page: page.page,
                source: document.source.clone(),
            });
            chunk_index += 1;
        }
    }

    pending
}

async fn store_chunks(
    config: &Config,
    store: &VectorStore,
    embedder: &dyn Embedder,
    collection: &str,
    source: String,
    pending: Vec<PendingChunk>,
) -> Result<IngestStats> {
    let document_id = Uuid::new_v4().to_string();
    let doc_hash = compute_text_hash(&document_id);
    let stored_at = Utc::now().to_rfc3339();

    let bar = add_progress_bar(pending.len() as u64, "Embedding");
    let texts: Vec<String> = pending.iter().map(|c| c.text.clone()).collect();
    let mut embeddings = Vec::with_capacity(texts.len());
    for batch in texts.chunks(config.embedding.batch_size.max(1)) {
        let vectors = embedder.embed(batch.to_vec()).await?;
        embeddings.extend(vectors);
        bar.inc(batch.len() as u64);
    }
    bar.finish_and_clear();

    let points: Vec<ChunkPoint> = pending
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, vector)| {
            let chunk_hash = compute_chunk_hash(&chunk.text, &doc_hash);
            ChunkPoint {
                id: Uuid::new_v4(),
                vector,
                payload: ChunkPayload::new(
                    document_id.clone(),
                    chunk.source,
                    chunk.text,
                    chunk.chunk_index,
                    chunk.char_offset,
                    chunk.page,
                    chunk_hash,
                    stored_at.clone(),
                ),
            }
        })
        .collect();

    let chunks_created = points.len();
    store.upsert_points(collection, points).await?;

    info!(
        "Stored {} chunks in collection '{}'",
        chunks_created, collection
    );

    Ok(IngestStats {
        document_id,
        source,
        collection: collection.to_string(),
        chunks_created,
    })
}

/// Print ingest stats to console
pub fn print_ingest_stats(stats: &IngestStats) {
    println!("\nIngested {}\n", stats.source);
    println!("Document ID: {}", stats.document_id);
    println!("Collection: {}", stats.collection);
    println!("Chunks created: {}", stats.chunks_created);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_document_skips_blank_pages_and_offsets_chunks() {
        let config = Config::default();
        let document = ExtractedDocument {
            source: "report.pdf".to_string(),
            kind: crate::extract::DocumentKind::Pdf,
            pages: vec![
                crate::extract::ExtractedPage {
                    page: Some(1),
                    text: "First page text.".to_string(),
                },
                crate::extract::ExtractedPage {
                    page: Some(2),
                    text: "   ".to_string(),
                },
                crate::extract::ExtractedPage {
                    page: Some(3),
                    text: "Third page text.".to_string(),
                },
            ],
        };

        let pending = stage_document(&document, &config);
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].page, Some(1));
        assert_eq!(pending[1].page, Some(3));
        assert_eq!(pending[0].chunk_index, 0);
        assert_eq!(pending[1].chunk_index, 1);
    }
}
