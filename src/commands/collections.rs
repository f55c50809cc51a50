//! Collection management commands

use crate::error::Result;
use crate::models::{sanitize_collection_name, Confirmation};
use crate::store::{CollectionStats, StoredChunk, VectorStore};
use serde::Serialize;
use tracing::info;

/// A collection's contents for inspection
#[derive(Debug, Clone, Serialize)]
pub struct CollectionView {
    pub name: String,
    pub total_chunks: usize,
    pub chunks: Vec<StoredChunk>,
}

/// List all collections with chunk counts
pub async fn cmd_list_collections(store: &VectorStore) -> Result<Vec<CollectionStats>> {
    store.stats().await
}

/// Inspect chunks stored in one collection
pub async fn cmd_show_collection(
    store: &VectorStore,
    name: &str,
    limit: usize,
) -> Result<CollectionView> {
    let name = sanitize_collection_name(name)?;
    let total_chunks = store.count(&name).await?;
    let chunks = store.peek(&name, limit).await?;

    Ok(CollectionView {
        name,
        total_chunks,
        chunks,
    })
}

/// Delete a collection and everything in it
pub async fn cmd_delete_collection(
    store: &VectorStore,
    name: &str,
    confirm: Confirmation,
) -> Result<String> {
    let name = sanitize_collection_name(name)?;
    store.delete_collection(&name, confirm).await?;
    info!("Deleted collection {}", name);
    Ok(name)
}

/// Print collection list to console
pub fn print_collections(stats: &[CollectionStats]) {
    println!("\nCollections\n");

    if stats.is_empty() {
        println!("No collections yet. Use 'canopy ingest' to create one.");
        return;
    }

    for stat in stats {
        println!("• {} ({} chunks)", stat.name, stat.points_count);
    }
}

/// Print a collection view to console
pub fn print_collection_view(view: &CollectionView) {
    println!(
        "\nCollection {} ({} chunks, showing {})\n",
        view.name,
        view.total_chunks,
        view.chunks.len()
    );

    for chunk in &view.chunks {
        let preview = if chunk.payload.text.len() > 300 {
            let mut cut = 300;
            while !chunk.payload.text.is_char_boundary(cut) {
                cut -= 1;
            }
            format!("{}...", &chunk.payload.text[..cut])
        } else {
            chunk.payload.text.clone()
        };

        println!("• {} [{}]", chunk.id, chunk.payload.source);
        println!("  {}\n", preview.replace('\n', " "));
    }
}
