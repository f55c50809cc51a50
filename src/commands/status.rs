//! Status command implementation

use crate::config::Config;
use crate::error::Result;
use crate::store::{CollectionStats, VectorStore};
use serde::Serialize;
use tracing::info;

/// Status information
#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub qdrant_url: String,
    pub qdrant_connected: bool,
    pub embedding_model: String,
    pub llm_model: String,
    pub default_collection: String,
    pub projects_collection: String,
    pub collections: Vec<CollectionStatsRow>,
    pub total_chunks: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionStatsRow {
    pub name: String,
    pub points_count: usize,
}

impl From<CollectionStats> for CollectionStatsRow {
    fn from(stats: CollectionStats) -> Self {
        Self {
            name: stats.name,
            points_count: stats.points_count,
        }
    }
}

/// Get system status
pub async fn cmd_status(config: &Config, store: &VectorStore) -> Result<StatusInfo> {
    info!("Getting status");

    let (qdrant_connected, collections) = match store.stats().await {
        Ok(stats) => (true, stats),
        Err(e) => {
            tracing::debug!("Qdrant connection error: {:?}", e);
            (false, Vec::new())
        }
    };

    let total_chunks = collections.iter().map(|c| c.points_count).sum();

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        qdrant_url: config.qdrant_url.clone(),
        qdrant_connected,
        embedding_model: config.embedding.model.clone(),
        llm_model: config.llm.model.clone(),
        default_collection: config.default_collection.clone(),
        projects_collection: config.pitch.projects_collection.clone(),
        collections: collections.into_iter().map(Into::into).collect(),
        total_chunks,
    })
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\ncanopy Status\n");
    println!("Configuration: {}", status.config_path);
    println!("\nQdrant:");
    println!("  URL: {}", status.qdrant_url);
    println!(
        "  Status: {}",
        if status.qdrant_connected {
            "connected"
        } else {
            "not connected"
        }
    );

    println!("\nModels:");
    println!("  Embedding: {}", status.embedding_model);
    println!("  LLM: {}", status.llm_model);

    println!("\nCollections ({} chunks total):", status.total_chunks);
    if status.collections.is_empty() {
        println!("  (none)");
    }
    for collection in &status.collections {
        let marker = if collection.name == status.default_collection {
            " [default]"
        } else if collection.name == status.projects_collection {
            " [projects]"
        } else {
            ""
        };
        println!(
            "  {} - {} chunks{}",
            collection.name, collection.points_count, marker
        );
    }
}
