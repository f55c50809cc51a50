//! Pitch command implementation
//!
//! Matches a grant against the seeded project catalog (or generates a
//! hypothetical project) and composes a pitch. Also hosts project seeding,
//! the only way a project enters the catalog.

use crate::config::Config;
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::llm::CompletionBackend;
use crate::models::sanitize_collection_name;
use crate::rag::{PitchResponse, Project, RagChain};
use crate::session::SessionStore;
use crate::store::{ChunkPayload, ChunkPoint, VectorStore};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

/// Pitch options
#[derive(Debug, Clone, Default)]
pub struct PitchOptions {
    /// Detailed grant requirements
    pub requirements: String,
    /// Knowledge collection for supporting context
    pub collection: Option<String>,
    /// Number of supporting chunks to retrieve
    pub top_k: Option<usize>,
    /// Session for conversation memory
    pub session_id: Option<String>,
    /// Website context scoping the session
    pub website_context: Option<String>,
}

/// Compose a grant pitch
#[allow(clippy::too_many_arguments)]
pub async fn cmd_pitch(
    config: &Config,
    store: &VectorStore,
    embedder: &dyn Embedder,
    llm: &dyn CompletionBackend,
    sessions: &SessionStore,
    grant_focus: &str,
    options: PitchOptions,
) -> Result<PitchResponse> {
    info!("Pitching for: {}", grant_focus);

    let collection = sanitize_collection_name(
        options
            .collection
            .as_deref()
            .unwrap_or(&config.default_collection),
    )?;
    let top_k = options.top_k.unwrap_or(config.query.default_k);

    let chain = RagChain::new(store, embedder, llm, sessions, config);
    chain
        .pitch(
            grant_focus,
            &options.requirements,
            &collection,
            top_k,
            options.session_id.as_deref(),
            options.website_context.as_deref(),
        )
        .await
}

/// Seed a project into the projects collection so future pitches can match it
pub async fn cmd_seed_project(
    config: &Config,
    store: &VectorStore,
    embedder: &dyn Embedder,
    project: Project,
) -> Result<String> {
    if project.name.trim().is_empty() || project.description.trim().is_empty() {
        return Err(Error::Validation(
            "a project needs a name and a description".to_string(),
        ));
    }

    let collection = sanitize_collection_name(&config.pitch.projects_collection)?;

    // Match queries embed focus + requirements, so seed embeddings cover
    // name, focus areas, and description together
    let embed_input = format!(
        "{}. {}. {}",
        project.name,
        project.focus_areas.join(", "),
        project.description
    );
    let mut embeddings = embedder.embed(vec![embed_input]).await?;
    let vector = embeddings.pop().ok_or_else(|| {
        Error::Upstream("embedding backend returned no vector for project".to_string())
    })?;

    let record = serde_json::to_string(&project)?;
    let doc_id = Uuid::new_v4().to_string();
    let point = ChunkPoint {
        id: Uuid::new_v4(),
        vector,
        payload: ChunkPayload::new(
            doc_id.clone(),
            project.name.clone(),
            record,
            0,
            0,
            None,
            crate::chunk::compute_text_hash(&project.description),
            Utc::now().to_rfc3339(),
        ),
    };

    store.upsert_points(&collection, vec![point]).await?;
    info!("Seeded project '{}' into '{}'", project.name, collection);

    Ok(doc_id)
}

/// Print a pitch response to console
pub fn print_pitch_result(response: &PitchResponse) {
    let project = response.matched.project();

    println!("\nProject: {}", project.name);
    println!(
        "Match: {}",
        if response.matched.is_existing() {
            format!("existing (score {:.2})", project.relevance_score)
        } else {
            "generated for this grant".to_string()
        }
    );
    if !project.location.is_empty() {
        println!("Location: {}", project.location);
    }
    if !project.focus_areas.is_empty() {
        println!("Focus areas: {}", project.focus_areas.join(", "));
    }

    println!("\n{}\n", response.answer);

    if !response.sources.is_empty() {
        println!("Supporting sources:");
        for (i, source) in response.sources.iter().enumerate() {
            println!("{}. [score: {:.3}] {}", i + 1, source.score, source.source);
        }
    }
}
