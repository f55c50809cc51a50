//! Query command implementation

use crate::config::Config;
use crate::embed::Embedder;
use crate::error::Result;
use crate::llm::CompletionBackend;
use crate::models::sanitize_collection_name;
use crate::rag::{RagChain, RagResponse};
use crate::session::SessionStore;
use crate::store::VectorStore;
use tracing::info;

/// Query options
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Collection to search (defaults to the configured collection)
    pub collection: Option<String>,
    /// Number of results to retrieve
    pub top_k: Option<usize>,
    /// Session for conversation memory
    pub session_id: Option<String>,
    /// Website context scoping the session
    pub website_context: Option<String>,
}

/// Answer a question against the knowledge base
#[allow(clippy::too_many_arguments)]
pub async fn cmd_query(
    config: &Config,
    store: &VectorStore,
    embedder: &dyn Embedder,
    llm: &dyn CompletionBackend,
    sessions: &SessionStore,
    query: &str,
    options: QueryOptions,
) -> Result<RagResponse> {
    info!("Querying: {}", query);

    let collection = sanitize_collection_name(
        options
            .collection
            .as_deref()
            .unwrap_or(&config.default_collection),
    )?;
    let top_k = options.top_k.unwrap_or(config.query.default_k);

    let chain = RagChain::new(store, embedder, llm, sessions, config);
    chain
        .answer(
            query,
            &collection,
            top_k,
            options.session_id.as_deref(),
            options.website_context.as_deref(),
        )
        .await
}

/// Print a query response to console
pub fn print_query_result(response: &RagResponse) {
    println!("\n{}\n", response.answer);

    if response.sources.is_empty() {
        return;
    }

    println!("Sources:");
    for (i, source) in response.sources.iter().enumerate() {
        let location = match source.page {
            Some(page) => format!("{} (page {})", source.source, page),
            None => source.source.clone(),
        };
        println!("{}. [score: {:.3}] {}", i + 1, source.score, location);

        let preview = if source.content.len() > 200 {
            let mut cut = 200;
            while !source.content.is_char_boundary(cut) {
                cut -= 1;
            }
            format!("{}...", source.content[..cut].trim())
        } else {
            source.content.trim().to_string()
        };
        println!("   {}\n", preview.replace('\n', " "));
    }
}
