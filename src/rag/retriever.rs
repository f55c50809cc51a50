//! Retrieval over named collections

use crate::config::QueryConfig;
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::store::VectorStore;
use serde::Serialize;
use tracing::debug;

/// Maximum characters of chunk content echoed back in source summaries
const SOURCE_PREVIEW_CHARS: usize = 500;

/// A retrieved chunk with its similarity score
#[derive(Debug, Clone)]
pub struct RetrievedDocument {
    pub content: String,
    pub source: String,
    pub chunk_id: String,
    pub score: f32,
    pub page: Option<i64>,
}

/// Source reference returned alongside an answer
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub content: String,
    pub source: String,
    pub chunk_id: String,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
}

/// Retriever over one vector store
pub struct Retriever<'a> {
    store: &'a VectorStore,
    embedder: &'a dyn Embedder,
    config: &'a QueryConfig,
}

impl<'a> Retriever<'a> {
    pub fn new(
        store: &'a VectorStore,
        embedder: &'a dyn Embedder,
        config: &'a QueryConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config,
        }
    }

    /// Retrieve the `top_k` most similar chunks from a collection.
    ///
    /// The query is embedded once and one nearest-neighbor lookup is issued.
    /// An empty collection yields an empty result; an unknown collection is
    /// NotFound. Results come back in descending score order and there are
    /// never more than the collection holds.
    pub async fn retrieve(
        &self,
        collection: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedDocument>> {
        if query.trim().is_empty() {
            return Err(Error::Validation("query text is empty".to_string()));
        }
        if top_k == 0 {
            return Err(Error::Validation("top_k must be positive".to_string()));
        }

        let top_k = top_k.min(self.config.max_results);

        let mut embeddings = self.embedder.embed(vec![query.to_string()]).await?;
        let query_vector = embeddings.pop().ok_or_else(|| {
            Error::Upstream("embedding backend returned no vector for query".to_string())
        })?;

        let results = self.store.search(collection, query_vector, top_k).await?;
        debug!("Retrieved {} chunks from {}", results.len(), collection);

        let documents = results
            .into_iter()
            .filter(|r| r.score >= self.config.min_score)
            .map(|r| RetrievedDocument {
                content: r.payload.text,
                source: r.payload.source,
                chunk_id: r.id,
                score: r.score,
                page: r.payload.page,
            })
            .collect();

        Ok(documents)
    }
}

/// Format retrieved documents as LLM context with citation markers
pub fn format_context(documents: &[RetrievedDocument]) -> String {
    if documents.is_empty() {
        return "No relevant documents found.".to_string();
    }

    let mut parts = Vec::with_capacity(documents.len());
    for (i, doc) in documents.iter().enumerate() {
        let source_info = match doc.page {
            Some(page) => format!("[Source: {}, Page {}]", doc.source, page),
            None => format!("[Source: {}]", doc.source),
        };
        parts.push(format!(
            "--- Document {} {} ---\n{}",
            i + 1,
            source_info,
            doc.content
        ));
    }

    parts.join("\n\n")
}

/// Shape documents for API-style responses: bounded previews, rounded scores
pub fn sources_for_response(documents: &[RetrievedDocument]) -> Vec<SourceSummary> {
    documents
        .iter()
        .map(|doc| {
            let content = if doc.content.len() > SOURCE_PREVIEW_CHARS {
                let cut = truncate_boundary(&doc.content, SOURCE_PREVIEW_CHARS);
                format!("{}...", &doc.content[..cut])
            } else {
                doc.content.clone()
            };

            SourceSummary {
                content,
                source: doc.source.clone(),
                chunk_id: doc.chunk_id.clone(),
                score: (doc.score * 10_000.0).round() / 10_000.0,
                page: doc.page,
            }
        })
        .collect()
}

fn truncate_boundary(text: &str, max: usize) -> usize {
    let mut cut = max.min(text.len());
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str, source: &str, score: f32, page: Option<i64>) -> RetrievedDocument {
        RetrievedDocument {
            content: content.to_string(),
            source: source.to_string(),
            chunk_id: "chunk-1".to_string(),
            score,
            page,
        }
    }

    #[test]
    fn test_format_context_with_citations() {
        let docs = vec![
            doc("Mangroves store carbon.", "report.pdf", 0.9, Some(2)),
            doc("Sundarbans baseline.", "notes.txt", 0.7, None),
        ];

        let context = format_context(&docs);
        assert!(context.contains("--- Document 1 [Source: report.pdf, Page 2] ---"));
        assert!(context.contains("--- Document 2 [Source: notes.txt] ---"));
        assert!(context.contains("Mangroves store carbon."));
    }

    #[test]
    fn test_format_context_empty() {
        assert_eq!(format_context(&[]), "No relevant documents found.");
    }

    #[test]
    fn test_sources_truncate_long_previews() {
        let long = "x".repeat(900);
        let sources = sources_for_response(&[doc(&long, "big.txt", 0.5, None)]);

        assert_eq!(sources[0].content.len(), SOURCE_PREVIEW_CHARS + 3);
        assert!(sources[0].content.ends_with("..."));
    }

    #[test]
    fn test_sources_round_scores() {
        let sources = sources_for_response(&[doc("short", "a.txt", 0.123456, None)]);
        assert!((sources[0].score - 0.1235).abs() < 1e-6);
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let text = "é".repeat(300); // 600 bytes of 2-byte chars
        let cut = truncate_boundary(&text, 499);
        assert!(text.is_char_boundary(cut));
        assert_eq!(cut, 498);
    }
}
