//! Answer composition
//!
//! Assembles one prompt out of retrieved chunks, bounded session history,
//! and (for pitches) the matched or generated project, then delegates to the
//! LLM backend. The completion's text comes back verbatim together with the
//! source chunks used, and the exchange is appended to the session only
//! after the completion succeeded.

use crate::config::Config;
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::llm::CompletionBackend;
use crate::rag::{
    format_context, project_block, prompts, sources_for_response, ProjectMatch, ProjectMatcher,
    RetrievedDocument, Retriever, SourceSummary,
};
use crate::session::SessionStore;
use crate::store::VectorStore;
use tracing::info;

/// Response from a knowledge-base query
#[derive(Debug, Clone, serde::Serialize)]
pub struct RagResponse {
    pub answer: String,
    pub sources: Vec<SourceSummary>,
    pub query: String,
    pub session_id: Option<String>,
}

/// Response from a pitch request
#[derive(Debug, Clone, serde::Serialize)]
pub struct PitchResponse {
    #[serde(flatten)]
    pub matched: ProjectMatch,
    pub answer: String,
    pub sources: Vec<SourceSummary>,
    pub grant_focus: String,
}

/// RAG chain combining retriever, prompts, LLM, and conversation memory
pub struct RagChain<'a> {
    store: &'a VectorStore,
    embedder: &'a dyn Embedder,
    llm: &'a dyn CompletionBackend,
    sessions: &'a SessionStore,
    config: &'a Config,
}

impl<'a> RagChain<'a> {
    pub fn new(
        store: &'a VectorStore,
        embedder: &'a dyn Embedder,
        llm: &'a dyn CompletionBackend,
        sessions: &'a SessionStore,
        config: &'a Config,
    ) -> Self {
        Self {
            store,
            embedder,
            llm,
            sessions,
            config,
        }
    }

    fn retriever(&self) -> Retriever<'_> {
        Retriever::new(self.store, self.embedder, &self.config.query)
    }

    /// Answer a question from a collection, with optional session memory
    pub async fn answer(
        &self,
        question: &str,
        collection: &str,
        top_k: usize,
        session_id: Option<&str>,
        website_context: Option<&str>,
    ) -> Result<RagResponse> {
        let documents = self.retriever().retrieve(collection, question, top_k).await?;
        let context = format_context(&documents);

        let history = match session_id {
            Some(id) => self.sessions.formatted_history(id, website_context).await,
            None => String::new(),
        };

        let prompt = prompts::answer_prompt(
            &self.config.pitch.org_context,
            &context,
            question,
            &history,
        );

        let answer = self
            .llm
            .complete(prompts::ANSWER_SYSTEM_PROMPT, &prompt)
            .await?;

        if let Some(id) = session_id {
            self.sessions
                .append(id, website_context, question.to_string(), answer.clone())
                .await?;
        }

        info!(
            "Answered query against '{}' using {} chunks",
            collection,
            documents.len()
        );

        Ok(RagResponse {
            answer,
            sources: sources_for_response(&documents),
            query: question.to_string(),
            session_id: session_id.map(str::to_string),
        })
    }

    /// Compose a grant pitch: match or generate a project, then write the
    /// pitch grounded in retrieved knowledge-base context
    pub async fn pitch(
        &self,
        grant_focus: &str,
        grant_requirements: &str,
        collection: &str,
        top_k: usize,
        session_id: Option<&str>,
        website_context: Option<&str>,
    ) -> Result<PitchResponse> {
        let matcher = ProjectMatcher::new(self.store, self.embedder, self.llm, &self.config.pitch);
        let matched = matcher
            .match_or_generate(grant_focus, grant_requirements)
            .await?;

        // Supporting context is best-effort: a fresh install without the
        // knowledge collection can still produce a pitch
        let documents = match self
            .retriever()
            .retrieve(collection, grant_focus, top_k)
            .await
        {
            Ok(documents) => documents,
            Err(Error::NotFound(_)) => Vec::<RetrievedDocument>::new(),
            Err(e) => return Err(e),
        };
        let context = format_context(&documents);

        let history = match session_id {
            Some(id) => self.sessions.formatted_history(id, website_context).await,
            None => String::new(),
        };

        let block = project_block(matched.project(), matched.is_existing());
        let prompt = prompts::pitch_prompt(
            &self.config.pitch.org_context,
            &block,
            &context,
            grant_focus,
            &history,
        );

        let answer = self
            .llm
            .complete(prompts::ANSWER_SYSTEM_PROMPT, &prompt)
            .await?;

        if let Some(id) = session_id {
            self.sessions
                .append(
                    id,
                    website_context,
                    grant_focus.to_string(),
                    answer.clone(),
                )
                .await?;
        }

        info!(
            "Composed pitch for '{}' ({} project)",
            grant_focus,
            if matched.is_existing() {
                "existing"
            } else {
                "generated"
            }
        );

        Ok(PitchResponse {
            matched,
            answer,
            sources: sources_for_response(&documents),
            grant_focus: grant_focus.to_string(),
        })
    }
}
