//! Project matching for grant pitches
//!
//! Given a grant focus, find the stored project that best matches it, or ask
//! the LLM for a hypothetical one when nothing scores above the configured
//! threshold. Generated projects are never persisted.

use crate::config::PitchConfig;
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::llm::CompletionBackend;
use crate::rag::prompts;
use crate::store::{SearchResult, VectorStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A project description, stored or generated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub focus_areas: Vec<String>,
    #[serde(default)]
    pub target_species: Vec<String>,
    #[serde(default)]
    pub location: String,
    pub description: String,
    #[serde(default)]
    pub methodology: String,
    #[serde(default)]
    pub expected_outcomes: Vec<String>,
    #[serde(default)]
    pub relevance_score: f32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_chunk_id: Option<String>,
}

/// Outcome of project matching. The variant says which case occurred, so
/// callers cannot use a project without knowing whether it is real.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "source", content = "project", rename_all = "snake_case")]
pub enum ProjectMatch {
    /// A stored project scored above the match threshold
    Existing(Project),
    /// Nothing matched; this project was generated for the request
    Generated(Project),
}

impl ProjectMatch {
    pub fn project(&self) -> &Project {
        match self {
            ProjectMatch::Existing(p) | ProjectMatch::Generated(p) => p,
        }
    }

    pub fn is_existing(&self) -> bool {
        matches!(self, ProjectMatch::Existing(_))
    }
}

/// Pick the best search result if it clears the threshold.
///
/// Results arrive in descending score order, so only the first can win; a
/// single best guess avoids merging ambiguous candidates.
pub fn decide_match(results: &[SearchResult], threshold: f32) -> Option<&SearchResult> {
    results.first().filter(|best| best.score > threshold)
}

/// Decode a stored or generated project description.
///
/// Stored project chunks and LLM output share one JSON shape; plain-text
/// project chunks fall back to name-from-source.
pub fn parse_project_json(text: &str) -> Option<Project> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str(cleaned.trim()).ok()
}

/// Remove a surrounding markdown code fence, if present
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

pub struct ProjectMatcher<'a> {
    store: &'a VectorStore,
    embedder: &'a dyn Embedder,
    llm: &'a dyn CompletionBackend,
    config: &'a PitchConfig,
}

impl<'a> ProjectMatcher<'a> {
    pub fn new(
        store: &'a VectorStore,
        embedder: &'a dyn Embedder,
        llm: &'a dyn CompletionBackend,
        config: &'a PitchConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            llm,
            config,
        }
    }

    /// Find a stored project matching the grant, or generate one.
    pub async fn match_or_generate(
        &self,
        grant_focus: &str,
        grant_requirements: &str,
    ) -> Result<ProjectMatch> {
        if grant_focus.trim().is_empty() {
            return Err(Error::Validation("grant focus is empty".to_string()));
        }

        if let Some(existing) = self.find_matching(grant_focus, grant_requirements).await? {
            info!(
                "Matched stored project '{}' (score {:.2})",
                existing.name, existing.relevance_score
            );
            return Ok(ProjectMatch::Existing(existing));
        }

        info!("No stored project matched; generating one for '{}'", grant_focus);
        let generated = self.generate(grant_focus, grant_requirements).await?;
        Ok(ProjectMatch::Generated(generated))
    }

    async fn find_matching(
        &self,
        grant_focus: &str,
        grant_requirements: &str,
    ) -> Result<Option<Project>> {
        let search_query = if grant_requirements.is_empty() {
            grant_focus.to_string()
        } else {
            format!("{}. {}", grant_focus, grant_requirements)
        };

        let mut embeddings = self.embedder.embed(vec![search_query]).await?;
        let query_vector = embeddings.pop().ok_or_else(|| {
            Error::Upstream("embedding backend returned no vector for query".to_string())
        })?;

        // A missing projects collection means nothing has been seeded yet
        let results = match self
            .store
            .search(&self.config.projects_collection, query_vector, 1)
            .await
        {
            Ok(results) => results,
            Err(Error::NotFound(_)) => {
                debug!(
                    "Projects collection '{}' does not exist yet",
                    self.config.projects_collection
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let Some(best) = decide_match(&results, self.config.match_threshold) else {
            if let Some(first) = results.first() {
                debug!(
                    "Best project score {:.2} below threshold {:.2}",
                    first.score, self.config.match_threshold
                );
            }
            return Ok(None);
        };

        let mut project = parse_project_json(&best.payload.text).unwrap_or_else(|| Project {
            name: best.payload.source.clone(),
            focus_areas: Vec::new(),
            target_species: Vec::new(),
            location: String::new(),
            description: best.payload.text.clone(),
            methodology: String::new(),
            expected_outcomes: Vec::new(),
            relevance_score: 0.0,
            source_chunk_id: None,
        });
        project.relevance_score = best.score;
        project.source_chunk_id = Some(best.id.clone());

        Ok(Some(project))
    }

    async fn generate(&self, grant_focus: &str, grant_requirements: &str) -> Result<Project> {
        let prompt = prompts::project_generation_prompt(
            &self.config.org_context,
            grant_focus,
            grant_requirements,
        );

        let response = self
            .llm
            .complete(prompts::PROJECT_SYSTEM_PROMPT, &prompt)
            .await?;

        match parse_project_json(&response) {
            Some(mut project) => {
                project.relevance_score = 1.0;
                project.source_chunk_id = None;
                Ok(project)
            }
            None => {
                debug!("Generated project JSON failed to parse; using fallback");
                Ok(fallback_project(grant_focus))
            }
        }
    }
}

/// Deterministic stand-in when the LLM returns malformed JSON
fn fallback_project(grant_focus: &str) -> Project {
    Project {
        name: format!("Conservation Initiative - {}", grant_focus),
        focus_areas: vec![grant_focus.to_string()],
        target_species: Vec::new(),
        location: String::new(),
        description: format!(
            "Monitoring-led conservation project focusing on {}.",
            grant_focus
        ),
        methodology: "Bioacoustic monitoring, satellite imagery analysis, and \
                      community-driven data collection."
            .to_string(),
        expected_outcomes: vec![
            "Species population baseline".to_string(),
            "Ecosystem health metrics".to_string(),
            "Community engagement".to_string(),
        ],
        relevance_score: 0.8,
        source_chunk_id: None,
    }
}

/// Render a project as a text block for prompt injection
pub fn project_block(project: &Project, is_existing: bool) -> String {
    let mut block = String::new();
    block.push_str(&format!("Name: {}\n", project.name));
    block.push_str(&format!(
        "Status: {}\n",
        if is_existing {
            "existing project"
        } else {
            "proposed project"
        }
    ));
    if !project.location.is_empty() {
        block.push_str(&format!("Location: {}\n", project.location));
    }
    if !project.focus_areas.is_empty() {
        block.push_str(&format!("Focus areas: {}\n", project.focus_areas.join(", ")));
    }
    if !project.target_species.is_empty() {
        block.push_str(&format!(
            "Target species: {}\n",
            project.target_species.join(", ")
        ));
    }
    block.push_str(&format!("Description: {}\n", project.description));
    if !project.methodology.is_empty() {
        block.push_str(&format!("Methodology: {}\n", project.methodology));
    }
    if !project.expected_outcomes.is_empty() {
        block.push_str(&format!(
            "Expected outcomes: {}\n",
            project.expected_outcomes.join("; ")
        ));
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ChunkPayload;

    fn search_result(score: f32, text: &str) -> SearchResult {
        SearchResult {
            id: "point-1".to_string(),
            score,
            payload: ChunkPayload::new(
                "doc-1".to_string(),
                "Sundarbans Mangrove Restoration".to_string(),
                text.to_string(),
                0,
                0,
                None,
                "hash".to_string(),
                "2024-01-01T00:00:00Z".to_string(),
            ),
        }
    }

    #[test]
    fn test_decide_match_above_threshold() {
        let results = vec![search_result(0.9, "desc")];
        assert!(decide_match(&results, 0.6).is_some());
    }

    #[test]
    fn test_decide_match_below_threshold() {
        let results = vec![search_result(0.4, "desc")];
        assert!(decide_match(&results, 0.6).is_none());
    }

    #[test]
    fn test_decide_match_empty_results() {
        assert!(decide_match(&[], 0.6).is_none());
    }

    #[test]
    fn test_decide_match_threshold_is_exclusive() {
        let results = vec![search_result(0.6, "desc")];
        assert!(decide_match(&results, 0.6).is_none());
    }

    #[test]
    fn test_parse_project_json_plain() {
        let json = r#"{"name": "Raptor Watch", "description": "Acoustic raptor monitoring.",
                       "focus_areas": ["raptors"], "location": "Western Ghats"}"#;

        let project = parse_project_json(json).unwrap();
        assert_eq!(project.name, "Raptor Watch");
        assert_eq!(project.focus_areas, vec!["raptors"]);
        assert!(project.expected_outcomes.is_empty());
    }

    #[test]
    fn test_parse_project_json_with_fences() {
        let fenced = "```json\n{\"name\": \"P\", \"description\": \"D\"}\n```";
        let project = parse_project_json(fenced).unwrap();
        assert_eq!(project.name, "P");

        let bare_fence = "```\n{\"name\": \"Q\", \"description\": \"D\"}\n```";
        assert_eq!(parse_project_json(bare_fence).unwrap().name, "Q");
    }

    #[test]
    fn test_parse_project_json_garbage() {
        assert!(parse_project_json("not json at all").is_none());
    }

    #[test]
    fn test_fallback_project_mentions_focus() {
        let project = fallback_project("wetland restoration");
        assert!(project.name.contains("wetland restoration"));
        assert_eq!(project.relevance_score, 0.8);
        assert!(!project.expected_outcomes.is_empty());
    }

    #[test]
    fn test_project_block_rendering() {
        let project = Project {
            name: "Raptor Watch".to_string(),
            focus_areas: vec!["raptors".to_string()],
            target_species: vec!["Aquila nipalensis".to_string()],
            location: "Western Ghats".to_string(),
            description: "Acoustic raptor monitoring.".to_string(),
            methodology: "AudioMoth grids.".to_string(),
            expected_outcomes: vec!["Baseline census".to_string()],
            relevance_score: 0.9,
            source_chunk_id: None,
        };

        let block = project_block(&project, true);
        assert!(block.contains("Name: Raptor Watch"));
        assert!(block.contains("Status: existing project"));
        assert!(block.contains("Aquila nipalensis"));

        let proposed = project_block(&project, false);
        assert!(proposed.contains("Status: proposed project"));
    }
}
