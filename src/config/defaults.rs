//! Default values for configuration

/// Default Qdrant gRPC URL for local development (port 6334, not 6333 REST)
pub fn default_qdrant_url() -> String {
    std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://127.0.0.1:6334".to_string())
}

/// Default environment variable name for Qdrant API key
pub fn default_qdrant_api_key_env() -> String {
    "".to_string()
}

/// Default collection for knowledge-base documents
pub fn default_collection_name() -> String {
    "canopy_docs".to_string()
}

/// Default embedding model
pub fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

/// Default embedding dimension (all-MiniLM-L6-v2)
pub fn default_embedding_dimension() -> usize {
    384
}

/// Default embedding backend URL
pub fn default_embedding_backend_url() -> String {
    std::env::var("CANOPY_EMBEDDING_BACKEND_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:7997".to_string())
}

/// Default batch size for embedding
pub fn default_embedding_batch_size() -> usize {
    32
}

/// Default timeout for embedding requests in seconds
pub fn default_embedding_timeout() -> u64 {
    30
}

/// Default LLM API base URL
pub fn default_llm_backend_url() -> String {
    std::env::var("CANOPY_LLM_BACKEND_URL")
        .unwrap_or_else(|_| "https://api.anthropic.com".to_string())
}

/// Default LLM model for answer generation
pub fn default_llm_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

/// Default environment variable name for the LLM API key
pub fn default_llm_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

/// Default maximum tokens per completion
pub fn default_llm_max_tokens() -> u32 {
    1024
}

/// Default completion temperature
pub fn default_llm_temperature() -> f32 {
    0.0
}

/// Default timeout for LLM requests in seconds
pub fn default_llm_timeout() -> u64 {
    60
}

/// Default maximum characters per chunk
pub fn default_chunk_max_chars() -> usize {
    800
}

/// Default overlap characters between chunks
pub fn default_chunk_overlap() -> usize {
    150
}

/// Default number of query results
pub fn default_query_k() -> usize {
    5
}

/// Default maximum query results
pub fn default_query_max_results() -> usize {
    20
}

/// Default minimum similarity score
pub fn default_query_min_score() -> f32 {
    0.0
}

/// Default collection holding seeded project descriptions
pub fn default_projects_collection() -> String {
    "canopy_projects".to_string()
}

/// Similarity score above which a stored project counts as a match
pub fn default_match_threshold() -> f32 {
    0.6
}

/// Default number of past turns injected into prompts
pub fn default_history_window() -> usize {
    3
}

/// Default cap on live sessions per website context
pub fn default_max_sessions_per_context() -> usize {
    100
}

/// Default organisation framing prepended to prompts
pub fn default_org_context() -> String {
    "Canopy is a conservation-technology organisation that monitors \
     biodiversity and carbon outcomes for restoration projects."
        .to_string()
}
