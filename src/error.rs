//! Custom error types for canopy

use thiserror::Error;

/// Main error type for canopy operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

/// Result type alias for canopy
pub type Result<T> = std::result::Result<T, Error>;

/// Qdrant failures are upstream failures: the vector store is an external
/// collaborator and its errors surface to the caller unretried.
impl From<qdrant_client::QdrantError> for Error {
    fn from(err: qdrant_client::QdrantError) -> Self {
        Error::Upstream(format!("qdrant: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_error_kinds_display() {
        let cases = [
            (Error::Validation("empty query".into()), "Validation error"),
            (Error::NotFound("collection 'x'".into()), "Not found"),
            (
                Error::PreconditionFailed("confirm required".into()),
                "Precondition failed",
            ),
            (Error::Upstream("llm timed out".into()), "Upstream error"),
            (Error::Ingestion("corrupt pdf".into()), "Ingestion error"),
        ];

        for (err, prefix) in cases {
            assert!(err.to_string().starts_with(prefix), "{}", err);
        }
    }
}
