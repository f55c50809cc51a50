//! Shared request types and naming rules.

use crate::error::{Error, Result};

/// Explicit confirmation for destructive operations.
///
/// Deleting a collection or clearing sessions is irreversible, so every
/// destructive entry point takes this type instead of a bare bool: callers
/// must spell out which case they mean, and `require()` rejects the
/// unconfirmed case before any side effect happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Unconfirmed,
    Confirmed,
}

impl Confirmation {
    pub fn from_flag(confirmed: bool) -> Self {
        if confirmed {
            Self::Confirmed
        } else {
            Self::Unconfirmed
        }
    }

    /// Fail with PreconditionFailed unless confirmed
    pub fn require(self, action: &str) -> Result<()> {
        match self {
            Self::Confirmed => Ok(()),
            Self::Unconfirmed => Err(Error::PreconditionFailed(format!(
                "{} requires --confirm",
                action
            ))),
        }
    }
}

/// Normalize a user-supplied collection name: lowercase, spaces and dots
/// become underscores.
pub fn sanitize_collection_name(name: &str) -> Result<String> {
    let normalized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '.' { '_' } else { c })
        .collect();

    if normalized.is_empty() {
        return Err(Error::Validation("collection name is empty".to_string()));
    }

    if !normalized
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(Error::Validation(format!(
            "collection name '{}' contains unsupported characters",
            name
        )));
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_gate() {
        assert!(Confirmation::Confirmed.require("delete").is_ok());

        let err = Confirmation::Unconfirmed.require("delete").unwrap_err();
        assert!(matches!(err, Error::PreconditionFailed(_)));
    }

    #[test]
    fn test_confirmation_from_flag() {
        assert_eq!(Confirmation::from_flag(true), Confirmation::Confirmed);
        assert_eq!(Confirmation::from_flag(false), Confirmation::Unconfirmed);
    }

    #[test]
    fn test_sanitize_collection_name() {
        assert_eq!(
            sanitize_collection_name("Reptors Org").unwrap(),
            "reptors_org"
        );
        assert_eq!(
            sanitize_collection_name("canopy.earth").unwrap(),
            "canopy_earth"
        );
        assert!(sanitize_collection_name("  ").is_err());
        assert!(sanitize_collection_name("bad/name").is_err());
    }
}
