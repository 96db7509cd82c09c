//! Error types surfaced to administrative callers.

use crate::db::StoreError;
use thiserror::Error;

/// Failure of an administrative operation.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("identifier must not be empty")]
    EmptyIdentifier,

    #[error("identifier '{0}' must not contain whitespace")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AdminError {
    /// Whether this is a caller mistake rather than a backend failure.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::EmptyIdentifier | Self::InvalidIdentifier(_))
    }
}

/// Check an identifier supplied by an administrator.
pub fn check_identifier(identifier: &str) -> Result<(), AdminError> {
    if identifier.is_empty() {
        return Err(AdminError::EmptyIdentifier);
    }
    if identifier.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(AdminError::InvalidIdentifier(identifier.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_identifier() {
        assert!(check_identifier("phone").is_ok());
        assert!(matches!(check_identifier(""), Err(AdminError::EmptyIdentifier)));
        assert!(matches!(
            check_identifier("my phone"),
            Err(AdminError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_is_usage() {
        assert!(AdminError::EmptyIdentifier.is_usage());
        assert!(!AdminError::Store(StoreError::Unavailable("down".into())).is_usage());
    }
}
