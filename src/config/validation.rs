//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::{Config, StoreBackend};
use std::path::Path;
use thiserror::Error;

/// Longest accepted hide grace period.
const MAX_HIDE_DELAY_MS: u64 = 300_000;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("store.path is required for the redb backend")]
    MissingStorePath,
    #[error("store.path parent directory does not exist: {0}")]
    StorePathInvalid(String),
    #[error("filter.hide_delay_ms must be at most 300000, got {0}")]
    HideDelayTooLong(u64),
    #[error("filter.services entries must be non-empty nicknames without spaces, got '{0}'")]
    InvalidServiceNick(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.store.backend == StoreBackend::Redb {
        let path = &config.store.path;
        if path.is_empty() {
            errors.push(ValidationError::MissingStorePath);
        } else if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::StorePathInvalid(path.clone()));
        }
    }

    if config.filter.hide_delay_ms > MAX_HIDE_DELAY_MS {
        errors.push(ValidationError::HideDelayTooLong(config.filter.hide_delay_ms));
    }

    for nick in &config.filter.services {
        if nick.is_empty() || nick.contains(' ') {
            errors.push(ValidationError::InvalidServiceNick(nick.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
