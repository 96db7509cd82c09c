//! Protocol error types.

use thiserror::Error;

/// Errors raised while splitting a raw line into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineParseError {
    /// The line was empty or only contained line terminators.
    #[error("empty line")]
    Empty,

    /// No valid verb (letters or a three-digit numeric) was found.
    #[error("invalid verb at byte {position}")]
    InvalidVerb {
        /// Byte offset into the line where the verb was expected.
        position: usize,
    },
}
