//! Error taxonomy for the extraction engine.
//!
//! Per the error-handling design, only [`Error::Repository`] ever crosses the
//! engine's public boundary. The other variants exist so internal fallible
//! steps can propagate with `?`; the orchestrator captures them as record
//! metadata or [`crate::record::Issue`] entries instead of returning `Err`.

use thiserror::Error as ThisError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(ThisError, Debug, Clone, PartialEq)]
pub enum Error {
    /// Caller-supplied text was empty or exceeded the hard maximum.
    #[error("input error: {0}")]
    Input(String),

    /// A catalog entry produced a candidate that failed its own validator.
    #[error("pattern invariant violation: {0}")]
    PatternInvariantViolation(String),

    /// The declared document type has no known schema, or the schema
    /// version pinned in configuration does not match the loaded schema set.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The AI gap-filler failed (network, bad JSON, empty response, deadline).
    #[error("LLM call failed: {0}")]
    LlmFailure(String),

    /// The quality judge failed (network, bad JSON, deadline).
    #[error("judge call failed: {0}")]
    JudgeFailure(String),

    /// The repository rejected a save or query. The only kind propagated
    /// to the caller across the engine's public boundary.
    #[error("repository failure: {0}")]
    Repository(String),

    /// A value failed validation and was dropped (not surfaced to callers,
    /// used internally to short-circuit a candidate).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Catalog or schema data failed to compile (malformed regex literal).
    #[error("catalog error: {0}")]
    Catalog(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::LlmFailure(format!("JSON parse error: {err}"))
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Catalog(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_readable() {
        let err = Error::SchemaMismatch("hbl_v2".to_string());
        assert_eq!(err.to_string(), "schema mismatch: hbl_v2");
    }

    #[test]
    fn json_errors_convert_to_llm_failure() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::LlmFailure(_)));
    }
}
