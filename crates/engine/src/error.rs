use thiserror::Error;

/// Fatal: the run cannot start.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("no SQL extraction strategy configured (set sql_wrapping_type)")]
    MissingStrategy,
    #[error("unknown SQL extraction strategy '{0}'")]
    UnknownStrategy(String),
    #[error("strategy '{0}' selects no files: it needs a name, a layer and at least one suffix")]
    InvalidStrategy(String),
}

/// Recoverable: the statement is skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no table found in statement {statement}")]
    NoTable { statement: String },
}
