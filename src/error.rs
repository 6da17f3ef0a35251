//! Application error types.

use thiserror::Error;

/// Application-level errors for sbmlgraph.
#[derive(Error, Debug)]
pub enum AppError {
    // Neo4j errors
    #[error("Neo4j connection error: {0}")]
    Connection(#[from] neo4rs::Error),

    #[error("Neo4j query error: {message}")]
    Query { message: String, query: String },

    #[error(
        "Relationship endpoints missing for model '{tag}': created {created} of {expected} {rel_type} relationships"
    )]
    MissingEndpoints {
        tag: String,
        rel_type: String,
        expected: usize,
        created: usize,
    },

    // Domain errors
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Mapping failed for '{path}': {message}")]
    Mapping { path: String, message: String },

    #[error("Model source error for '{path}': {message}")]
    Source { path: String, message: String },

    #[error("Invalid identifier '{0}': expected [A-Za-z_][A-Za-z0-9_]*")]
    InvalidIdentifier(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Broad classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorKind {
    NotFound,
    Mapping,
    Source,
    Store,
    Invalid,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::Mapping => "mapping",
            ErrorKind::Source => "source",
            ErrorKind::Store => "store",
            ErrorKind::Invalid => "invalid",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

impl AppError {
    /// Builds a mapping error for the given source path.
    pub fn mapping(path: impl AsRef<std::path::Path>, message: impl Into<String>) -> Self {
        AppError::Mapping {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    /// Builds a model source error for the given path.
    pub fn source_error(path: impl AsRef<std::path::Path>, message: impl Into<String>) -> Self {
        AppError::Source {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ModelNotFound(_) => ErrorKind::NotFound,
            AppError::Mapping { .. } => ErrorKind::Mapping,
            AppError::Source { .. } => ErrorKind::Source,
            AppError::Connection(_) | AppError::Query { .. } | AppError::MissingEndpoints { .. } => {
                ErrorKind::Store
            }
            AppError::InvalidIdentifier(_) | AppError::Validation(_) | AppError::Config(_) => {
                ErrorKind::Invalid
            }
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable code used in batch reports and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ModelNotFound(_) => "MODEL_NOT_FOUND",
            AppError::Mapping { .. } => "MAPPING_ERROR",
            AppError::Source { .. } => "SOURCE_ERROR",
            AppError::Connection(_) => "CONNECTION_ERROR",
            AppError::Query { .. } => "QUERY_ERROR",
            AppError::MissingEndpoints { .. } => "MISSING_ENDPOINTS",
            AppError::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
