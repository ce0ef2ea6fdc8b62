//! Error types shared across the matching pipeline.

use std::time::Duration;

use thiserror::Error;

/// Structural failures that abort a catalog index build or lookup.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("embedding dimension mismatch for {identifier}: expected {expected}, got {actual}")]
    DimensionMismatch {
        identifier: String,
        expected: usize,
        actual: usize,
    },

    #[error("vector index error: {0}")]
    Usearch(String),
}

/// Two catalog rows normalize to the same identifier. The first one wins.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("duplicate identifier {normalized}: keeping {kept}, dropping {dropped}")]
pub struct DuplicateIdentifierError {
    pub normalized: String,
    pub kept: String,
    pub dropped: String,
}

/// The catalog handed to the index contained no usable records.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("catalog is empty, every lookup resolves to none")]
pub struct EmptyCatalogError;

/// Failure to obtain an embedding from the provider.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding provider failed: {0}")]
    Provider(String),

    #[error("embedding provider timed out after {0:?}")]
    Timeout(Duration),

    #[error("embedding provider returned no vectors")]
    EmptyResponse,
}

/// Invalid or unreadable service configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),

    #[error("invalid matcher settings: {0}")]
    Invalid(String),
}
