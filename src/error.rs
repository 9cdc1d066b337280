//! Error types for the overlap detection system
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::vector::{ClusteringError, VectorError};

/// Main error type for corpus, query and audit operations
#[derive(Error, Debug)]
pub enum OverlapError {
    /// Record source missing or malformed
    #[error("Failed to load work items from '{path}': {reason}")]
    DataSource { path: PathBuf, reason: String },

    /// Embedding provider unreachable or misbehaving
    #[error("Embedding failed for {subject}: {reason}")]
    Embedding { subject: String, reason: String },

    /// Vector dimension disagrees with the corpus
    #[error(
        "Dimension mismatch for '{id}': corpus uses {expected}, got {actual}. Mixing embedding models is not supported."
    )]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    /// Degenerate call rejected before any work is done
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Optional vector store unreachable and fallback disabled
    #[error("Vector store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    /// Store snapshot on disk unreadable or corrupt
    #[error("Vector store snapshot error: {reason}")]
    Snapshot { reason: String },

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    /// Failure while writing a report or export
    #[error("Failed to write report '{path}': {source}")]
    Report {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl OverlapError {
    /// Shorthand for [`OverlapError::InvalidInput`].
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::DataSource { .. } => "DATA_SOURCE_ERROR",
            Self::Embedding { .. } => "EMBEDDING_ERROR",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
            Self::Snapshot { .. } => "SNAPSHOT_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Report { .. } => "REPORT_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::DataSource { .. } => vec![
                "Check that the source file exists and is readable",
                "Every record needs an id, team and summary",
            ],
            Self::Embedding { .. } => vec![
                "The model is downloaded on first use; check network access",
                "Verify embedding.model names a supported model",
            ],
            Self::DimensionMismatch { .. } => vec![
                "Re-ingest the whole corpus with a single embedding model",
                "Delete the store snapshot if it was built with another model",
            ],
            Self::StoreUnavailable { .. } => vec![
                "Set store.fallback_to_brute_force = true to query in memory",
                "Check the store.path location and permissions",
            ],
            Self::Snapshot { .. } => vec![
                "Delete the store snapshot and rerun to rebuild it from the source",
                "Check disk space and permissions for store.path",
            ],
            Self::Config { .. } => vec!["Run 'scopesync init --force' to regenerate settings"],
            Self::Report { .. } => {
                vec!["Check disk space and write permissions for the export path"]
            }
            Self::InvalidInput { .. } => vec![],
        }
    }
}

impl From<VectorError> for OverlapError {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::DimensionMismatch { expected, actual } => Self::DimensionMismatch {
                id: "<vector>".to_string(),
                expected,
                actual,
            },
            VectorError::EmbeddingFailed(reason) => Self::Embedding {
                subject: "model".to_string(),
                reason,
            },
            VectorError::UnknownModel(..) => Self::Embedding {
                subject: "model".to_string(),
                reason: err.to_string(),
            },
            VectorError::StoreUnavailable(reason) => Self::StoreUnavailable { reason },
            VectorError::Storage(_) | VectorError::Serialization(_) => Self::Snapshot {
                reason: err.to_string(),
            },
            VectorError::ZeroNorm
            | VectorError::NonFinite
            | VectorError::InvalidDimension { .. } => Self::InvalidInput {
                reason: err.to_string(),
            },
        }
    }
}

impl From<ClusteringError> for OverlapError {
    fn from(err: ClusteringError) -> Self {
        match err {
            ClusteringError::VectorError(inner) => inner.into(),
            ClusteringError::DimensionMismatch { expected, actual } => Self::DimensionMismatch {
                id: "<corpus>".to_string(),
                expected,
                actual,
            },
            ClusteringError::InvalidEps(_) | ClusteringError::InvalidMinClusterSize(_) => {
                Self::InvalidInput {
                    reason: err.to_string(),
                }
            }
        }
    }
}

/// Result type alias for overlap operations
pub type OverlapResult<T> = Result<T, OverlapError>;
