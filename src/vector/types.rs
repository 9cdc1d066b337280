//! Type-safe wrappers and core types for the vector substrate.
//!
//! Newtypes here keep dimensions and cluster labels from being passed
//! around as bare integers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dimension of the default embedding model (all-MiniLM-L6-v2).
pub const VECTOR_DIMENSION_384: usize = 384;

/// Upper bound of the cosine distance range.
pub const MAX_COSINE_DISTANCE: f32 = 2.0;

/// Identifier of a density cluster produced by one audit run.
///
/// Numbering starts at zero and follows the order in which clusters are
/// discovered while walking the corpus, so it is stable within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterId(u32);

impl ClusterId {
    /// Creates a new `ClusterId`.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ClusterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of clustering for a single point.
///
/// `Noise` is distinct from every real cluster id; it means no overlap
/// was detected for the point in this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterLabel {
    Cluster(ClusterId),
    Noise,
}

impl ClusterLabel {
    /// Returns the cluster id, or `None` for noise.
    #[must_use]
    pub fn cluster(&self) -> Option<ClusterId> {
        match self {
            Self::Cluster(id) => Some(*id),
            Self::Noise => None,
        }
    }

    #[must_use]
    pub fn is_noise(&self) -> bool {
        matches!(self, Self::Noise)
    }

    /// Tabular form used by exports: the cluster number, or `-1` for noise.
    #[must_use]
    pub fn as_export_value(&self) -> i64 {
        match self {
            Self::Cluster(id) => i64::from(id.get()),
            Self::Noise => -1,
        }
    }
}

impl Serialize for ClusterLabel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_export_value())
    }
}

/// Type-safe wrapper for vector dimensions.
///
/// A corpus fixes its dimension with the first ingested embedding; every
/// later vector is validated against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension` with validation.
    ///
    /// Returns an error if the dimension is zero.
    pub fn new(dim: usize) -> Result<Self, VectorError> {
        if dim == 0 {
            return Err(VectorError::InvalidDimension {
                dimension: 0,
                reason: "Vector dimension cannot be zero",
            });
        }
        Ok(Self(dim))
    }

    /// Creates a standard 384-dimensional vector dimension.
    #[must_use]
    pub const fn dimension_384() -> Self {
        Self(VECTOR_DIMENSION_384)
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), VectorError> {
        if vector.len() != self.0 {
            return Err(VectorError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

/// Errors that can occur during vector operations.
///
/// All error messages include actionable suggestions for resolution.
#[derive(Error, Debug)]
pub enum VectorError {
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure all vectors use the same embedding model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector dimension: {dimension}\nReason: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },

    #[error(
        "Vector has zero norm\nSuggestion: Cosine distance is undefined for all-zero embeddings; check the embedding provider output"
    )]
    ZeroNorm,

    #[error("Vector contains non-finite values\nSuggestion: Check the embedding provider output")]
    NonFinite,

    #[error(
        "Embedding generation failed: {0}\nSuggestion: Verify the embedding model is properly initialized"
    )]
    EmbeddingFailed(String),

    #[error("Unknown embedding model: {0}\nSuggestion: Use one of {1}")]
    UnknownModel(String, &'static str),

    #[error("Vector store unavailable: {0}\nSuggestion: Check the store path and permissions")]
    StoreUnavailable(String),

    #[error("Storage error: {0}\nSuggestion: Check disk space and file permissions")]
    Storage(#[from] std::io::Error),

    #[error(
        "Serialization error: {0}\nSuggestion: Check that vector data is valid and not corrupted"
    )]
    Serialization(String),
}

impl VectorError {
    /// Whether another attempt at the same call may succeed.
    ///
    /// Provider and store outages are transient; bad vectors, unknown
    /// models and corrupt snapshots are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingFailed(_) | Self::StoreUnavailable(_) | Self::Storage(_)
        )
    }
}
