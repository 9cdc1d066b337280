//! Vector substrate shared by both analysis modes.
//!
//! Holds the distance engine, density clustering, the embedding provider
//! abstraction and the vector store contract. Nothing in here knows about
//! teams or risk; that lives in [`crate::overlap`].
//!
//! # Architecture
//! Embeddings are produced once at ingestion and never mutated. Queries
//! and audits read them through [`DistanceMetric`], so both modes rank and
//! cluster with exactly the same metric.

mod clustering;
mod distance;
mod embedding;
mod retry;
mod store;
mod types;

// Re-export core types for public API
pub use clustering::{ClusteringError, DbscanParams, DbscanResult, dbscan};
pub use distance::{
    CosineDistance, DistanceMetric, cosine_distance, similarity_from_distance,
    validate_comparable,
};
#[cfg(test)]
pub use embedding::MockEmbeddingGenerator;
pub use embedding::{
    EmbeddingGenerator, FastEmbedGenerator, default_models_dir, parse_embedding_model,
};
pub use retry::RetryPolicy;
pub use store::{InMemoryVectorStore, StoreHit, StoreMetadata, StoreRecord, VectorStore};
pub use types::{
    ClusterId, ClusterLabel, MAX_COSINE_DISTANCE, VECTOR_DIMENSION_384, VectorDimension,
    VectorError,
};
