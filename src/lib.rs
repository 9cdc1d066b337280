//! Semantic overlap detection for team backlogs.
//!
//! Work items are embedded once into a [`Corpus`]; the corpus is then
//! checked either one new item at a time ([`OverlapQuery`]) or as a whole
//! ([`ClusterAuditor`]). Both paths share the cosine distance in
//! [`vector`] and the [`RiskClassifier`].

pub mod config;
pub mod corpus;
pub mod display;
pub mod error;
pub mod io;
pub mod logging;
pub mod overlap;
pub mod source;
pub mod vector;

// Explicit exports for better API clarity
pub use config::Settings;
pub use corpus::{Corpus, WorkItem, WorkItemRecord, context_snippet};
pub use error::{OverlapError, OverlapResult};
pub use overlap::{
    AuditReport, ClusterAuditor, OverlapGroup, OverlapKind, OverlapMatch, OverlapQuery,
    QueryFinding, QueryInput, RiskAssessment, RiskClassifier, RiskLevel,
};
pub use source::{JsonRecordSource, RecordSource};
pub use vector::{
    ClusterId, ClusterLabel, CosineDistance, DistanceMetric, EmbeddingGenerator,
    InMemoryVectorStore, RetryPolicy, VectorStore,
};
