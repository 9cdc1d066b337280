//! Overlap detection: the real-time query, the batch audit and the risk
//! classification they share.

pub mod audit;
pub mod group;
pub mod query;
pub mod risk;

pub use audit::{AuditReport, ClusterAuditor, GroupFinding, ItemAssignment};
pub use group::{GroupMember, OverlapGroup};
pub use query::{
    OverlapMatch, OverlapQuery, QueryFinding, QueryInput, ingest_into_store, ingest_new_item,
    populate_store,
};
pub use risk::{OverlapKind, RiskAssessment, RiskClassifier, RiskLevel};
