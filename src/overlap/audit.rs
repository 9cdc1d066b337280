//! Batch cluster audit.
//!
//! Runs DBSCAN over the whole corpus under cosine distance and turns every
//! cluster into an [`OverlapGroup`]. Noise items get no group.
//!
//! Neighbour discovery is O(N²·D); expect a 10k-item backlog to take
//! seconds, and switch to an index before going much larger.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::config::ClusteringConfig;
use crate::corpus::Corpus;
use crate::error::OverlapResult;
use crate::overlap::group::{GroupMember, OverlapGroup};
use crate::overlap::risk::RiskAssessment;
use crate::vector::{ClusterId, ClusterLabel, CosineDistance, DbscanParams, dbscan};

/// Cluster assignment of one corpus item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemAssignment {
    pub id: String,
    pub team: String,
    pub summary: String,
    pub cluster: ClusterLabel,
}

/// An overlap group together with its risk assessment.
#[derive(Debug, Clone, Serialize)]
pub struct GroupFinding {
    pub group: OverlapGroup,
    pub assessment: RiskAssessment,
}

/// Output of one audit run.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    /// One entry per corpus item, in corpus order.
    pub assignments: Vec<ItemAssignment>,
    /// One group per cluster, ordered by cluster id.
    pub groups: Vec<OverlapGroup>,
    pub core_points: usize,
}

impl AuditReport {
    pub fn label_of(&self, id: &str) -> Option<ClusterLabel> {
        self.assignments
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.cluster)
    }

    pub fn noise_count(&self) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.cluster.is_noise())
            .count()
    }

    /// Groups paired with their current risk assessment.
    pub fn findings(&self) -> OverlapResult<Vec<GroupFinding>> {
        self.groups
            .iter()
            .map(|group| {
                Ok(GroupFinding {
                    group: group.clone(),
                    assessment: group.assess()?,
                })
            })
            .collect()
    }
}

/// Partitions a corpus into overlap groups and noise.
#[derive(Debug, Clone)]
pub struct ClusterAuditor {
    config: ClusteringConfig,
}

impl ClusterAuditor {
    pub fn new(config: ClusteringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Clusters `corpus`. An empty corpus yields an empty report.
    pub fn run(&self, corpus: &Corpus) -> OverlapResult<AuditReport> {
        let params = DbscanParams::new(self.config.eps, self.config.min_cluster_size)?;
        let result = dbscan(&corpus.embeddings(), &params, &CosineDistance)?;

        let mut members: BTreeMap<ClusterId, Vec<GroupMember>> = BTreeMap::new();
        let mut assignments = Vec::with_capacity(corpus.len());

        for (item, label) in corpus.iter().zip(&result.labels) {
            if let ClusterLabel::Cluster(id) = label {
                members.entry(*id).or_default().push(GroupMember::from(item));
            }
            assignments.push(ItemAssignment {
                id: item.id().to_string(),
                team: item.team().to_string(),
                summary: item.summary().to_string(),
                cluster: *label,
            });
        }

        let groups: Vec<OverlapGroup> = members
            .into_iter()
            .map(|(id, members)| OverlapGroup::from_cluster(id, members))
            .collect();

        info!(
            items = corpus.len(),
            clusters = groups.len(),
            noise = result.noise_count(),
            eps = self.config.eps,
            min_cluster_size = self.config.min_cluster_size,
            "cluster audit finished"
        );

        Ok(AuditReport {
            assignments,
            groups,
            core_points: result.core_points,
        })
    }
}
