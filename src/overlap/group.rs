//! Overlap groups: sets of work items judged mutually similar.

use serde::Serialize;

use crate::corpus::WorkItem;
use crate::error::OverlapResult;
use crate::overlap::risk::{RiskAssessment, RiskClassifier};
use crate::vector::ClusterId;

/// A group member, copied out of the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupMember {
    pub id: String,
    pub team: String,
    pub summary: String,
}

impl From<&WorkItem> for GroupMember {
    fn from(item: &WorkItem) -> Self {
        Self {
            id: item.id().to_string(),
            team: item.team().to_string(),
            summary: item.summary().to_string(),
        }
    }
}

/// Members of one overlap, either a density cluster or the matches of a
/// single query.
///
/// Risk is never stored; [`OverlapGroup::assess`] derives it from the
/// current membership every time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlapGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    cluster: Option<ClusterId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_team: Option<String>,
    members: Vec<GroupMember>,
}

impl OverlapGroup {
    /// Group produced by the batch audit, members in corpus order.
    pub fn from_cluster(cluster: ClusterId, members: Vec<GroupMember>) -> Self {
        Self {
            cluster: Some(cluster),
            query_team: None,
            members,
        }
    }

    /// Group formed by the matches of a real-time query. The query's own
    /// team counts as involved.
    pub fn from_query(query_team: impl Into<String>, members: Vec<GroupMember>) -> Self {
        Self {
            cluster: None,
            query_team: Some(query_team.into()),
            members,
        }
    }

    pub fn cluster(&self) -> Option<ClusterId> {
        self.cluster
    }

    pub fn members(&self) -> &[GroupMember] {
        &self.members
    }

    pub fn member_ids(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Distinct teams in first-appearance order, query team first.
    pub fn involved_teams(&self) -> Vec<&str> {
        let mut teams: Vec<&str> = Vec::new();
        let candidates = self
            .query_team
            .as_deref()
            .into_iter()
            .chain(self.members.iter().map(|m| m.team.as_str()));
        for team in candidates {
            if !teams.contains(&team) {
                teams.push(team);
            }
        }
        teams
    }

    /// Summary of the first member in corpus order.
    pub fn feature_theme(&self) -> Option<&str> {
        self.members.first().map(|m| m.summary.as_str())
    }

    /// Classifies the group as it stands now.
    ///
    /// Fails with `InvalidInput` when the group has no members.
    pub fn assess(&self) -> OverlapResult<RiskAssessment> {
        if self.members.is_empty() {
            return RiskClassifier::classify::<&str>(&[]);
        }
        RiskClassifier::classify(&self.involved_teams())
    }
}
