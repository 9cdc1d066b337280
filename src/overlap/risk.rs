//! Risk Classifier.
//!
//! Pure function of the set of involved teams: more than one team is a
//! cross-team conflict, a single team is internal redundancy.

use std::fmt;

use serde::Serialize;

use crate::error::{OverlapError, OverlapResult};

/// Risk tier of an overlap group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RiskLevel {
    #[serde(rename = "MEDIUM RISK")]
    Medium,
    #[serde(rename = "HIGH RISK")]
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH RISK",
            Self::Medium => "MEDIUM RISK",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of overlap a group represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OverlapKind {
    #[serde(rename = "Cross-Team Conflict")]
    CrossTeamConflict,
    #[serde(rename = "Internal Redundancy")]
    InternalRedundancy,
}

impl OverlapKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrossTeamConflict => "Cross-Team Conflict",
            Self::InternalRedundancy => "Internal Redundancy",
        }
    }
}

impl fmt::Display for OverlapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification outcome with the recommended action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub kind: OverlapKind,
    pub teams: Vec<String>,
    pub action: String,
}

impl RiskAssessment {
    pub fn is_cross_team(&self) -> bool {
        self.kind == OverlapKind::CrossTeamConflict
    }
}

/// Stateless classifier shared by the query and audit paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskClassifier;

impl RiskClassifier {
    /// Classifies a group from its involved teams.
    ///
    /// Duplicates are collapsed keeping first appearance. An empty team
    /// list means an empty group and is rejected.
    pub fn classify<S: AsRef<str>>(teams: &[S]) -> OverlapResult<RiskAssessment> {
        let mut distinct: Vec<String> = Vec::with_capacity(teams.len());
        for team in teams {
            let team = team.as_ref();
            if !distinct.iter().any(|t| t == team) {
                distinct.push(team.to_string());
            }
        }

        let (level, kind, action) = match distinct.as_slice() {
            [] => {
                return Err(OverlapError::invalid_input(
                    "cannot classify an empty overlap group",
                ));
            }
            [team] => (
                RiskLevel::Medium,
                OverlapKind::InternalRedundancy,
                format!("REVIEW: {team} should consolidate redundant tickets."),
            ),
            teams => (
                RiskLevel::High,
                OverlapKind::CrossTeamConflict,
                format!("COORDINATE: {} must merge or realign.", teams.join(", ")),
            ),
        };

        Ok(RiskAssessment {
            level,
            kind,
            teams: distinct,
            action,
        })
    }
}
