//! Batch cluster audit over keyword and hand-placed corpora.

use std::collections::BTreeSet;

use crate::common::{at_angle, keyword_corpus, vector_corpus};
use scopesync::config::ClusteringConfig;
use scopesync::io::{CsvExporter, ReportSink};
use scopesync::vector::ClusterLabel;
use scopesync::{AuditReport, ClusterAuditor, Corpus, OverlapError, RiskLevel};

fn auditor(eps: f32, min_cluster_size: usize) -> ClusterAuditor {
    ClusterAuditor::new(ClusteringConfig {
        eps,
        min_cluster_size,
        ..ClusteringConfig::default()
    })
}

fn memberships(report: &AuditReport) -> BTreeSet<Vec<String>> {
    report
        .groups
        .iter()
        .map(|group| {
            let mut ids: Vec<String> = group.member_ids().iter().map(|id| id.to_string()).collect();
            ids.sort();
            ids
        })
        .collect()
}

fn backlog() -> Corpus {
    keyword_corpus(&[
        ("NOV-1", "Nova", "Reset password from the login page"),
        ("ATL-1", "Atlas", "Billing export to CSV"),
        ("NOV-2", "Nova", "Password reset link via login"),
        ("ORI-1", "Orion", "Profile avatar upload"),
        ("ATL-2", "Atlas", "Monthly billing export"),
        ("ORI-2", "Orion", "Login password reset"),
    ])
}

#[test]
fn test_audit_groups_and_classifies() {
    let report = auditor(0.2, 2).run(&backlog()).unwrap();

    assert_eq!(report.groups.len(), 2);
    assert_eq!(report.label_of("ORI-1"), Some(ClusterLabel::Noise));
    assert_eq!(report.noise_count(), 1);

    let findings = report.findings().unwrap();
    let password = &findings[0];
    assert_eq!(password.group.member_ids(), vec!["NOV-1", "NOV-2", "ORI-2"]);
    assert_eq!(password.assessment.level, RiskLevel::High);
    assert_eq!(
        password.assessment.action,
        "COORDINATE: Nova, Orion must merge or realign."
    );

    let billing = &findings[1];
    assert_eq!(billing.group.member_ids(), vec!["ATL-1", "ATL-2"]);
    assert_eq!(billing.assessment.level, RiskLevel::Medium);
}

#[test]
fn test_audit_is_deterministic() {
    let corpus = backlog();
    let first = auditor(0.2, 2).run(&corpus).unwrap();
    let second = auditor(0.2, 2).run(&corpus).unwrap();

    assert_eq!(memberships(&first), memberships(&second));
    assert_eq!(first.assignments, second.assignments);
}

#[test]
fn test_isolated_item_is_never_grouped() {
    let corpus = vector_corpus(
        "Nova",
        &[
            ("A", at_angle(0.0)),
            ("B", at_angle(2.0)),
            ("C", at_angle(4.0)),
            ("LONER", at_angle(90.0)),
        ],
    );

    let report = auditor(0.05, 2).run(&corpus).unwrap();
    assert_eq!(report.label_of("LONER"), Some(ClusterLabel::Noise));
    assert!(
        report
            .groups
            .iter()
            .all(|group| !group.member_ids().contains(&"LONER"))
    );
}

#[test]
fn test_min_cluster_size_filters_small_groups() {
    let corpus = vector_corpus(
        "Nova",
        &[
            ("A", at_angle(0.0)),
            ("B", at_angle(1.0)),
            ("C", at_angle(80.0)),
            ("D", at_angle(81.0)),
            ("E", at_angle(82.0)),
        ],
    );

    let report = auditor(0.01, 3).run(&corpus).unwrap();
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].member_ids(), vec!["C", "D", "E"]);
    assert_eq!(report.label_of("A"), Some(ClusterLabel::Noise));
}

#[test]
fn test_empty_corpus_has_no_groups() {
    let report = auditor(0.5, 2).run(&Corpus::new()).unwrap();
    assert!(report.groups.is_empty());
    assert!(report.assignments.is_empty());
}

#[test]
fn test_invalid_parameters_are_rejected() {
    let corpus = backlog();
    assert!(matches!(
        auditor(-0.1, 2).run(&corpus),
        Err(OverlapError::InvalidInput { .. })
    ));
    assert!(matches!(
        auditor(0.2, 0).run(&corpus),
        Err(OverlapError::InvalidInput { .. })
    ));
    assert!(matches!(
        auditor(0.2, 1).run(&corpus),
        Err(OverlapError::InvalidInput { .. })
    ));
}

#[test]
fn test_csv_exports_are_written() {
    let dir = tempfile::tempdir().unwrap();
    let summary = dir.path().join("reports").join("summary.csv");
    let assignments = dir.path().join("reports").join("assignments.csv");

    let report = auditor(0.2, 2).run(&backlog()).unwrap();
    CsvExporter::new(&summary, &assignments)
        .audit(&report)
        .unwrap();

    let summary = std::fs::read_to_string(summary).unwrap();
    let mut lines = summary.lines();
    assert_eq!(
        lines.next(),
        Some(
            "Cluster_ID,Risk_Level,Feature_Theme,Teams_Involved,Total_Tickets,Overlapping_IDs,Summary_Action"
        )
    );
    assert_eq!(summary.lines().count(), 3);

    let assignments = std::fs::read_to_string(assignments).unwrap();
    assert!(assignments.starts_with("ID,Team,Summary,Cluster_ID"));
    assert!(assignments.contains("ORI-1,Orion,Profile avatar upload,-1"));
}
