//! File source through query, store and audit.

use crate::common::KeywordEmbedder;
use scopesync::config::{ClusteringConfig, QueryConfig};
use scopesync::overlap::{ingest_into_store, populate_store};
use scopesync::{
    ClusterAuditor, Corpus, EmbeddingGenerator, InMemoryVectorStore, JsonRecordSource,
    OverlapKind, OverlapQuery, QueryInput, RecordSource, RetryPolicy, RiskLevel, VectorStore,
    WorkItem, WorkItemRecord,
};

const BACKLOG: &str = r#"[
  {"id": "A", "team": "TeamX", "summary": "reset password", "description": "Users forget passwords. Add a reset."},
  {"id": "B", "team": "TeamY", "summary": "user password reset flow"},
  {"id": "C", "team": "TeamZ", "summary": "unrelated billing export"}
]"#;

fn load_backlog(dir: &tempfile::TempDir) -> Corpus {
    let path = dir.path().join("backlog.json");
    std::fs::write(&path, BACKLOG).unwrap();
    let records = JsonRecordSource::new(&path).load().unwrap();
    Corpus::from_records(records, &KeywordEmbedder, 2, RetryPolicy::no_retry()).unwrap()
}

fn query_config() -> QueryConfig {
    QueryConfig {
        k: 10,
        max_distance_threshold: 0.45,
    }
}

#[test]
fn test_password_reset_query_flags_cross_team_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = load_backlog(&dir);

    let finding = OverlapQuery::new(&corpus, query_config())
        .with_embedder(&KeywordEmbedder, RetryPolicy::no_retry())
        .run(QueryInput::Text("allow resetting password"), "TeamX")
        .unwrap();

    let ids: Vec<&str> = finding.matches.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);
    assert!(!ids.contains(&"C"));

    assert_eq!(finding.matches[0].context_snippet, "Users forget passwords...");
    assert_eq!(finding.matches[1].context_snippet, "No Description available.");

    let assessment = finding.assessment.as_ref().unwrap();
    assert_eq!(assessment.level, RiskLevel::High);
    assert_eq!(assessment.kind, OverlapKind::CrossTeamConflict);
    assert_eq!(assessment.teams, vec!["TeamX", "TeamY"]);
    assert_eq!(
        assessment.action,
        "COORDINATE: TeamX, TeamY must merge or realign."
    );

    let json = serde_json::to_value(&finding).unwrap();
    assert_eq!(json["assessment"]["level"], "HIGH RISK");
    assert!(json.get("query_embedding").is_none());
}

#[test]
fn test_ingested_ticket_survives_store_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("store.json");
    let mut corpus = load_backlog(&dir);

    let store = InMemoryVectorStore::open(&snapshot, KeywordEmbedder.model_id()).unwrap();
    assert_eq!(
        populate_store(&store, &corpus, RetryPolicy::no_retry()).unwrap(),
        3
    );

    let finding = OverlapQuery::new(&corpus, query_config())
        .with_embedder(&KeywordEmbedder, RetryPolicy::no_retry())
        .with_store(&store, false, RetryPolicy::no_retry())
        .run(QueryInput::Text("Password reset via SMS"), "TeamZ")
        .unwrap();
    assert_eq!(finding.matches.len(), 2);

    let item = WorkItem::new(
        WorkItemRecord {
            id: "D".to_string(),
            team: "TeamZ".to_string(),
            summary: "Password reset via SMS".to_string(),
            description: None,
        },
        finding.query_embedding,
    );
    ingest_into_store(&store, &item, RetryPolicy::no_retry()).unwrap();
    corpus.insert(item).unwrap();
    store.save(&snapshot).unwrap();

    let reopened = InMemoryVectorStore::open(&snapshot, KeywordEmbedder.model_id()).unwrap();
    assert_eq!(reopened.len(), 4);
    let wanted = vec!["D".to_string()];
    let records = reopened.get_all(Some(wanted.as_slice())).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].metadata.team, "TeamZ");

    assert!(InMemoryVectorStore::open(&snapshot, "another-model").is_err());
}

#[test]
fn test_audit_over_file_backlog() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = load_backlog(&dir);

    let report = ClusterAuditor::new(ClusteringConfig {
        eps: 0.3,
        min_cluster_size: 2,
        ..ClusteringConfig::default()
    })
    .run(&corpus)
    .unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].member_ids(), vec!["A", "B"]);
    assert_eq!(report.noise_count(), 1);

    let findings = report.findings().unwrap();
    assert_eq!(findings[0].assessment.teams, vec!["TeamX", "TeamY"]);
}
