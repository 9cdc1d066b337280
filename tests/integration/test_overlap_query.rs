//! Real-time overlap query against hand-placed vectors.

use crate::common::{KeywordEmbedder, at_angle, keyword_corpus, record, vector_corpus};
use scopesync::config::QueryConfig;
use scopesync::overlap::populate_store;
use scopesync::vector::{VectorDimension, VectorError};
use scopesync::{
    Corpus, EmbeddingGenerator, InMemoryVectorStore, OverlapError, OverlapKind, OverlapQuery,
    QueryInput, RetryPolicy, RiskLevel,
};

fn config(k: usize, max_distance_threshold: f32) -> QueryConfig {
    QueryConfig {
        k,
        max_distance_threshold,
    }
}

/// Three items close to the x axis, seventeen far from it, inserted far
/// ones first so insertion order differs from distance order.
fn twenty_items() -> Corpus {
    let mut vectors: Vec<(String, Vec<f32>)> = (0..17)
        .map(|i| (format!("FAR-{i}"), at_angle(60.0 + 5.0 * i as f32)))
        .collect();
    vectors.push(("NEAR-15".to_string(), at_angle(15.0)));
    vectors.push(("NEAR-5".to_string(), at_angle(5.0)));
    vectors.push(("NEAR-10".to_string(), at_angle(10.0)));

    let borrowed: Vec<(&str, Vec<f32>)> = vectors
        .iter()
        .map(|(id, v)| (id.as_str(), v.clone()))
        .collect();
    vector_corpus("Nova", &borrowed)
}

#[test]
fn test_top_k_then_threshold_returns_only_close_items() {
    let corpus = twenty_items();
    let query = at_angle(0.0);

    let finding = OverlapQuery::new(&corpus, config(10, 0.1))
        .run(QueryInput::Vector(&query), "Nova")
        .unwrap();

    let ids: Vec<&str> = finding.matches.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["NEAR-5", "NEAR-10", "NEAR-15"]);
    assert!(finding.matches.iter().all(|m| m.distance <= 0.1));
    assert!(
        finding
            .matches
            .windows(2)
            .all(|pair| pair[0].distance <= pair[1].distance)
    );
}

#[test]
fn test_k_caps_matches_inside_threshold() {
    let corpus = twenty_items();
    let query = at_angle(0.0);

    let finding = OverlapQuery::new(&corpus, config(2, 0.1))
        .run(QueryInput::Vector(&query), "Nova")
        .unwrap();

    let ids: Vec<&str> = finding.matches.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["NEAR-5", "NEAR-10"]);
}

#[test]
fn test_shrinking_threshold_never_grows_results() {
    let corpus = twenty_items();
    let query = at_angle(20.0);

    let mut previous: Option<Vec<String>> = None;
    for threshold in [2.0, 1.5, 1.0, 0.5, 0.2, 0.05, 0.01, 0.0] {
        let finding = OverlapQuery::new(&corpus, config(20, threshold))
            .run(QueryInput::Vector(&query), "Nova")
            .unwrap();
        let ids: Vec<String> = finding.matches.iter().map(|m| m.id.clone()).collect();

        if let Some(previous) = &previous {
            assert!(ids.len() <= previous.len());
            assert!(ids.iter().all(|id| previous.contains(id)));
        }
        previous = Some(ids);
    }
}

#[test]
fn test_equal_distances_keep_insertion_order() {
    let corpus = vector_corpus(
        "Nova",
        &[
            ("B", vec![1.0, 0.0]),
            ("A", vec![2.0, 0.0]),
            ("C", vec![0.5, 0.0]),
        ],
    );

    let finding = OverlapQuery::new(&corpus, config(3, 0.1))
        .run(QueryInput::Vector(&[1.0, 0.0]), "Nova")
        .unwrap();
    let ids: Vec<&str> = finding.matches.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["B", "A", "C"]);
}

#[test]
fn test_same_team_matches_are_internal_redundancy() {
    let corpus = keyword_corpus(&[
        ("N-1", "Nova", "Reset password"),
        ("N-2", "Nova", "Password reset email"),
        ("A-1", "Atlas", "Billing export"),
    ]);

    let finding = OverlapQuery::new(&corpus, config(10, 0.45))
        .with_embedder(&KeywordEmbedder, RetryPolicy::no_retry())
        .run(QueryInput::Text("reset my password"), "Nova")
        .unwrap();

    let ids: Vec<&str> = finding.matches.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["N-1", "N-2"]);

    let assessment = finding.assessment.unwrap();
    assert_eq!(assessment.level, RiskLevel::Medium);
    assert_eq!(assessment.level.to_string(), "MEDIUM RISK");
    assert_eq!(assessment.kind, OverlapKind::InternalRedundancy);
    assert_eq!(assessment.teams, vec!["Nova"]);
    assert_eq!(
        assessment.action,
        "REVIEW: Nova should consolidate redundant tickets."
    );
}

#[test]
fn test_other_team_match_is_cross_team_conflict() {
    let corpus = keyword_corpus(&[
        ("N-1", "Nova", "Reset password"),
        ("A-1", "Atlas", "Password reset page"),
    ]);

    let finding = OverlapQuery::new(&corpus, config(10, 0.45))
        .with_embedder(&KeywordEmbedder, RetryPolicy::no_retry())
        .run(QueryInput::Text("reset my password"), "Nova")
        .unwrap();

    let ids: Vec<&str> = finding.matches.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["N-1", "A-1"]);

    let assessment = finding.assessment.unwrap();
    assert_eq!(assessment.level, RiskLevel::High);
    assert_eq!(assessment.level.to_string(), "HIGH RISK");
    assert_eq!(assessment.kind, OverlapKind::CrossTeamConflict);
    assert_eq!(assessment.teams, vec!["Nova", "Atlas"]);
    assert_eq!(
        assessment.action,
        "COORDINATE: Nova, Atlas must merge or realign."
    );
}

#[test]
fn test_empty_corpus_returns_no_matches() {
    let corpus = Corpus::new();
    let finding = OverlapQuery::new(&corpus, config(5, 0.45))
        .run(QueryInput::Vector(&[0.3, 0.4]), "Nova")
        .unwrap();

    assert!(!finding.has_overlap());
    assert!(finding.assessment.is_none());
}

#[test]
fn test_degenerate_parameters_are_rejected() {
    let corpus = twenty_items();
    let query = at_angle(0.0);

    let zero_k =
        OverlapQuery::new(&corpus, config(0, 0.45)).run(QueryInput::Vector(&query), "Nova");
    assert!(matches!(zero_k, Err(OverlapError::InvalidInput { .. })));

    let negative =
        OverlapQuery::new(&corpus, config(5, -0.1)).run(QueryInput::Vector(&query), "Nova");
    assert!(matches!(negative, Err(OverlapError::InvalidInput { .. })));

    let wrong_dimension = OverlapQuery::new(&corpus, config(5, 0.45))
        .run(QueryInput::Vector(&[1.0, 0.0, 0.0]), "Nova");
    assert!(matches!(
        wrong_dimension,
        Err(OverlapError::DimensionMismatch {
            expected: 2,
            actual: 3,
            ..
        })
    ));
}

/// Claims four dimensions but always answers with three.
struct ShortVectorEmbedder;

impl EmbeddingGenerator for ShortVectorEmbedder {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        Ok(texts.iter().map(|_| vec![1.0, 0.5, 0.25]).collect())
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(4).unwrap()
    }

    fn model_id(&self) -> &str {
        "short-vectors"
    }
}

#[test]
fn test_provider_with_wrong_dimension_is_embedding_error() {
    let records = vec![
        record("N-1", "Nova", "Reset password"),
        record("A-1", "Atlas", "Billing export"),
    ];

    let result = Corpus::from_records(records, &ShortVectorEmbedder, 4, RetryPolicy::no_retry());
    assert!(matches!(result, Err(OverlapError::Embedding { .. })));
}

#[test]
fn test_store_backed_query_matches_brute_force() {
    let corpus = twenty_items();
    let store = InMemoryVectorStore::new("plane");
    populate_store(&store, &corpus, RetryPolicy::no_retry()).unwrap();
    let query = at_angle(3.0);

    let direct = OverlapQuery::new(&corpus, config(10, 0.1))
        .run(QueryInput::Vector(&query), "Nova")
        .unwrap();
    let via_store = OverlapQuery::new(&corpus, config(10, 0.1))
        .with_store(&store, false, RetryPolicy::no_retry())
        .run(QueryInput::Vector(&query), "Nova")
        .unwrap();

    let direct_ids: Vec<&str> = direct.matches.iter().map(|m| m.id.as_str()).collect();
    let store_ids: Vec<&str> = via_store.matches.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(direct_ids, store_ids);
}
