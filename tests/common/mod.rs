//! Shared fixtures for the integration tests.

use scopesync::vector::{VectorDimension, VectorError};
use scopesync::{Corpus, EmbeddingGenerator, RetryPolicy, WorkItem, WorkItemRecord};

/// Keyword embedder: one slot per known topic plus a constant slot so no
/// vector is ever zero. Texts sharing the same topics embed identically.
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    const TOPICS: &'static [&'static str] =
        &["password", "reset", "billing", "export", "login", "profile"];
}

impl EmbeddingGenerator for KeywordEmbedder {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let mut embedding: Vec<f32> = Self::TOPICS
                    .iter()
                    .map(|topic| if lower.contains(topic) { 1.0 } else { 0.0 })
                    .collect();
                embedding.push(0.1);
                let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
                embedding.iter().map(|x| x / norm).collect()
            })
            .collect())
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(Self::TOPICS.len() + 1).unwrap()
    }

    fn model_id(&self) -> &str {
        "keyword-test"
    }
}

pub fn record(id: &str, team: &str, summary: &str) -> WorkItemRecord {
    WorkItemRecord {
        id: id.to_string(),
        team: team.to_string(),
        summary: summary.to_string(),
        description: None,
    }
}

/// Builds a corpus through the keyword embedder.
pub fn keyword_corpus(items: &[(&str, &str, &str)]) -> Corpus {
    let records = items
        .iter()
        .map(|(id, team, summary)| record(id, team, summary))
        .collect();
    Corpus::from_records(records, &KeywordEmbedder, 4, RetryPolicy::no_retry()).unwrap()
}

/// Unit vector in the plane at `degrees` from the x axis.
pub fn at_angle(degrees: f32) -> Vec<f32> {
    let radians = degrees.to_radians();
    vec![radians.cos(), radians.sin()]
}

/// Builds a corpus from explicit vectors, all owned by `team`.
pub fn vector_corpus(team: &str, vectors: &[(&str, Vec<f32>)]) -> Corpus {
    let mut corpus = Corpus::new();
    for (id, vector) in vectors {
        corpus
            .insert(WorkItem::new(record(id, team, id), vector.clone()))
            .unwrap();
    }
    corpus
}
