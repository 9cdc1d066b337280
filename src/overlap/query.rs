//! Real-time overlap query.
//!
//! Ranks the corpus (or the vector store) against one new item, keeps the
//! `k` nearest and only then drops those beyond the distance threshold.
//! With more than `k` items inside the threshold the tail is not reported;
//! callers wanting every match should raise `k` or run an audit.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::QueryConfig;
use crate::corpus::{Corpus, WorkItem, context_snippet};
use crate::error::{OverlapError, OverlapResult};
use crate::overlap::group::{GroupMember, OverlapGroup};
use crate::overlap::risk::RiskAssessment;
use crate::vector::{
    CosineDistance, DistanceMetric, EmbeddingGenerator, RetryPolicy, StoreHit, StoreMetadata,
    VectorError, VectorStore, similarity_from_distance, validate_comparable,
};

/// What is being checked for overlap.
#[derive(Debug, Clone, Copy)]
pub enum QueryInput<'q> {
    /// Summary text, embedded with the configured generator.
    Text(&'q str),
    /// A precomputed embedding from the same model as the corpus.
    Vector(&'q [f32]),
}

/// One candidate overlap, nearest first in [`QueryFinding::matches`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapMatch {
    pub id: String,
    pub team: String,
    pub summary: String,
    pub similarity: f32,
    pub distance: f32,
    pub context_snippet: String,
}

/// Result of a real-time query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryFinding {
    pub query_team: String,
    /// `1 - max_distance_threshold` of the run.
    pub similarity_threshold: f32,
    pub matches: Vec<OverlapMatch>,
    /// `None` when nothing fell under the threshold.
    pub assessment: Option<RiskAssessment>,
    #[serde(skip)]
    pub query_embedding: Vec<f32>,
}

impl QueryFinding {
    pub fn has_overlap(&self) -> bool {
        !self.matches.is_empty()
    }

    /// The matches as an overlap group including the query team.
    pub fn group(&self) -> OverlapGroup {
        OverlapGroup::from_query(
            self.query_team.clone(),
            self.matches
                .iter()
                .map(|m| GroupMember {
                    id: m.id.clone(),
                    team: m.team.clone(),
                    summary: m.summary.clone(),
                })
                .collect(),
        )
    }
}

#[derive(Clone, Copy)]
struct StoreBackend<'a> {
    store: &'a dyn VectorStore,
    fallback_to_brute_force: bool,
    retry: RetryPolicy,
}

/// Real-time overlap query over a read-only corpus.
///
/// Never mutates the corpus or the store; adding the new item is a
/// separate step (see [`ingest_into_store`] and `Corpus::insert`).
pub struct OverlapQuery<'a> {
    corpus: &'a Corpus,
    config: QueryConfig,
    embedder: Option<&'a dyn EmbeddingGenerator>,
    embed_retry: RetryPolicy,
    store: Option<StoreBackend<'a>>,
}

impl<'a> OverlapQuery<'a> {
    pub fn new(corpus: &'a Corpus, config: QueryConfig) -> Self {
        Self {
            corpus,
            config,
            embedder: None,
            embed_retry: RetryPolicy::default(),
            store: None,
        }
    }

    /// Generator used for [`QueryInput::Text`].
    pub fn with_embedder(
        mut self,
        embedder: &'a dyn EmbeddingGenerator,
        retry: RetryPolicy,
    ) -> Self {
        self.embedder = Some(embedder);
        self.embed_retry = retry;
        self
    }

    /// Delegates nearest-neighbour retrieval to `store`.
    ///
    /// When the store fails after `retry`, the query falls back to the
    /// in-memory corpus if `fallback_to_brute_force` is set and fails with
    /// `StoreUnavailable` otherwise.
    pub fn with_store(
        mut self,
        store: &'a dyn VectorStore,
        fallback_to_brute_force: bool,
        retry: RetryPolicy,
    ) -> Self {
        self.store = Some(StoreBackend {
            store,
            fallback_to_brute_force,
            retry,
        });
        self
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Runs the query for an item owned by `query_team`.
    pub fn run(&self, input: QueryInput<'_>, query_team: &str) -> OverlapResult<QueryFinding> {
        self.config.validate()?;

        let query_embedding = self.resolve(input)?;
        if let Some(dimension) = self.corpus.dimension()
            && dimension.get() != query_embedding.len()
        {
            return Err(OverlapError::DimensionMismatch {
                id: "<query>".to_string(),
                expected: dimension.get(),
                actual: query_embedding.len(),
            });
        }
        validate_comparable(&query_embedding)
            .map_err(|e| OverlapError::invalid_input(format!("query embedding is unusable: {e}")))?;

        let candidates = match self.store {
            Some(backend) => self.nearest_from_store(backend, &query_embedding)?,
            None => self.nearest_brute_force(&query_embedding)?,
        };

        let threshold = self.config.max_distance_threshold;
        let matches: Vec<OverlapMatch> = candidates
            .into_iter()
            .filter(|m| m.distance <= threshold)
            .collect();
        debug!(
            team = query_team,
            matches = matches.len(),
            k = self.config.k,
            threshold,
            "overlap query finished"
        );

        let mut finding = QueryFinding {
            query_team: query_team.to_string(),
            similarity_threshold: self.config.similarity_threshold(),
            matches,
            assessment: None,
            query_embedding,
        };
        if finding.has_overlap() {
            finding.assessment = Some(finding.group().assess()?);
        }
        Ok(finding)
    }

    fn resolve(&self, input: QueryInput<'_>) -> OverlapResult<Vec<f32>> {
        match input {
            QueryInput::Vector(vector) => Ok(vector.to_vec()),
            QueryInput::Text(text) => {
                let embedder = self.embedder.ok_or_else(|| {
                    OverlapError::invalid_input("text query needs an embedding generator")
                })?;
                self.embed_retry
                    .run("query embedding", VectorError::is_transient, || {
                        embedder.embed(text)
                    })
                    .map_err(|e| OverlapError::Embedding {
                        subject: "query".to_string(),
                        reason: e.to_string(),
                    })
            }
        }
    }

    /// The `k` nearest corpus items, ties in insertion order.
    fn nearest_brute_force(&self, query: &[f32]) -> OverlapResult<Vec<OverlapMatch>> {
        let metric = CosineDistance;
        let mut ranked = self
            .corpus
            .items()
            .par_iter()
            .enumerate()
            .map(|(position, item)| {
                metric
                    .distance(query, item.embedding())
                    .map(|distance| (position, distance))
            })
            .collect::<Result<Vec<(usize, f32)>, VectorError>>()?;

        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        ranked.truncate(self.config.k);

        let items = self.corpus.items();
        Ok(ranked
            .into_iter()
            .map(|(position, distance)| match_from_item(&items[position], distance))
            .collect())
    }

    fn nearest_from_store(
        &self,
        backend: StoreBackend<'_>,
        query: &[f32],
    ) -> OverlapResult<Vec<OverlapMatch>> {
        let result = backend
            .retry
            .run("vector store query", VectorError::is_transient, || {
                backend.store.nearest(query, self.config.k)
            });

        match result {
            Ok(hits) => Ok(hits.into_iter().map(match_from_hit).collect()),
            Err(e) if backend.fallback_to_brute_force => {
                warn!(error = %e, "vector store unavailable, falling back to in-memory search");
                self.nearest_brute_force(query)
            }
            Err(e) => Err(OverlapError::StoreUnavailable {
                reason: e.to_string(),
            }),
        }
    }
}

fn match_from_item(item: &WorkItem, distance: f32) -> OverlapMatch {
    OverlapMatch {
        id: item.id().to_string(),
        team: item.team().to_string(),
        summary: item.summary().to_string(),
        similarity: similarity_from_distance(distance),
        distance,
        context_snippet: item.context_snippet(),
    }
}

fn match_from_hit(hit: StoreHit) -> OverlapMatch {
    OverlapMatch {
        context_snippet: context_snippet(hit.metadata.description.as_deref()),
        similarity: similarity_from_distance(hit.distance),
        distance: hit.distance,
        id: hit.id,
        team: hit.metadata.team,
        summary: hit.metadata.summary,
    }
}

fn metadata_for(item: &WorkItem) -> StoreMetadata {
    StoreMetadata {
        team: item.team().to_string(),
        summary: item.summary().to_string(),
        description: item.description().map(str::to_string),
    }
}

/// Upserts one item into the store, retrying per `retry`.
pub fn ingest_into_store(
    store: &dyn VectorStore,
    item: &WorkItem,
    retry: RetryPolicy,
) -> OverlapResult<()> {
    retry
        .run("vector store upsert", VectorError::is_transient, || {
            store.upsert(item.id(), item.embedding(), metadata_for(item))
        })
        .map_err(|e| match e {
            VectorError::DimensionMismatch { expected, actual } => OverlapError::DimensionMismatch {
                id: item.id().to_string(),
                expected,
                actual,
            },
            other => OverlapError::StoreUnavailable {
                reason: other.to_string(),
            },
        })
}

/// Stores an item that is new to `corpus`.
///
/// An id already present in the corpus is rejected before the store is
/// touched.
pub fn ingest_new_item(
    corpus: &Corpus,
    store: &dyn VectorStore,
    item: &WorkItem,
    retry: RetryPolicy,
) -> OverlapResult<()> {
    if corpus.get(item.id()).is_some() {
        return Err(OverlapError::invalid_input(format!(
            "work item '{}' already exists in the backlog",
            item.id()
        )));
    }
    ingest_into_store(store, item, retry)
}

/// Upserts every corpus item, returning how many were written.
pub fn populate_store(
    store: &dyn VectorStore,
    corpus: &Corpus,
    retry: RetryPolicy,
) -> OverlapResult<usize> {
    for item in corpus.iter() {
        ingest_into_store(store, item, retry)?;
    }
    debug!(items = corpus.len(), stored = store.len(), "store populated");
    Ok(corpus.len())
}
