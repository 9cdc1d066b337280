//! Work items and the corpus they live in.
//!
//! A [`Corpus`] is built once per run and then shared read-only by the
//! query and audit paths. Every item carries an embedding of the same
//! dimension; the first insert fixes it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{OverlapError, OverlapResult};
use crate::vector::{
    EmbeddingGenerator, RetryPolicy, VectorDimension, VectorError, validate_comparable,
};

/// Shown in place of a context snippet when an item has no description.
pub const NO_DESCRIPTION: &str = "No Description available.";

/// A work item as delivered by a record source, before embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemRecord {
    #[serde(alias = "JIRA_ID", alias = "ID")]
    pub id: String,
    #[serde(alias = "TEAM")]
    pub team: String,
    #[serde(alias = "SUMMARY")]
    pub summary: String,
    #[serde(default, alias = "DESCRIPTION")]
    pub description: Option<String>,
}

/// A ticket with its summary embedding. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    id: String,
    team: String,
    summary: String,
    description: Option<String>,
    embedding: Vec<f32>,
}

impl WorkItem {
    pub fn new(record: WorkItemRecord, embedding: Vec<f32>) -> Self {
        Self {
            id: record.id,
            team: record.team,
            summary: record.summary,
            description: record
                .description
                .filter(|description| !description.trim().is_empty()),
            embedding,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    /// First sentence of the description, for human review.
    pub fn context_snippet(&self) -> String {
        context_snippet(self.description())
    }
}

/// First sentence of `description` followed by `...`, or
/// [`NO_DESCRIPTION`] when there is nothing to show.
pub fn context_snippet(description: Option<&str>) -> String {
    let Some(text) = description.map(str::trim).filter(|t| !t.is_empty()) else {
        return NO_DESCRIPTION.to_string();
    };
    let sentence = text.split('.').next().unwrap_or(text).trim();
    format!("{sentence}...")
}

/// Ordered collection of work items keyed by id.
#[derive(Debug, Default)]
pub struct Corpus {
    items: Vec<WorkItem>,
    index: HashMap<String, usize>,
    dimension: Option<VectorDimension>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item.
    ///
    /// Rejects duplicate ids, zero-norm or non-finite embeddings, and
    /// embeddings whose dimension differs from the items already held.
    pub fn insert(&mut self, item: WorkItem) -> OverlapResult<()> {
        if self.index.contains_key(item.id()) {
            return Err(OverlapError::invalid_input(format!(
                "duplicate work item id '{}'",
                item.id()
            )));
        }

        validate_comparable(&item.embedding).map_err(|e| {
            OverlapError::invalid_input(format!("embedding of '{}' is unusable: {e}", item.id))
        })?;

        match self.dimension {
            Some(dimension) if dimension.get() != item.embedding.len() => {
                return Err(OverlapError::DimensionMismatch {
                    id: item.id.clone(),
                    expected: dimension.get(),
                    actual: item.embedding.len(),
                });
            }
            Some(_) => {}
            None => self.dimension = Some(VectorDimension::new(item.embedding.len())?),
        }

        self.index.insert(item.id.clone(), self.items.len());
        self.items.push(item);
        Ok(())
    }

    /// Embeds `records` in batches of `batch_size` and builds a corpus in
    /// record order.
    ///
    /// The first batch that still fails after `retry` is exhausted aborts
    /// the whole load; no partial corpus is returned. Vectors whose length
    /// differs from the generator's declared dimension are an embedding
    /// failure.
    pub fn from_records(
        records: Vec<WorkItemRecord>,
        generator: &dyn EmbeddingGenerator,
        batch_size: usize,
        retry: RetryPolicy,
    ) -> OverlapResult<Self> {
        Self::from_records_with_progress(records, generator, batch_size, retry, |_| {})
    }

    /// Like [`Corpus::from_records`], calling `on_batch` with the number of
    /// records embedded after each batch.
    pub fn from_records_with_progress<F>(
        records: Vec<WorkItemRecord>,
        generator: &dyn EmbeddingGenerator,
        batch_size: usize,
        retry: RetryPolicy,
        mut on_batch: F,
    ) -> OverlapResult<Self>
    where
        F: FnMut(usize),
    {
        if batch_size == 0 {
            return Err(OverlapError::invalid_input("batch_size must be positive"));
        }

        let mut corpus = Self::new();
        let total = records.len();
        let mut records = records.into_iter().peekable();
        let mut offset = 0;

        while records.peek().is_some() {
            let batch: Vec<WorkItemRecord> = records.by_ref().take(batch_size).collect();
            let texts: Vec<&str> = batch.iter().map(|r| r.summary.as_str()).collect();
            let subject = format!("items {}..{} of {total}", offset + 1, offset + batch.len());

            let embeddings = retry
                .run(&subject, VectorError::is_transient, || {
                    generator.generate_embeddings(&texts)
                })
                .map_err(|e| OverlapError::Embedding {
                    subject: subject.clone(),
                    reason: e.to_string(),
                })?;
            if embeddings.len() != batch.len() {
                return Err(OverlapError::Embedding {
                    subject,
                    reason: format!(
                        "provider returned {} vectors for {} texts",
                        embeddings.len(),
                        batch.len()
                    ),
                });
            }
            let declared = generator.dimension().get();
            if let Some(odd) = embeddings.iter().find(|e| e.len() != declared) {
                return Err(OverlapError::Embedding {
                    subject,
                    reason: format!(
                        "provider returned a {}-dimensional vector, declared {declared}",
                        odd.len()
                    ),
                });
            }
            debug!(batch = %subject, "embedded batch");

            offset += batch.len();
            let embedded = batch.len();
            for (record, embedding) in batch.into_iter().zip(embeddings) {
                corpus.insert(WorkItem::new(record, embedding))?;
            }
            on_batch(embedded);
        }

        info!(items = corpus.len(), model = generator.model_id(), "corpus built");
        Ok(corpus)
    }

    pub fn get(&self, id: &str) -> Option<&WorkItem> {
        self.index.get(id).map(|&position| &self.items[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkItem> {
        self.items.iter()
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    /// Borrowed embeddings in corpus order.
    pub fn embeddings(&self) -> Vec<&[f32]> {
        self.items.iter().map(WorkItem::embedding).collect()
    }

    /// Dimension shared by every embedding, once the first item is in.
    pub fn dimension(&self) -> Option<VectorDimension> {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
