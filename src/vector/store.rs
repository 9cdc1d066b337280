//! Vector store contract and the bundled in-memory implementation.
//!
//! The real-time query can delegate nearest-neighbour retrieval to any
//! [`VectorStore`]. Results must be ranked exactly like the brute-force
//! path: ascending distance, ties broken by insertion order.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::vector::distance::{DistanceMetric, validate_comparable};
use crate::vector::{CosineDistance, VectorDimension, VectorError};

/// Metadata stored next to each vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMetadata {
    pub team: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One ranked result of [`VectorStore::nearest`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoreHit {
    pub id: String,
    pub distance: f32,
    pub metadata: StoreMetadata,
}

/// One record returned by [`VectorStore::get_all`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreRecord {
    pub id: String,
    /// The embedded text (the work item summary).
    pub document: String,
    pub metadata: StoreMetadata,
}

/// Persistent or remote vector storage used to accelerate real-time queries.
pub trait VectorStore: Send + Sync {
    /// Insert or replace the vector and metadata stored under `id`.
    fn upsert(&self, id: &str, vector: &[f32], metadata: StoreMetadata)
    -> Result<(), VectorError>;

    /// The `k` stored vectors closest to `query`, nearest first.
    fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<StoreHit>, VectorError>;

    /// All records, or only those whose id is listed, in insertion order.
    fn get_all(&self, ids: Option<&[String]>) -> Result<Vec<StoreRecord>, VectorError>;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredVector {
    id: String,
    vector: Vec<f32>,
    metadata: StoreMetadata,
}

#[derive(Debug, Default)]
struct StoreState {
    dimension: Option<VectorDimension>,
    entries: Vec<StoredVector>,
    positions: HashMap<String, usize>,
}

/// On-disk form of an [`InMemoryVectorStore`].
#[derive(Debug, Serialize, Deserialize)]
struct StoreSnapshot {
    version: u32,
    model_id: String,
    entries: Vec<StoredVector>,
}

impl StoreSnapshot {
    const CURRENT_VERSION: u32 = 1;
}

/// Brute-force vector store guarded by a read-write lock.
///
/// Concurrent `nearest` calls share the read lock; `upsert` takes the
/// write lock. Can be snapshotted to a JSON file between runs.
#[derive(Debug)]
pub struct InMemoryVectorStore {
    model_id: String,
    state: RwLock<StoreState>,
}

impl InMemoryVectorStore {
    /// Creates an empty store for vectors produced by `model_id`.
    #[must_use]
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Model whose vectors this store holds.
    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Loads a snapshot, or returns an empty store when `path` does not
    /// exist yet.
    ///
    /// A snapshot written by a different model is rejected, since its
    /// vectors are not comparable with new queries.
    pub fn open(path: &Path, model_id: &str) -> Result<Self, VectorError> {
        if !path.exists() {
            debug!(path = %path.display(), "no store snapshot, starting empty");
            return Ok(Self::new(model_id));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            VectorError::StoreUnavailable(format!("cannot read '{}': {e}", path.display()))
        })?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content)
            .map_err(|e| VectorError::Serialization(format!("{}: {e}", path.display())))?;

        if snapshot.version != StoreSnapshot::CURRENT_VERSION {
            return Err(VectorError::Serialization(format!(
                "snapshot '{}' has format version {}, this build reads version {}",
                path.display(),
                snapshot.version,
                StoreSnapshot::CURRENT_VERSION
            )));
        }

        if snapshot.model_id != model_id {
            return Err(VectorError::Serialization(format!(
                "snapshot '{}' was built with model {}, expected {model_id}",
                path.display(),
                snapshot.model_id
            )));
        }

        let store = Self::new(model_id);
        for entry in snapshot.entries {
            store.upsert(&entry.id, &entry.vector, entry.metadata)?;
        }
        debug!(path = %path.display(), vectors = store.len(), "loaded store snapshot");
        Ok(store)
    }

    /// Writes the store to `path` as JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), VectorError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let snapshot = StoreSnapshot {
            version: StoreSnapshot::CURRENT_VERSION,
            model_id: self.model_id.clone(),
            entries: self.state.read().entries.clone(),
        };
        let json = serde_json::to_string(&snapshot)
            .map_err(|e| VectorError::Serialization(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl VectorStore for InMemoryVectorStore {
    fn upsert(
        &self,
        id: &str,
        vector: &[f32],
        metadata: StoreMetadata,
    ) -> Result<(), VectorError> {
        validate_comparable(vector)?;

        let mut state = self.state.write();
        let established = state.dimension;
        match established {
            Some(dimension) => dimension.validate_vector(vector)?,
            None => state.dimension = Some(VectorDimension::new(vector.len())?),
        }

        let entry = StoredVector {
            id: id.to_string(),
            vector: vector.to_vec(),
            metadata,
        };
        match state.positions.get(id).copied() {
            Some(position) => state.entries[position] = entry,
            None => {
                let position = state.entries.len();
                state.entries.push(entry);
                state.positions.insert(id.to_string(), position);
            }
        }
        Ok(())
    }

    fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<StoreHit>, VectorError> {
        let state = self.state.read();
        if let Some(dimension) = state.dimension {
            dimension.validate_vector(query)?;
        }

        let metric = CosineDistance;
        let mut ranked = state
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                metric
                    .distance(query, &entry.vector)
                    .map(|distance| (position, distance))
            })
            .collect::<Result<Vec<(usize, f32)>, VectorError>>()?;

        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        ranked.truncate(k);

        Ok(ranked
            .into_iter()
            .map(|(position, distance)| {
                let entry = &state.entries[position];
                StoreHit {
                    id: entry.id.clone(),
                    distance,
                    metadata: entry.metadata.clone(),
                }
            })
            .collect())
    }

    fn get_all(&self, ids: Option<&[String]>) -> Result<Vec<StoreRecord>, VectorError> {
        let state = self.state.read();
        Ok(state
            .entries
            .iter()
            .filter(|entry| ids.is_none_or(|ids| ids.iter().any(|id| *id == entry.id)))
            .map(|entry| StoreRecord {
                id: entry.id.clone(),
                document: entry.metadata.summary.clone(),
                metadata: entry.metadata.clone(),
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.state.read().entries.len()
    }
}
