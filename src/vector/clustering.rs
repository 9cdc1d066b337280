//! Density-based clustering (DBSCAN) over an arbitrary distance metric.
//!
//! # Algorithm Details
//! - Neighbourhood: every other point within `eps` (inclusive)
//! - Core point: at least `min_cluster_size - 1` neighbours
//! - Clusters grow from core points in input order; border points join the
//!   first cluster that reaches them
//! - Points reachable from no core point are labelled noise
//!
//! # Performance Characteristics
//! - O(n^2 * d) distance evaluations, computed in parallel with rayon
//! - O(n * avg_neighbours) memory for the neighbour lists
//!
//! Border points within `eps` of core points from two different clusters
//! are order-sensitive: they join whichever cluster is discovered first.
//! Given the same input order and parameters the result is identical.

use std::collections::VecDeque;

use rayon::prelude::*;
use thiserror::Error;

use crate::vector::distance::DistanceMetric;
use crate::vector::types::{ClusterId, ClusterLabel, VectorError};

/// Parameters of a density clustering run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbscanParams {
    /// Maximum distance for two points to be neighbours.
    pub eps: f32,
    /// Minimum number of points (including the core point itself) that
    /// form a cluster.
    pub min_cluster_size: usize,
}

impl DbscanParams {
    pub fn new(eps: f32, min_cluster_size: usize) -> Result<Self, ClusteringError> {
        let params = Self {
            eps,
            min_cluster_size,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ClusteringError> {
        if !self.eps.is_finite() || self.eps < 0.0 {
            return Err(ClusteringError::InvalidEps(self.eps));
        }
        if self.min_cluster_size < 2 {
            return Err(ClusteringError::InvalidMinClusterSize(
                self.min_cluster_size,
            ));
        }
        Ok(())
    }
}

/// Result of a DBSCAN run, one label per input vector.
#[derive(Debug, Clone, PartialEq)]
pub struct DbscanResult {
    /// Label for each input vector, in input order.
    pub labels: Vec<ClusterLabel>,

    /// Number of clusters found; ids are `0..cluster_count`.
    pub cluster_count: usize,

    /// Number of core points.
    pub core_points: usize,
}

impl DbscanResult {
    /// Number of points labelled noise.
    #[must_use]
    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_noise()).count()
    }
}

/// Errors that can occur during clustering operations.
#[derive(Error, Debug)]
pub enum ClusteringError {
    #[error("Invalid eps: {0}\nSuggestion: Use a finite, non-negative distance (cosine range is 0.0 to 2.0)")]
    InvalidEps(f32),

    #[error(
        "Invalid minimum cluster size: {0}\nSuggestion: An overlap needs at least 2 items, use min_cluster_size >= 2"
    )]
    InvalidMinClusterSize(usize),

    #[error(
        "Dimension mismatch in vectors: expected {expected}, got {actual}\nSuggestion: Ensure all vectors come from the same embedding model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector operation error: {0}")]
    VectorError(#[from] VectorError),
}

/// Runs DBSCAN over `vectors` using `metric`.
///
/// An empty input yields an empty result, not an error.
#[must_use = "clustering results should be used or the computation is wasted"]
pub fn dbscan<M>(
    vectors: &[&[f32]],
    params: &DbscanParams,
    metric: &M,
) -> Result<DbscanResult, ClusteringError>
where
    M: DistanceMetric + ?Sized,
{
    params.validate()?;

    if vectors.is_empty() {
        return Ok(DbscanResult {
            labels: Vec::new(),
            cluster_count: 0,
            core_points: 0,
        });
    }

    let dimension = vectors[0].len();
    if let Some(odd) = vectors.iter().find(|v| v.len() != dimension) {
        return Err(ClusteringError::DimensionMismatch {
            expected: dimension,
            actual: odd.len(),
        });
    }

    let neighbours = neighbourhoods(vectors, params.eps, metric)?;
    let is_core: Vec<bool> = neighbours
        .iter()
        .map(|n| n.len() + 1 >= params.min_cluster_size)
        .collect();

    let mut assigned: Vec<Option<ClusterId>> = vec![None; vectors.len()];
    let mut next_id = 0u32;

    for seed in 0..vectors.len() {
        if assigned[seed].is_some() || !is_core[seed] {
            continue;
        }

        let cluster = ClusterId::new(next_id);
        next_id += 1;
        assigned[seed] = Some(cluster);

        let mut frontier = VecDeque::from([seed]);
        while let Some(point) = frontier.pop_front() {
            // Border points are absorbed but do not extend the cluster
            if !is_core[point] {
                continue;
            }
            for &neighbour in &neighbours[point] {
                if assigned[neighbour].is_none() {
                    assigned[neighbour] = Some(cluster);
                    frontier.push_back(neighbour);
                }
            }
        }
    }

    let labels = assigned
        .into_iter()
        .map(|a| a.map_or(ClusterLabel::Noise, ClusterLabel::Cluster))
        .collect();

    Ok(DbscanResult {
        labels,
        cluster_count: next_id as usize,
        core_points: is_core.iter().filter(|c| **c).count(),
    })
}

/// Finds, for every point, the indices of all other points within `eps`.
///
/// Each row is computed independently on the rayon pool; rows are sorted
/// by index so the result does not depend on scheduling.
fn neighbourhoods<M>(
    vectors: &[&[f32]],
    eps: f32,
    metric: &M,
) -> Result<Vec<Vec<usize>>, VectorError>
where
    M: DistanceMetric + ?Sized,
{
    (0..vectors.len())
        .into_par_iter()
        .map(|i| -> Result<Vec<usize>, VectorError> {
            let mut row = Vec::new();
            for (j, other) in vectors.iter().enumerate() {
                if i == j {
                    continue;
                }
                if metric.distance(vectors[i], other)? <= eps {
                    row.push(j);
                }
            }
            Ok(row)
        })
        .collect()
}
