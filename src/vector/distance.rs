//! Distance engine shared by the real-time query and the batch auditor.
//!
//! The clustering and ranking code only sees the [`DistanceMetric`] trait,
//! so the metric can be swapped without touching classification logic.
//!
//! # Scaling
//! A query against N items costs O(N * D). Density clustering needs every
//! pairwise distance, O(N^2 * D); no index or approximation is used, so this
//! is the dominant cost of an audit and the practical size limit of a run.

use crate::vector::types::{MAX_COSINE_DISTANCE, VectorError};

/// A symmetric, bounded distance between two embeddings.
///
/// Implementations must be deterministic and free of side effects so that
/// they can be evaluated from any number of worker threads.
pub trait DistanceMetric: Send + Sync {
    /// Distance between `a` and `b`; `0.0` means identical.
    fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32, VectorError>;

    /// Short metric name for logs and reports.
    fn name(&self) -> &'static str;
}

/// Cosine distance: `1 - (a·b) / (‖a‖·‖b‖)`, clamped to `[0, 2]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineDistance;

impl DistanceMetric for CosineDistance {
    fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32, VectorError> {
        cosine_distance(a, b)
    }

    fn name(&self) -> &'static str {
        "cosine"
    }
}

/// Computes cosine distance between two vectors.
///
/// Fails with [`VectorError::ZeroNorm`] instead of dividing by zero, and
/// with [`VectorError::DimensionMismatch`] when the lengths differ.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Result<f32, VectorError> {
    if a.len() != b.len() {
        return Err(VectorError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(VectorError::ZeroNorm);
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !similarity.is_finite() {
        return Err(VectorError::NonFinite);
    }

    // Rounding can push the ratio slightly outside [-1, 1]
    Ok((1.0 - similarity).clamp(0.0, MAX_COSINE_DISTANCE))
}

/// Converts a distance back to the similarity shown in reports.
#[must_use]
pub fn similarity_from_distance(distance: f32) -> f32 {
    1.0 - distance
}

/// Checks that a vector can take part in cosine comparisons.
pub fn validate_comparable(vector: &[f32]) -> Result<(), VectorError> {
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(VectorError::NonFinite);
    }
    if vector.iter().all(|v| *v == 0.0) {
        return Err(VectorError::ZeroNorm);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-6;

    #[test]
    fn test_identical_vectors() {
        let a = vec![1.0, 2.0, 3.0];
        assert!(cosine_distance(&a, &a).unwrap() < TOLERANCE);
    }

    #[test]
    fn test_orthogonal_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!((cosine_distance(&a, &b).unwrap() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_opposite_vectors() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-1.0, -2.0, -3.0];
        let d = cosine_distance(&a, &b).unwrap();
        assert!((d - 2.0).abs() < TOLERANCE);
        assert!(d <= MAX_COSINE_DISTANCE);
    }

    #[test]
    fn test_magnitude_is_ignored() {
        let a = vec![1.0, 1.0, 0.0];
        let b = vec![10.0, 10.0, 0.0];
        assert!(cosine_distance(&a, &b).unwrap() < TOLERANCE);
    }

    #[test]
    fn test_zero_norm_fails() {
        let a = vec![1.0, 2.0, 3.0];
        let zero = vec![0.0, 0.0, 0.0];
        assert!(matches!(
            cosine_distance(&a, &zero),
            Err(VectorError::ZeroNorm)
        ));
        assert!(matches!(
            cosine_distance(&zero, &a),
            Err(VectorError::ZeroNorm)
        ));
    }

    #[test]
    fn test_dimension_mismatch_fails() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        assert!(matches!(
            cosine_distance(&a, &b),
            Err(VectorError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_metric_bounds_and_symmetry() {
        let vectors = [
            vec![0.3, -0.7, 0.2, 0.9],
            vec![-0.1, 0.4, 0.8, -0.5],
            vec![1.0, 0.0, 0.0, 0.0],
            vec![-0.6, -0.6, 0.1, 0.2],
            vec![0.25, 0.25, 0.25, 0.25],
        ];
        let metric = CosineDistance;

        for a in &vectors {
            assert!(metric.distance(a, a).unwrap() < TOLERANCE);
            for b in &vectors {
                let ab = metric.distance(a, b).unwrap();
                let ba = metric.distance(b, a).unwrap();
                assert!((0.0..=2.0).contains(&ab));
                assert_eq!(ab, ba);
            }
        }
    }

    #[test]
    fn test_validate_comparable() {
        assert!(validate_comparable(&[0.0, 1.0]).is_ok());
        assert!(matches!(
            validate_comparable(&[0.0, 0.0]),
            Err(VectorError::ZeroNorm)
        ));
        assert!(matches!(
            validate_comparable(&[f32::NAN, 1.0]),
            Err(VectorError::NonFinite)
        ));
    }

    #[test]
    fn test_similarity_from_distance() {
        assert!((similarity_from_distance(0.45) - 0.55).abs() < TOLERANCE);
    }
}
