// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Precision, recall and F-score from nearest-neighbor distance histograms

use crate::error::EvalError;
use crate::geometry::{nearest_distances, PointCloud};
use serde::{Deserialize, Serialize};

/// Number of histogram bins per threshold length
pub const BINS_PER_THRESHOLD: usize = 100;

/// Cumulative distance distribution as `(upper bin edge, fraction)` pairs.
///
/// `fraction` is the share of all distances at or below `edge`, so the last
/// value is below 1.0 whenever some distances fall past the plotted range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CumulativeHistogram {
    pub bins: Vec<(f32, f32)>,
}

impl CumulativeHistogram {
    /// Histogram of a set with nothing to describe
    pub fn degenerate() -> Self {
        Self {
            bins: vec![(0.0, 0.0)],
        }
    }

    /// Bins of width `threshold / 100` covering `[0, threshold * stretch)`
    pub fn from_distances(distances: &[f32], threshold: f32, stretch: f32) -> Self {
        if distances.is_empty() {
            return Self::degenerate();
        }

        let edges = bin_edges(threshold, stretch);
        if edges.len() < 2 {
            return Self::degenerate();
        }

        let mut sorted: Vec<f32> = distances.to_vec();
        sorted.sort_by(f32::total_cmp);
        let total = sorted.len() as f32;

        let bins = edges[1..]
            .iter()
            .map(|&edge| {
                let below = sorted.partition_point(|d| *d <= edge);
                (edge, below as f32 / total)
            })
            .collect();

        Self { bins }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn edges(&self) -> impl Iterator<Item = f32> + '_ {
        self.bins.iter().map(|(edge, _)| *edge)
    }

    pub fn fractions(&self) -> impl Iterator<Item = f32> + '_ {
        self.bins.iter().map(|(_, fraction)| *fraction)
    }
}

/// Edges `0, step, 2*step, ...` strictly below `threshold * stretch`
fn bin_edges(threshold: f32, stretch: f32) -> Vec<f32> {
    let step = threshold as f64 / BINS_PER_THRESHOLD as f64;
    let count = (BINS_PER_THRESHOLD as f64 * stretch as f64 - 1e-9).ceil().max(0.0) as usize;
    (0..count).map(|k| (k as f64 * step) as f32).collect()
}

/// Share of `distances` that are `<= threshold`; 0 for an empty set
pub fn fraction_within(distances: &[f32], threshold: f32) -> f32 {
    if distances.is_empty() {
        return 0.0;
    }
    let hits = distances.iter().filter(|d| **d <= threshold).count();
    hits as f32 / distances.len() as f32
}

/// Harmonic mean of precision and recall, 0 when both are 0
pub fn fscore(precision: f32, recall: f32) -> f32 {
    let sum = precision + recall;
    if sum <= 0.0 {
        0.0
    } else {
        2.0 * precision * recall / sum
    }
}

/// Outcome of one precision/recall evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecisionRecall {
    pub threshold: f32,
    pub precision: f32,
    pub recall: f32,
    pub fscore: f32,
    /// Distribution of reconstruction-to-ground-truth distances
    pub precision_histogram: CumulativeHistogram,
    /// Distribution of ground-truth-to-reconstruction distances
    pub recall_histogram: CumulativeHistogram,
}

pub(crate) fn check_parameters(threshold: f32, plot_stretch: f32) -> Result<(), EvalError> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(EvalError::invalid(
            "threshold",
            format!("must be a positive number, got {}", threshold),
        ));
    }
    if !plot_stretch.is_finite() || plot_stretch <= 0.0 {
        return Err(EvalError::invalid(
            "plot_stretch",
            format!("must be a positive number, got {}", plot_stretch),
        ));
    }
    Ok(())
}

/// Score two distance sets against `threshold`.
///
/// `recon_to_gt` drives precision and `gt_to_recon` drives recall. If either
/// set is empty every score is 0 and both histograms are degenerate.
pub fn precision_recall(
    recon_to_gt: &[f32],
    gt_to_recon: &[f32],
    threshold: f32,
    plot_stretch: f32,
) -> Result<PrecisionRecall, EvalError> {
    check_parameters(threshold, plot_stretch)?;

    if recon_to_gt.is_empty() || gt_to_recon.is_empty() {
        return Ok(PrecisionRecall {
            threshold,
            precision: 0.0,
            recall: 0.0,
            fscore: 0.0,
            precision_histogram: CumulativeHistogram::degenerate(),
            recall_histogram: CumulativeHistogram::degenerate(),
        });
    }

    let precision = fraction_within(recon_to_gt, threshold);
    let recall = fraction_within(gt_to_recon, threshold);

    Ok(PrecisionRecall {
        threshold,
        precision,
        recall,
        fscore: fscore(precision, recall),
        precision_histogram: CumulativeHistogram::from_distances(
            recon_to_gt,
            threshold,
            plot_stretch,
        ),
        recall_histogram: CumulativeHistogram::from_distances(gt_to_recon, threshold, plot_stretch),
    })
}

/// Downsampled clouds, their distances, and the resulting scores
#[derive(Debug, Clone)]
pub struct HistogramEvaluation {
    pub reconstruction: PointCloud,
    pub ground_truth: PointCloud,
    pub recon_to_gt: Vec<f32>,
    pub gt_to_recon: Vec<f32>,
    pub scores: PrecisionRecall,
}

/// Voxel-downsample both clouds, measure distances both ways and score them
pub fn evaluate_histogram(
    reconstruction: &PointCloud,
    ground_truth: &PointCloud,
    voxel_size: f32,
    threshold: f32,
    plot_stretch: f32,
) -> Result<HistogramEvaluation, EvalError> {
    check_parameters(threshold, plot_stretch)?;
    if voxel_size.is_nan() {
        return Err(EvalError::invalid("voxel_size", "must be a number"));
    }

    let reconstruction = reconstruction.voxel_down_sample(voxel_size);
    let ground_truth = ground_truth.voxel_down_sample(voxel_size);
    tracing::debug!(
        reconstruction = reconstruction.len(),
        ground_truth = ground_truth.len(),
        voxel_size,
        "downsampled point sets"
    );

    let recon_to_gt = nearest_distances(&reconstruction.points, &ground_truth.points);
    let gt_to_recon = nearest_distances(&ground_truth.points, &reconstruction.points);
    let scores = precision_recall(&recon_to_gt, &gt_to_recon, threshold, plot_stretch)?;

    Ok(HistogramEvaluation {
        reconstruction,
        ground_truth,
        recon_to_gt,
        gt_to_recon,
        scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    fn grid(offset: Vector3<f32>) -> PointCloud {
        let mut points = Vec::new();
        for i in 0..10 {
            for j in 0..10 {
                points.push(Point3::new(i as f32 * 0.2, j as f32 * 0.2, 0.0) + offset);
            }
        }
        PointCloud::new(points)
    }

    #[test]
    fn test_identical_sets_score_one() {
        let cloud = grid(Vector3::zeros());
        for threshold in [1e-4, 0.01, 0.1, 5.0] {
            let eval = evaluate_histogram(&cloud, &cloud, 0.05, threshold, 3.0).unwrap();
            assert_eq!(eval.scores.precision, 1.0);
            assert_eq!(eval.scores.recall, 1.0);
            assert_eq!(eval.scores.fscore, 1.0);
        }
    }

    #[test]
    fn test_disjoint_sets_score_zero() {
        let a = grid(Vector3::zeros());
        let b = grid(Vector3::new(0.0, 0.0, 1.0));
        let eval = evaluate_histogram(&a, &b, 0.05, 0.1, 3.0).unwrap();

        assert_eq!(eval.scores.precision, 0.0);
        assert_eq!(eval.scores.recall, 0.0);
        assert_eq!(eval.scores.fscore, 0.0);
    }

    #[test]
    fn test_partial_overlap() {
        // Half the reconstruction is a far-away outlier cluster
        let recon = [0.0, 0.05, 10.0, 10.05];
        let gt = [0.0, 0.05];
        let result = precision_recall(&recon, &gt, 0.1, 3.0).unwrap();

        assert_relative_eq!(result.precision, 0.5);
        assert_relative_eq!(result.recall, 1.0);
        assert_relative_eq!(result.fscore, 2.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(fraction_within(&[0.1, 0.2], 0.1), 0.5);
    }

    #[test]
    fn test_empty_sets_are_guarded() {
        let result = precision_recall(&[], &[0.0], 0.1, 3.0).unwrap();
        assert_eq!(result.fscore, 0.0);
        assert_eq!(result.precision_histogram, CumulativeHistogram::degenerate());

        let eval = evaluate_histogram(&PointCloud::default(), &grid(Vector3::zeros()), 0.05, 0.1, 3.0)
            .unwrap();
        assert_eq!(eval.scores.precision, 0.0);
        assert_eq!(eval.scores.recall, 0.0);
    }

    #[test]
    fn test_fscore_zero_when_both_zero() {
        assert_eq!(fscore(0.0, 0.0), 0.0);
        assert_relative_eq!(fscore(0.5, 1.0), 2.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_histogram_edges_and_monotonicity() {
        let distances: Vec<f32> = (0..1000).map(|i| i as f32 * 0.0005).collect();
        let hist = CumulativeHistogram::from_distances(&distances, 0.1, 3.0);

        // arange(0, 0.3, 0.001) has 300 edges, hence 299 bins
        assert_eq!(hist.len(), 299);
        assert_relative_eq!(hist.bins[0].0, 0.001, epsilon = 1e-6);
        assert_relative_eq!(hist.bins.last().unwrap().0, 0.299, epsilon = 1e-6);

        let fractions: Vec<f32> = hist.fractions().collect();
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
        // Distances go up to 0.4995, beyond the plotted range
        assert!(*fractions.last().unwrap() < 1.0);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            precision_recall(&[0.0], &[0.0], 0.0, 3.0),
            Err(EvalError::InvalidParameter { name: "threshold", .. })
        ));
        assert!(matches!(
            precision_recall(&[0.0], &[0.0], 0.1, -1.0),
            Err(EvalError::InvalidParameter { name: "plot_stretch", .. })
        ));
    }
}
