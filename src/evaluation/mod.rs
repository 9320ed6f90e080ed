// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric evaluation: precision, recall and F-score of a reconstruction
//! against a ground-truth surface

pub mod plot;
pub mod precision_recall;
pub mod reporter;
pub mod runner;

pub use plot::{distance_colors, plot_file_stem, PrecisionRecallPlot};
pub use precision_recall::{
    evaluate_histogram, fraction_within, fscore, precision_recall, CumulativeHistogram,
    HistogramEvaluation, PrecisionRecall,
};
pub use reporter::{GeometryReport, Reporter};
pub use runner::{evaluate_clouds, evaluate_geometry, ground_truth_points, scene_name};
