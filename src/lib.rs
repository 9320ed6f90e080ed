// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Reconstruction evaluation toolkit
//!
//! Two independent evaluators for 3D reconstruction pipelines:
//! - geometric precision/recall/F-score of a reconstructed point cloud
//!   against a ground-truth mesh, from nearest-neighbor distance histograms
//! - PSNR, SSIM and LPIPS between rendered and ground-truth images

pub mod cli;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod geometry;
pub mod image_metrics;
pub mod io;

pub use config::{DeviceKind, EvalConfig, GeometryConfig, ImageConfig};
pub use error::EvalError;
pub use evaluation::{evaluate_geometry, GeometryReport, PrecisionRecall};
pub use geometry::{Mesh, PointCloud};
pub use image_metrics::{evaluate_directories, Lpips, MetricRecord};

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_basic_precision_recall() {
        let cloud = PointCloud::new(vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)]);
        let eval = evaluation::evaluate_histogram(&cloud, &cloud, 0.05, 0.1, 3.0).unwrap();
        assert_eq!(eval.scores.fscore, 1.0);
    }
}
