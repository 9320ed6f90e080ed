// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end geometric evaluation of one reconstruction

use super::plot::{distance_colors, PrecisionRecallPlot};
use super::precision_recall::{evaluate_histogram, HistogramEvaluation};
use super::reporter::{GeometryReport, Reporter};
use crate::config::GeometryConfig;
use crate::geometry::PointCloud;
use crate::io::{self, GroundTruth};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use tracing::info;

/// Scene name used in output file names: the reconstruction's file stem
pub fn scene_name(recon_path: &Path) -> String {
    recon_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scene".to_string())
}

/// Turn the ground truth into a point set with `count` points.
///
/// Meshes are sampled with exactly as many points as the reconstruction
/// has, so the ground-truth density follows the reconstruction density.
pub fn ground_truth_points(gt: &GroundTruth, count: usize, seed: u64) -> Result<PointCloud> {
    match gt {
        GroundTruth::Mesh(mesh) => {
            let mut rng = StdRng::seed_from_u64(seed);
            mesh.sample_points_uniformly(count, &mut rng)
                .context("Failed to sample ground-truth mesh")
        }
        GroundTruth::Points(cloud) => Ok(cloud.clone()),
    }
}

/// Score a reconstruction against a ground truth already in memory
pub fn evaluate_clouds(
    reconstruction: &PointCloud,
    ground_truth: &GroundTruth,
    config: &GeometryConfig,
) -> Result<(PointCloud, HistogramEvaluation)> {
    config.validate()?;
    let gt_points = ground_truth_points(ground_truth, reconstruction.len(), config.seed)?;
    let evaluation = evaluate_histogram(
        reconstruction,
        &gt_points,
        config.voxel_size,
        config.threshold,
        config.plot_stretch,
    )?;
    Ok((gt_points, evaluation))
}

/// Load both inputs, score them, and write plots, colored clouds and a JSON
/// summary into `output_dir`
pub fn evaluate_geometry(
    recon_path: &Path,
    gt_path: &Path,
    output_dir: &Path,
    config: &GeometryConfig,
) -> Result<GeometryReport> {
    config.validate()?;

    let reconstruction = io::import_point_cloud(recon_path)?;
    info!(
        points = reconstruction.len(),
        path = %recon_path.display(),
        "loaded reconstruction"
    );

    let ground_truth = io::import_ground_truth(gt_path)?;
    let (gt_points, evaluation) = evaluate_clouds(&reconstruction, &ground_truth, config)?;
    info!(
        precision = evaluation.scores.precision,
        recall = evaluation.scores.recall,
        fscore = evaluation.scores.fscore,
        "scored reconstruction"
    );

    std::fs::create_dir_all(output_dir).with_context(|| {
        format!("Failed to create output directory {}", output_dir.display())
    })?;

    let scene = scene_name(recon_path);
    let mut report = GeometryReport::new(scene.clone(), recon_path, gt_path);
    report.config = config.clone();
    report.reconstruction_points = reconstruction.len();
    report.ground_truth_points = gt_points.len();
    report.reconstruction_points_downsampled = evaluation.reconstruction.len();
    report.ground_truth_points_downsampled = evaluation.ground_truth.len();

    let plot = PrecisionRecallPlot::new(&scene, &evaluation.scores, config.plot_stretch);
    let (png, pdf) = plot.write_all(output_dir)?;
    report.outputs.push(png);
    report.outputs.push(pdf);

    if config.write_colored_clouds {
        let max_distance = config.threshold * config.plot_stretch;
        for (suffix, cloud, distances) in [
            ("precision", &evaluation.reconstruction, &evaluation.recon_to_gt),
            ("recall", &evaluation.ground_truth, &evaluation.gt_to_recon),
        ] {
            // Distances are missing when the opposite set is empty
            if cloud.len() != distances.len() {
                tracing::warn!(cloud = suffix, "skipping colored cloud, nothing to measure against");
                continue;
            }
            let path = output_dir.join(format!("{}.{}.ply", scene, suffix));
            io::write_colored_ply(&path, &cloud.points, &distance_colors(distances, max_distance))?;
            report.outputs.push(path);
        }
    }

    report.scores = evaluation.scores;

    let json_path = output_dir.join(format!("{}.json", scene));
    report.outputs.push(json_path.clone());
    Reporter::write_json(&report, &json_path)?;

    Ok(report)
}
