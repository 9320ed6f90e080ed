// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end precision/recall runs over files on disk

use anyhow::Result;
use approx::assert_relative_eq;
use nalgebra::Point3;
use recon_eval::evaluation::Reporter;
use recon_eval::geometry::Triangle;
use recon_eval::io::write_ply;
use recon_eval::{evaluate_geometry, GeometryConfig};
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Unit square in the z = `z` plane, as two triangles
fn write_square_mesh(path: &Path, z: f32) -> Result<()> {
    let vertices = [
        Point3::new(0.0, 0.0, z),
        Point3::new(1.0, 0.0, z),
        Point3::new(1.0, 1.0, z),
        Point3::new(0.0, 1.0, z),
    ];
    let triangles = [Triangle::new([0, 1, 2]), Triangle::new([0, 2, 3])];
    write_ply(path, &vertices, &triangles)
}

/// Regular grid covering the unit square at height `z`
fn grid(z: f32) -> Vec<Point3<f32>> {
    let steps = 50;
    let mut points = Vec::new();
    for i in 0..=steps {
        for j in 0..=steps {
            points.push(Point3::new(
                i as f32 / steps as f32,
                j as f32 / steps as f32,
                z,
            ));
        }
    }
    points
}

fn write_cloud(path: &Path, z: f32) -> Result<()> {
    write_ply(path, &grid(z), &[])
}

fn setup(recon_z: f32) -> Result<(TempDir, PathBuf, PathBuf, PathBuf)> {
    let dir = TempDir::new()?;
    let recon = dir.path().join("scan.ply");
    let gt = dir.path().join("gt.ply");
    write_cloud(&recon, recon_z)?;
    write_square_mesh(&gt, 0.0)?;
    let out = dir.path().join("out");
    Ok((dir, recon, gt, out))
}

#[test]
fn test_reconstruction_on_surface_scores_perfectly() -> Result<()> {
    let (_dir, recon, gt, out) = setup(0.0)?;

    let report = evaluate_geometry(&recon, &gt, &out, &GeometryConfig::default())?;

    assert_eq!(report.scene, "scan");
    assert_eq!(report.reconstruction_points, 51 * 51);
    assert_eq!(report.ground_truth_points, 51 * 51);
    assert_relative_eq!(report.scores.precision, 1.0);
    assert_relative_eq!(report.scores.recall, 1.0);
    assert_relative_eq!(report.scores.fscore, 1.0);
    assert_eq!(report.scores.precision_histogram.len(), 299);
    Ok(())
}

#[test]
fn test_output_files_are_written() -> Result<()> {
    let (_dir, recon, gt, out) = setup(0.0)?;

    evaluate_geometry(&recon, &gt, &out, &GeometryConfig::default())?;

    for name in [
        "PR_scan_@d_th_0_1000.png",
        "PR_scan_@d_th_0_1000.pdf",
        "scan.precision.ply",
        "scan.recall.ply",
        "scan.json",
    ] {
        assert!(out.join(name).is_file(), "missing {}", name);
    }

    let report = Reporter::read_json(&out.join("scan.json"))?;
    assert_eq!(report.outputs.len(), 5);
    assert_relative_eq!(report.scores.fscore, 1.0);
    Ok(())
}

#[test]
fn test_colored_clouds_can_be_disabled() -> Result<()> {
    let (_dir, recon, gt, out) = setup(0.0)?;
    let config = GeometryConfig {
        write_colored_clouds: false,
        ..Default::default()
    };

    let report = evaluate_geometry(&recon, &gt, &out, &config)?;

    assert!(!out.join("scan.precision.ply").exists());
    assert_eq!(report.outputs.len(), 3);
    Ok(())
}

#[test]
fn test_distant_reconstruction_scores_zero() -> Result<()> {
    let (_dir, recon, gt, out) = setup(5.0)?;

    let report = evaluate_geometry(&recon, &gt, &out, &GeometryConfig::default())?;

    assert_eq!(report.scores.precision, 0.0);
    assert_eq!(report.scores.recall, 0.0);
    assert_eq!(report.scores.fscore, 0.0);
    Ok(())
}

#[test]
fn test_offset_within_threshold_still_matches() -> Result<()> {
    let (_dir, recon, gt, out) = setup(0.05)?;

    let report = evaluate_geometry(&recon, &gt, &out, &GeometryConfig::default())?;
    assert_relative_eq!(report.scores.fscore, 1.0);

    let tight = GeometryConfig {
        threshold: 0.01,
        ..Default::default()
    };
    let report = evaluate_geometry(&recon, &gt, &out, &tight)?;
    assert_eq!(report.scores.fscore, 0.0);
    assert!(out.join("PR_scan_@d_th_0_0100.pdf").is_file());
    Ok(())
}

#[test]
fn test_sampling_is_reproducible() -> Result<()> {
    let (_dir, recon, gt, out) = setup(0.0)?;
    let config = GeometryConfig {
        voxel_size: 0.0,
        threshold: 0.015,
        seed: 7,
        ..Default::default()
    };

    let first = evaluate_geometry(&recon, &gt, &out, &config)?;
    let second = evaluate_geometry(&recon, &gt, &out, &config)?;
    assert_eq!(first.scores.recall, second.scores.recall);
    assert_eq!(first.scores.recall_histogram, second.scores.recall_histogram);
    Ok(())
}

#[test]
fn test_faceless_ground_truth_is_used_as_points() -> Result<()> {
    let dir = TempDir::new()?;
    let recon = dir.path().join("scan.ply");
    let gt = dir.path().join("gt_points.ply");
    write_cloud(&recon, 0.0)?;
    write_ply(&gt, &[Point3::new(0.5, 0.5, 0.0)], &[])?;

    let report = evaluate_geometry(&recon, &gt, &dir.path().join("out"), &GeometryConfig::default())?;

    assert_eq!(report.ground_truth_points, 1);
    assert_relative_eq!(report.scores.recall, 1.0);
    assert!(report.scores.precision < 0.1);
    Ok(())
}

#[test]
fn test_stl_ground_truth() -> Result<()> {
    use stl_io::{Normal, Vertex};

    let dir = TempDir::new()?;
    let recon = dir.path().join("scan.ply");
    let gt = dir.path().join("gt.stl");
    write_cloud(&recon, 0.0)?;

    let normal = Normal::new([0.0, 0.0, 1.0]);
    let faces = [
        stl_io::Triangle {
            normal,
            vertices: [
                Vertex::new([0.0, 0.0, 0.0]),
                Vertex::new([1.0, 0.0, 0.0]),
                Vertex::new([1.0, 1.0, 0.0]),
            ],
        },
        stl_io::Triangle {
            normal,
            vertices: [
                Vertex::new([0.0, 0.0, 0.0]),
                Vertex::new([1.0, 1.0, 0.0]),
                Vertex::new([0.0, 1.0, 0.0]),
            ],
        },
    ];
    let mut file = File::create(&gt)?;
    stl_io::write_stl(&mut file, faces.iter())?;
    drop(file);

    let report = evaluate_geometry(&recon, &gt, &dir.path().join("out"), &GeometryConfig::default())?;
    assert_relative_eq!(report.scores.fscore, 1.0);
    Ok(())
}

#[test]
fn test_invalid_threshold_rejected_before_io() {
    let config = GeometryConfig {
        threshold: 0.0,
        ..Default::default()
    };
    let missing = Path::new("does/not/exist.ply");
    let err = evaluate_geometry(missing, missing, Path::new("unused"), &config).unwrap_err();
    assert!(format!("{:#}", err).contains("threshold"));
}

#[test]
fn test_unsupported_reconstruction_format() -> Result<()> {
    let dir = TempDir::new()?;
    let recon = dir.path().join("scan.xyz");
    std::fs::write(&recon, "0 0 0\n")?;
    let gt = dir.path().join("gt.ply");
    write_square_mesh(&gt, 0.0)?;

    let result = evaluate_geometry(&recon, &gt, &dir.path().join("out"), &GeometryConfig::default());
    assert!(result.is_err());
    Ok(())
}
