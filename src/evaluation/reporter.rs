// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Report generation for geometric evaluations (JSON)

use super::precision_recall::PrecisionRecall;
use crate::config::GeometryConfig;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Everything one geometric evaluation produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryReport {
    pub timestamp: String,
    pub scene: String,
    pub reconstruction: PathBuf,
    pub ground_truth: PathBuf,
    pub config: GeometryConfig,
    /// Reconstruction size as loaded
    pub reconstruction_points: usize,
    /// Points sampled from (or loaded as) the ground truth
    pub ground_truth_points: usize,
    /// Sizes after voxel downsampling
    pub reconstruction_points_downsampled: usize,
    pub ground_truth_points_downsampled: usize,
    pub scores: PrecisionRecall,
    pub outputs: Vec<PathBuf>,
}

impl GeometryReport {
    pub fn new(scene: impl Into<String>, reconstruction: &Path, ground_truth: &Path) -> Self {
        Self {
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            scene: scene.into(),
            reconstruction: reconstruction.to_path_buf(),
            ground_truth: ground_truth.to_path_buf(),
            config: GeometryConfig::default(),
            reconstruction_points: 0,
            ground_truth_points: 0,
            reconstruction_points_downsampled: 0,
            ground_truth_points_downsampled: 0,
            scores: PrecisionRecall {
                threshold: 0.0,
                precision: 0.0,
                recall: 0.0,
                fscore: 0.0,
                precision_histogram: Default::default(),
                recall_histogram: Default::default(),
            },
            outputs: Vec::new(),
        }
    }
}

/// Report writer
pub struct Reporter;

impl Reporter {
    /// Write JSON report
    pub fn write_json(report: &GeometryReport, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Read a JSON report back
    pub fn read_json(path: &Path) -> Result<GeometryReport> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read report {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse report {}", path.display()))
    }
}
