// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Matched-pair image evaluation and text reports

use super::lpips::Lpips;
use super::psnr::psnr;
use super::ssim::{ssim, SsimParams};
use crate::error::EvalError;
use anyhow::{Context, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Scores for one image pair, or the mean over many
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub psnr: f64,
    pub ssim: f64,
    pub lpips: f64,
}

impl MetricRecord {
    /// Field-wise arithmetic mean; `None` for an empty slice
    pub fn mean(records: &[MetricRecord]) -> Option<MetricRecord> {
        if records.is_empty() {
            return None;
        }
        let n = records.len() as f64;
        let sum = records.iter().fold((0.0, 0.0, 0.0), |acc, r| {
            (acc.0 + r.psnr, acc.1 + r.ssim, acc.2 + r.lpips)
        });
        Some(MetricRecord {
            psnr: sum.0 / n,
            ssim: sum.1 / n,
            lpips: sum.2 / n,
        })
    }

    /// `(name, value)` in report order
    pub fn entries(&self) -> [(&'static str, f64); 3] {
        [("psnr", self.psnr), ("ssim", self.ssim), ("lpips", self.lpips)]
    }
}

/// Ground-truth image and the rendered image of the same name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePair {
    pub name: String,
    pub ground_truth: PathBuf,
    pub rendered: PathBuf,
}

/// Scores for a named pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairResult {
    pub name: String,
    #[serde(flatten)]
    pub record: MetricRecord,
}

/// All pair scores plus their mean
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageEvaluation {
    pub pairs: Vec<PairResult>,
    pub mean: MetricRecord,
}

/// Pair every regular file in `gt_dir` with the same name in `rendered_dir`.
///
/// Files without a counterpart are skipped. Pairs come back sorted by name.
pub fn matched_pairs(gt_dir: &Path, rendered_dir: &Path) -> Result<Vec<ImagePair>> {
    let mut pairs = Vec::new();

    for entry in WalkDir::new(gt_dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry
            .with_context(|| format!("Failed to list ground-truth directory {}", gt_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let rendered = rendered_dir.join(entry.file_name());
        if rendered.is_file() {
            pairs.push(ImagePair {
                name,
                ground_truth: entry.path().to_path_buf(),
                rendered,
            });
        } else {
            tracing::debug!(name = %name, "no rendered counterpart, skipping");
        }
    }

    Ok(pairs)
}

/// Decode an image as 8-bit RGB
pub fn load_rgb8(path: &Path) -> Result<RgbImage> {
    let image =
        image::open(path).with_context(|| format!("Failed to open image: {}", path.display()))?;
    Ok(image.to_rgb8())
}

/// PSNR, SSIM and LPIPS for one pair of decoded images
pub fn compute_pair(
    ground_truth: &RgbImage,
    rendered: &RgbImage,
    lpips: &Lpips,
    ssim_params: &SsimParams,
) -> Result<MetricRecord> {
    Ok(MetricRecord {
        psnr: psnr(ground_truth, rendered)?,
        ssim: ssim(ground_truth, rendered, ssim_params)?,
        lpips: lpips.distance(ground_truth, rendered)? as f64,
    })
}

/// Score every pair in order; `on_pair` sees each result as it lands
pub fn evaluate_pairs(
    pairs: &[ImagePair],
    lpips: &Lpips,
    ssim_params: &SsimParams,
    mut on_pair: impl FnMut(&PairResult),
) -> Result<Vec<PairResult>> {
    let mut results = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let gt = load_rgb8(&pair.ground_truth)?;
        let rendered = load_rgb8(&pair.rendered)?;
        let record = compute_pair(&gt, &rendered, lpips, ssim_params)
            .with_context(|| format!("Failed to score {}", pair.name))?;

        let result = PairResult {
            name: pair.name.clone(),
            record,
        };
        on_pair(&result);
        results.push(result);
    }
    Ok(results)
}

/// Evaluate two directories and average the scores.
///
/// Fails with [`EvalError::NoMatchedPairs`] when no file name is shared.
pub fn evaluate_directories(
    rendered_dir: &Path,
    gt_dir: &Path,
    lpips: &Lpips,
    ssim_params: &SsimParams,
) -> Result<ImageEvaluation> {
    let pairs = matched_pairs(gt_dir, rendered_dir)?;
    if pairs.is_empty() {
        return Err(no_pairs(gt_dir, rendered_dir).into());
    }
    let results = evaluate_pairs(&pairs, lpips, ssim_params, |_| {})?;
    summarize(results, gt_dir, rendered_dir)
}

/// Attach the mean to a set of pair results
pub fn summarize(
    pairs: Vec<PairResult>,
    gt_dir: &Path,
    rendered_dir: &Path,
) -> Result<ImageEvaluation> {
    let records: Vec<MetricRecord> = pairs.iter().map(|p| p.record).collect();
    let mean = MetricRecord::mean(&records).ok_or_else(|| no_pairs(gt_dir, rendered_dir))?;
    Ok(ImageEvaluation { pairs, mean })
}

fn no_pairs(gt_dir: &Path, rendered_dir: &Path) -> EvalError {
    EvalError::NoMatchedPairs {
        gt_dir: gt_dir.to_path_buf(),
        rendered_dir: rendered_dir.to_path_buf(),
    }
}

/// Reports must be `.txt` files
pub fn validate_output_path(path: &Path) -> Result<(), EvalError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("txt") => Ok(()),
        _ => Err(EvalError::InvalidOutputPath(path.to_path_buf())),
    }
}

/// Shortest round-trip decimal, always with a fractional part
fn format_value(value: f64) -> String {
    let text = format!("{}", value);
    if value.is_finite() && !text.contains(['.', 'e']) {
        format!("{}.0", text)
    } else {
        text
    }
}

/// `psnr: ..`, `ssim: ..`, `lpips: ..`, one per line
pub fn format_report(mean: &MetricRecord) -> String {
    mean.entries()
        .iter()
        .map(|(key, value)| format!("{}: {}\n", key, format_value(*value)))
        .collect()
}

/// Write the mean scores as a text report
pub fn write_report(path: &Path, mean: &MetricRecord) -> Result<()> {
    validate_output_path(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, format_report(mean))
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(())
}

/// Read a text report back into a name-to-value map
pub fn read_report(path: &Path) -> Result<BTreeMap<String, f64>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read report {}", path.display()))?;
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (key, value) = line
                .split_once(':')
                .with_context(|| format!("Malformed report line: {}", line))?;
            let value: f64 = value
                .trim()
                .parse()
                .with_context(|| format!("Malformed value in line: {}", line))?;
            Ok((key.trim().to_string(), value))
        })
        .collect()
}

/// Per-image scores and the mean as JSON
pub fn write_json(path: &Path, evaluation: &ImageEvaluation) -> Result<()> {
    let json = serde_json::to_string_pretty(evaluation)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
