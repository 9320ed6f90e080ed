// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::evaluation::GeometryReport;
use crate::image_metrics::{ImageEvaluation, PairResult};
use colored::*;
use std::path::Path;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report precision/recall for one scene
    pub fn report_geometry(report: &GeometryReport, duration: Duration) {
        let scores = &report.scores;

        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Scene:".bold(), report.scene.cyan());
        println!("{}", "━".repeat(80).bright_black());

        println!(
            "  {} {} → {} (reconstruction)",
            "Points:".bright_black(),
            report.reconstruction_points,
            report.reconstruction_points_downsampled
        );
        println!(
            "  {} {} → {} (ground truth)",
            "Points:".bright_black(),
            report.ground_truth_points,
            report.ground_truth_points_downsampled
        );
        println!(
            "  {} {} (voxel {})",
            "Threshold:".bright_black(),
            scores.threshold,
            report.config.voxel_size
        );

        println!("\n{}", "Metrics:".bold());
        Self::print_score("precision", scores.precision as f64);
        Self::print_score("recall", scores.recall as f64);
        Self::print_score("fscore", scores.fscore as f64);

        println!("\n{}", "Outputs:".bold());
        for output in &report.outputs {
            println!("  {}", output.display().to_string().bright_black());
        }
        println!(
            "\n  {} {}",
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    /// One line per scored image pair
    pub fn report_pair(result: &PairResult) {
        println!(
            "  {} {} {:.4} {} {:.4} {} {:.4}",
            result.name.cyan(),
            "psnr".bright_black(),
            result.record.psnr,
            "ssim".bright_black(),
            result.record.ssim,
            "lpips".bright_black(),
            result.record.lpips
        );
    }

    /// Mean image metrics and where they went
    pub fn report_images(evaluation: &ImageEvaluation, output: &Path, duration: Duration) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!(
            "{} {} pairs",
            "Image metrics:".bold(),
            evaluation.pairs.len().to_string().cyan()
        );
        println!("{}", "━".repeat(80).bright_black());
        for (name, value) in evaluation.mean.entries() {
            println!(
                "  {} {}",
                format!("{}:", name).bright_black(),
                format!("{:.4}", value).green()
            );
        }
        println!(
            "\n  {} {}",
            "Report:".bright_black(),
            output.display().to_string().cyan()
        );
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Print a [0, 1] score, colored by how close it is to 1
    fn print_score(name: &str, value: f64) {
        let text = format!("{:.4}", value);
        let formatted = if value >= 0.8 {
            text.green()
        } else if value >= 0.5 {
            text.yellow()
        } else {
            text.red()
        };

        println!(
            "  {} {} {}",
            format!("{}:", name).bright_black(),
            formatted,
            format!("({:.2}%)", value * 100.0).bright_black()
        );
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }
}
