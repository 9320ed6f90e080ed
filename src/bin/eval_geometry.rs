// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Precision/recall/F-score of a reconstructed point cloud against a
//! ground-truth mesh

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use recon_eval::cli::{init_tracing, Reporter};
use recon_eval::{evaluate_geometry, EvalConfig};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "recon-eval-geometry")]
#[command(about = "Precision, recall and F-score of a reconstruction", long_about = None)]
struct Cli {
    /// Reconstructed point cloud (PLY)
    #[arg(long = "recon_ply_path", alias = "recon-ply-path")]
    recon_ply_path: PathBuf,

    /// Ground-truth mesh (PLY or STL)
    #[arg(long = "gt_path", alias = "gt-path")]
    gt_path: PathBuf,

    /// Directory receiving plots, colored clouds and the JSON summary
    #[arg(long = "output_dir", alias = "output-dir")]
    output_dir: PathBuf,

    /// Voxel size for downsampling, non-positive disables it [default: 0.05]
    #[arg(long = "voxel_size", alias = "voxel-size", allow_negative_numbers = true)]
    voxel_size: Option<f32>,

    /// Distance threshold for precision and recall [default: 0.1]
    #[arg(long)]
    threshold: Option<f32>,

    /// Plot range as a multiple of the threshold [default: 3.0]
    #[arg(long = "plot_stretch", alias = "plot-stretch")]
    plot_stretch: Option<f32>,

    /// Seed for ground-truth surface sampling [default: 0]
    #[arg(long)]
    seed: Option<u64>,

    /// Skip writing distance-colored point clouds
    #[arg(long = "no_colored_clouds", alias = "no-colored-clouds")]
    no_colored_clouds: bool,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = EvalConfig::load(cli.config.as_deref())?.geometry;
    if let Some(voxel_size) = cli.voxel_size {
        config.voxel_size = voxel_size;
    }
    if let Some(threshold) = cli.threshold {
        config.threshold = threshold;
    }
    if let Some(plot_stretch) = cli.plot_stretch {
        config.plot_stretch = plot_stretch;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if cli.no_colored_clouds {
        config.write_colored_clouds = false;
    }

    if cli.verbose {
        println!("{}", "Starting geometric evaluation...".bold());
    }

    let start = Instant::now();
    match evaluate_geometry(&cli.recon_ply_path, &cli.gt_path, &cli.output_dir, &config) {
        Ok(report) => {
            if cli.verbose {
                Reporter::report_geometry(&report, start.elapsed());
            } else {
                println!("precision: {}", report.scores.precision);
                println!("recall: {}", report.scores.recall);
                println!("fscore: {}", report.scores.fscore);
            }
            Ok(())
        }
        Err(e) => {
            Reporter::report_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}
