// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! PSNR, SSIM and LPIPS between rendered images and ground truth

use anyhow::{bail, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use recon_eval::cli::{init_tracing, Reporter};
use recon_eval::image_metrics::{
    evaluate_pairs, matched_pairs, summarize, validate_output_path, write_json, write_report,
    SsimParams,
};
use recon_eval::{DeviceKind, EvalConfig, EvalError, Lpips};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "recon-eval-images")]
#[command(about = "Image metrics between rendered and ground-truth images", long_about = None)]
struct Cli {
    /// Directory of rendered images
    #[arg(long = "rendered_dir", alias = "rendered-dir")]
    rendered_dir: PathBuf,

    /// Directory of ground-truth images
    #[arg(long = "gt_dir", alias = "gt-dir")]
    gt_dir: PathBuf,

    /// Text report of the mean scores (must end in .txt)
    #[arg(long = "output_path", alias = "output-path", default_value = "metrics.txt")]
    output_path: PathBuf,

    /// LPIPS weights in safetensors format
    #[arg(long = "lpips_weights", alias = "lpips-weights")]
    lpips_weights: Option<PathBuf>,

    /// Compute device for LPIPS
    #[arg(long, value_enum)]
    device: Option<DeviceKind>,

    /// Also write per-image scores as JSON
    #[arg(long = "per_image_json", alias = "per-image-json")]
    per_image_json: Option<PathBuf>,

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

    if let Err(e) = run(&cli) {
        Reporter::report_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    // Reject a bad report path before any heavy work
    validate_output_path(&cli.output_path)?;

    let mut config = EvalConfig::load(cli.config.as_deref())?.images;
    if let Some(weights) = &cli.lpips_weights {
        config.lpips_weights = Some(weights.clone());
    }
    if let Some(device) = cli.device {
        config.device = device;
    }
    let Some(weights) = config.lpips_weights.as_deref() else {
        bail!("no LPIPS weights configured; pass --lpips_weights or set RECON_EVAL_LPIPS_WEIGHTS");
    };

    let start = Instant::now();
    let lpips = Lpips::load(weights, config.device, config.device_ordinal)?;
    let ssim_params = SsimParams::with_window(config.ssim_window);

    let pairs = matched_pairs(&cli.gt_dir, &cli.rendered_dir)?;
    if pairs.is_empty() {
        return Err(EvalError::NoMatchedPairs {
            gt_dir: cli.gt_dir.clone(),
            rendered_dir: cli.rendered_dir.clone(),
        }
        .into());
    }

    if cli.verbose {
        println!(
            "{} {} matched pairs on {}",
            "Found".bold(),
            pairs.len(),
            config.device.as_str()
        );
    }

    let progress = if cli.verbose {
        let pb = ProgressBar::new(pairs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let results = evaluate_pairs(&pairs, &lpips, &ssim_params, |result| {
        if let Some(pb) = &progress {
            pb.suspend(|| Reporter::report_pair(result));
            pb.inc(1);
        }
    })?;

    if let Some(pb) = progress {
        pb.finish_with_message("Evaluation complete");
    }

    let evaluation = summarize(results, &cli.gt_dir, &cli.rendered_dir)?;
    write_report(&cli.output_path, &evaluation.mean)?;
    if let Some(json_path) = &cli.per_image_json {
        write_json(json_path, &evaluation)?;
    }

    if cli.verbose {
        Reporter::report_images(&evaluation, &cli.output_path, start.elapsed());
    } else {
        for (name, value) in evaluation.mean.entries() {
            println!("{}: {}", name, value);
        }
    }
    Ok(())
}
