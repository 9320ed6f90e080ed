// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Image quality metrics between rendered and ground-truth images

pub mod evaluator;
pub mod lpips;
pub mod psnr;
pub mod ssim;

pub use evaluator::{
    compute_pair, evaluate_directories, evaluate_pairs, format_report, load_rgb8, matched_pairs,
    read_report, summarize, validate_output_path, write_json, write_report, ImageEvaluation,
    ImagePair, MetricRecord, PairResult,
};
pub use lpips::Lpips;
pub use psnr::{mse, psnr, PSNR_CEILING};
pub use ssim::{ssim, SsimParams};
