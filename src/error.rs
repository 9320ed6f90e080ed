// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error taxonomy for evaluation runs

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the evaluators themselves.
///
/// I/O and decoder failures are not wrapped here; they travel as
/// `anyhow::Error` with context attached at the call site.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("output path must end in .txt: {0}")]
    InvalidOutputPath(PathBuf),

    #[error("no image in {gt_dir} has a counterpart in {rendered_dir}")]
    NoMatchedPairs {
        gt_dir: PathBuf,
        rendered_dir: PathBuf,
    },

    #[error("image size mismatch: {left:?} vs {right:?}")]
    DimensionMismatch { left: (u32, u32), right: (u32, u32) },

    #[error("image is {width}x{height}, {metric} needs at least {min}x{min}")]
    ImageTooSmall {
        metric: &'static str,
        width: u32,
        height: u32,
        min: u32,
    },

    #[error("mesh has no surface area to sample from")]
    EmptyMesh,

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("PLY element `{element}` is missing property `{property}`")]
    MissingProperty { element: String, property: String },
}

impl EvalError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        EvalError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
