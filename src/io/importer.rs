// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Format dispatch for reconstruction and ground-truth inputs

use super::{read_ply, read_stl_mesh};
use crate::error::EvalError;
use crate::geometry::{Mesh, PointCloud};
use anyhow::Result;
use std::path::Path;

/// Ground truth as found on disk
#[derive(Debug, Clone)]
pub enum GroundTruth {
    /// Surface to be sampled
    Mesh(Mesh),
    /// Already a point set (PLY without faces)
    Points(PointCloud),
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Load a reconstructed point cloud. Any faces in the file are ignored.
pub fn import_point_cloud(path: &Path) -> Result<PointCloud> {
    match extension(path).as_deref() {
        Some("ply") => Ok(read_ply(path)?.into_point_cloud()),
        _ => Err(EvalError::UnsupportedFormat(path.to_path_buf()).into()),
    }
}

/// Load a ground-truth mesh (PLY or STL); a face-less PLY becomes a point set
pub fn import_ground_truth(path: &Path) -> Result<GroundTruth> {
    match extension(path).as_deref() {
        Some("ply") => {
            let contents = read_ply(path)?;
            if contents.has_faces() {
                Ok(GroundTruth::Mesh(contents.into_mesh()))
            } else {
                Ok(GroundTruth::Points(contents.into_point_cloud()))
            }
        }
        Some("stl") => Ok(GroundTruth::Mesh(read_stl_mesh(path)?)),
        _ => Err(EvalError::UnsupportedFormat(path.to_path_buf()).into()),
    }
}
