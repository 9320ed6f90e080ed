// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - point cloud and mesh import, PLY export

mod importer;
mod ply;
mod stl;

pub use importer::{import_ground_truth, import_point_cloud, GroundTruth};
pub use ply::{read_ply, write_colored_ply, write_ply, PlyContents};
pub use stl::read_stl_mesh;
