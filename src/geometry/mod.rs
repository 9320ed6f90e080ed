// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - point clouds, meshes and distance queries

mod bbox;
mod distance;
mod mesh;
mod point_cloud;

pub use bbox::BoundingBox;
pub use distance::{nearest_distances, NearestNeighbors};
pub use mesh::{Mesh, Triangle};
pub use point_cloud::PointCloud;
