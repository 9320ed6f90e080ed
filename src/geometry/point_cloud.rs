// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Unordered point sets and voxel-grid downsampling

use super::BoundingBox;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Point set without connectivity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    pub points: Vec<Point3<f32>>,
}

impl PointCloud {
    pub fn new(points: Vec<Point3<f32>>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// Replace every occupied voxel of edge `voxel_size` by the centroid of
    /// the points inside it.
    ///
    /// The grid is anchored half a voxel below the minimum bound, so a cloud
    /// already sitting on a lattice of pitch `voxel_size` keeps its points.
    /// A non-positive size returns the cloud unchanged. Output is ordered by
    /// voxel index, which keeps repeated runs identical.
    pub fn voxel_down_sample(&self, voxel_size: f32) -> PointCloud {
        if voxel_size <= 0.0 || !voxel_size.is_finite() || self.is_empty() {
            return self.clone();
        }

        let half = Vector3::repeat(voxel_size * 0.5);
        let origin = self.bounding_box().min - half;
        let inv = 1.0 / voxel_size as f64;

        let mut cells: BTreeMap<[i64; 3], (Vector3<f64>, usize)> = BTreeMap::new();
        for point in &self.points {
            let offset = (point - origin).cast::<f64>() * inv;
            let key = [
                offset.x.floor() as i64,
                offset.y.floor() as i64,
                offset.z.floor() as i64,
            ];
            let cell = cells.entry(key).or_insert((Vector3::zeros(), 0));
            cell.0 += point.coords.cast::<f64>();
            cell.1 += 1;
        }

        let points = cells
            .into_values()
            .map(|(sum, count)| Point3::from((sum / count as f64).cast::<f32>()))
            .collect();

        PointCloud { points }
    }
}

impl From<Vec<Point3<f32>>> for PointCloud {
    fn from(points: Vec<Point3<f32>>) -> Self {
        Self::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_voxel_down_sample_merges_points_in_one_cell() {
        let cloud = PointCloud::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.01, 0.0, 0.0),
            Point3::new(0.02, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
        ]);

        let down = cloud.voxel_down_sample(0.1);
        assert_eq!(down.len(), 2);
        assert_relative_eq!(down.points[0].x, 0.01, epsilon = 1e-6);
        assert_relative_eq!(down.points[1], Point3::new(1.0, 1.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_voxel_down_sample_disabled_for_non_positive_size() {
        let cloud = PointCloud::new(vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 0.0)]);
        assert_eq!(cloud.voxel_down_sample(0.0), cloud);
        assert_eq!(cloud.voxel_down_sample(-1.0), cloud);
    }

    #[test]
    fn test_voxel_down_sample_keeps_lattice_points() {
        let points: Vec<_> = (0..5)
            .map(|i| Point3::new(i as f32 * 0.5, 0.0, 0.0))
            .collect();
        let cloud = PointCloud::new(points.clone());

        let down = cloud.voxel_down_sample(0.5);
        assert_eq!(down.len(), 5);
        for (a, b) in down.points.iter().zip(&points) {
            assert_relative_eq!(a, b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_empty_cloud_down_sample() {
        assert!(PointCloud::default().voxel_down_sample(0.05).is_empty());
    }
}
