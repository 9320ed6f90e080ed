// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Nearest-neighbor distances between point sets

use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::{Point3, Rotation3};
use std::collections::HashSet;

/// K-d tree over a fixed target point set.
///
/// The tree splits on axes in turn and cannot split a full bucket whose
/// points share one coordinate, which every planar or axis-aligned scan
/// produces. Points are therefore indexed in a fixed oblique frame, and the
/// returned distance is recomputed from the original coordinates.
pub struct NearestNeighbors {
    tree: KdTree<f32, 3>,
    points: Vec<Point3<f32>>,
    frame: Rotation3<f32>,
}

impl NearestNeighbors {
    /// Index `points`. Exact duplicates are dropped first since they never
    /// change a nearest distance.
    pub fn new(points: &[Point3<f32>]) -> Self {
        let frame = Rotation3::from_euler_angles(0.613, 0.829, 0.471);
        let mut seen = HashSet::with_capacity(points.len());
        let mut unique = Vec::with_capacity(points.len());
        let mut tree: KdTree<f32, 3> = KdTree::with_capacity(points.len().max(1));

        for p in points {
            if seen.insert([p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]) {
                let q = frame * p;
                tree.add(&[q.x, q.y, q.z], unique.len() as u64);
                unique.push(*p);
            }
        }

        Self {
            tree,
            points: unique,
            frame,
        }
    }

    /// Number of distinct indexed points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Euclidean distance to the closest indexed point, `None` when empty
    pub fn distance(&self, query: &Point3<f32>) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        let q = self.frame * query;
        let nearest = self.tree.nearest_one::<SquaredEuclidean>(&[q.x, q.y, q.z]);
        let closest = self.points.get(nearest.item as usize)?;
        Some((query - closest).norm())
    }
}

/// For every point of `from`, the distance to its nearest neighbor in `to`.
///
/// Returns an empty vector when `to` is empty.
pub fn nearest_distances(from: &[Point3<f32>], to: &[Point3<f32>]) -> Vec<f32> {
    let index = NearestNeighbors::new(to);
    from.iter().filter_map(|p| index.distance(p)).collect()
}
