// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Triangle meshes used as ground-truth sampling sources

use super::{BoundingBox, PointCloud};
use crate::error::EvalError;
use anyhow::{bail, Result};
use nalgebra::Point3;
use parry3d::shape::Triangle as TriangleShape;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }
}

/// Triangular mesh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Point3<f32>>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new(vertices: Vec<Point3<f32>>, triangles: Vec<Triangle>) -> Self {
        Self {
            vertices,
            triangles,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }

    /// Resolve every face into a triangle shape, failing on dangling indices
    fn shapes(&self) -> Result<Vec<TriangleShape>> {
        self.triangles
            .iter()
            .enumerate()
            .map(|(face, triangle)| {
                let [a, b, c] = triangle.indices;
                match (
                    self.vertices.get(a),
                    self.vertices.get(b),
                    self.vertices.get(c),
                ) {
                    (Some(a), Some(b), Some(c)) => Ok(TriangleShape::new(*a, *b, *c)),
                    _ => bail!(
                        "face {} references a vertex beyond {} vertices",
                        face,
                        self.vertices.len()
                    ),
                }
            })
            .collect()
    }

    /// Total surface area
    pub fn surface_area(&self) -> Result<f32> {
        Ok(self.shapes()?.iter().map(|t| t.area()).sum())
    }

    /// Draw `count` points uniformly over the surface.
    ///
    /// A face is picked with probability proportional to its area, then a
    /// point is drawn uniformly inside it. Zero-area faces are never picked.
    pub fn sample_points_uniformly<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> Result<PointCloud> {
        let shapes = self.shapes()?;
        let areas: Vec<f32> = shapes.iter().map(|t| t.area()).collect();

        if areas.iter().all(|a| *a <= 0.0 || !a.is_finite()) {
            return Err(EvalError::EmptyMesh.into());
        }
        if count == 0 {
            return Ok(PointCloud::default());
        }

        let weights = areas.iter().map(|a| if a.is_finite() { *a } else { 0.0 });
        let faces = WeightedIndex::new(weights).map_err(|_| EvalError::EmptyMesh)?;

        let points = (0..count)
            .map(|_| {
                let tri = &shapes[faces.sample(rng)];
                let r1 = rng.gen::<f32>().sqrt();
                let r2 = rng.gen::<f32>();
                let wa = 1.0 - r1;
                let wb = r1 * (1.0 - r2);
                let wc = r1 * r2;
                Point3::from(tri.a.coords * wa + tri.b.coords * wb + tri.c.coords * wc)
            })
            .collect();

        Ok(PointCloud::new(points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn unit_square() -> Mesh {
        Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![Triangle::new([0, 1, 2]), Triangle::new([0, 2, 3])],
        )
    }

    #[test]
    fn test_surface_area() {
        let area = unit_square().surface_area().unwrap();
        assert!((area - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_samples_lie_on_surface() {
        let mut rng = StdRng::seed_from_u64(7);
        let cloud = unit_square().sample_points_uniformly(500, &mut rng).unwrap();

        assert_eq!(cloud.len(), 500);
        for p in &cloud.points {
            assert!(p.z.abs() < 1e-6);
            assert!((-1e-6..=1.0 + 1e-6).contains(&p.x));
            assert!((-1e-6..=1.0 + 1e-6).contains(&p.y));
        }
    }

    #[test]
    fn test_sampling_is_reproducible_with_seed() {
        let mesh = unit_square();
        let a = mesh
            .sample_points_uniformly(32, &mut StdRng::seed_from_u64(3))
            .unwrap();
        let b = mesh
            .sample_points_uniformly(32, &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_degenerate_faces_are_never_sampled() {
        let mut mesh = unit_square();
        mesh.vertices.push(Point3::new(5.0, 5.0, 5.0));
        mesh.triangles.push(Triangle::new([4, 4, 4]));

        let cloud = mesh
            .sample_points_uniformly(200, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert!(cloud.points.iter().all(|p| p.x <= 1.0 + 1e-6));
    }

    #[test]
    fn test_empty_mesh_is_rejected() {
        let err = Mesh::default()
            .sample_points_uniformly(10, &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EvalError>(),
            Some(EvalError::EmptyMesh)
        ));
    }

    #[test]
    fn test_dangling_index_is_an_error() {
        let mesh = Mesh::new(vec![Point3::origin()], vec![Triangle::new([0, 1, 2])]);
        assert!(mesh.surface_area().is_err());
    }
}
