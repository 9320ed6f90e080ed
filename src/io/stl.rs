// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STL mesh import

use crate::geometry::{Mesh, Triangle};
use anyhow::{Context, Result};
use nalgebra::Point3;
use std::fs::File;
use std::path::Path;
use stl_io::read_stl;

/// Load an ASCII or binary STL file as an indexed mesh
pub fn read_stl_mesh(path: &Path) -> Result<Mesh> {
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open STL file: {}", path.display()))?;
    let stl = read_stl(&mut file)
        .with_context(|| format!("Failed to read STL file: {}", path.display()))?;

    let vertices = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0], v[1], v[2]))
        .collect();
    let triangles = stl
        .faces
        .iter()
        .map(|f| Triangle::new(f.vertices))
        .collect();

    Ok(Mesh::new(vertices, triangles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stl_io::{Normal, Vertex};
    use tempfile::TempDir;

    #[test]
    fn test_read_binary_stl() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("tri.stl");

        let triangle = stl_io::Triangle {
            normal: Normal::new([0.0, 0.0, 1.0]),
            vertices: [
                Vertex::new([0.0, 0.0, 0.0]),
                Vertex::new([2.0, 0.0, 0.0]),
                Vertex::new([0.0, 2.0, 0.0]),
            ],
        };
        let mut file = File::create(&path)?;
        stl_io::write_stl(&mut file, [triangle].iter())?;
        drop(file);

        let mesh = read_stl_mesh(&path)?;
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!((mesh.surface_area()? - 2.0).abs() < 1e-6);
        Ok(())
    }
}
