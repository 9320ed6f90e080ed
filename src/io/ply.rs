// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! PLY point cloud and mesh import, colored point export

use crate::error::EvalError;
use crate::geometry::{Mesh, PointCloud, Triangle};
use anyhow::{bail, Context, Result};
use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Ply, Property};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Contents of a PLY file: vertices plus whatever faces it declares
#[derive(Debug, Clone, Default)]
pub struct PlyContents {
    pub vertices: Vec<Point3<f32>>,
    pub triangles: Vec<Triangle>,
}

impl PlyContents {
    pub fn has_faces(&self) -> bool {
        !self.triangles.is_empty()
    }

    pub fn into_point_cloud(self) -> PointCloud {
        PointCloud::new(self.vertices)
    }

    pub fn into_mesh(self) -> Mesh {
        Mesh::new(self.vertices, self.triangles)
    }
}

/// Read vertex positions and (fan-triangulated) faces from a PLY file
pub fn read_ply(path: &Path) -> Result<PlyContents> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open PLY file: {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .with_context(|| format!("Failed to parse PLY file: {}", path.display()))?;

    let contents = decode(&ply)?;
    tracing::debug!(
        path = %path.display(),
        vertices = contents.vertices.len(),
        triangles = contents.triangles.len(),
        "loaded PLY"
    );
    Ok(contents)
}

fn decode(ply: &Ply<DefaultElement>) -> Result<PlyContents> {
    let mut contents = PlyContents::default();

    let Some(vertices) = ply.payload.get("vertex") else {
        return Ok(contents);
    };

    contents.vertices.reserve(vertices.len());
    for vertex in vertices {
        contents.vertices.push(Point3::new(
            scalar(vertex, "vertex", "x")?,
            scalar(vertex, "vertex", "y")?,
            scalar(vertex, "vertex", "z")?,
        ));
    }

    if let Some(faces) = ply.payload.get("face") {
        let vertex_count = contents.vertices.len();
        for (face_index, face) in faces.iter().enumerate() {
            let indices = face
                .get("vertex_indices")
                .or_else(|| face.get("vertex_index"))
                .ok_or_else(|| EvalError::MissingProperty {
                    element: "face".to_string(),
                    property: "vertex_indices".to_string(),
                })?;
            let indices = index_list(indices)?;

            if let Some(bad) = indices.iter().find(|i| **i >= vertex_count) {
                bail!(
                    "face {} references vertex {} but only {} vertices exist",
                    face_index,
                    bad,
                    vertex_count
                );
            }

            // Polygons are split into a fan around their first corner
            for k in 1..indices.len().saturating_sub(1) {
                contents
                    .triangles
                    .push(Triangle::new([indices[0], indices[k], indices[k + 1]]));
            }
        }
    }

    Ok(contents)
}

fn scalar(element: &DefaultElement, name: &str, key: &str) -> Result<f32> {
    let value = match element.get(key) {
        Some(Property::Float(v)) => *v,
        Some(Property::Double(v)) => *v as f32,
        Some(Property::Int(v)) => *v as f32,
        Some(Property::UInt(v)) => *v as f32,
        Some(Property::Short(v)) => *v as f32,
        Some(Property::UShort(v)) => *v as f32,
        Some(Property::Char(v)) => *v as f32,
        Some(Property::UChar(v)) => *v as f32,
        Some(_) => bail!("PLY property `{}.{}` is not a scalar", name, key),
        None => {
            return Err(EvalError::MissingProperty {
                element: name.to_string(),
                property: key.to_string(),
            }
            .into())
        }
    };
    Ok(value)
}

fn index_list(property: &Property) -> Result<Vec<usize>> {
    fn convert<T: Copy + TryInto<usize>>(values: &[T]) -> Result<Vec<usize>> {
        values
            .iter()
            .map(|v| {
                (*v).try_into()
                    .map_err(|_| anyhow::anyhow!("negative vertex index in face"))
            })
            .collect()
    }

    match property {
        Property::ListInt(v) => convert(v),
        Property::ListUInt(v) => convert(v),
        Property::ListShort(v) => convert(v),
        Property::ListUShort(v) => convert(v),
        Property::ListChar(v) => convert(v),
        Property::ListUChar(v) => convert(v),
        _ => bail!("face indices must be an integer list"),
    }
}

/// Write points with per-point RGB colors as an ASCII PLY
pub fn write_colored_ply(path: &Path, points: &[Point3<f32>], colors: &[[u8; 3]]) -> Result<()> {
    if points.len() != colors.len() {
        bail!(
            "{} points but {} colors for {}",
            points.len(),
            colors.len(),
            path.display()
        );
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create PLY file: {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "ply")?;
    writeln!(out, "format ascii 1.0")?;
    writeln!(out, "element vertex {}", points.len())?;
    writeln!(out, "property float x")?;
    writeln!(out, "property float y")?;
    writeln!(out, "property float z")?;
    writeln!(out, "property uchar red")?;
    writeln!(out, "property uchar green")?;
    writeln!(out, "property uchar blue")?;
    writeln!(out, "end_header")?;

    for (p, c) in points.iter().zip(colors) {
        writeln!(out, "{} {} {} {} {} {}", p.x, p.y, p.z, c[0], c[1], c[2])?;
    }

    out.flush()?;
    Ok(())
}

/// Write an uncolored ASCII PLY, optionally with triangle faces
pub fn write_ply(path: &Path, vertices: &[Point3<f32>], triangles: &[Triangle]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create PLY file: {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "ply")?;
    writeln!(out, "format ascii 1.0")?;
    writeln!(out, "element vertex {}", vertices.len())?;
    writeln!(out, "property float x")?;
    writeln!(out, "property float y")?;
    writeln!(out, "property float z")?;
    if !triangles.is_empty() {
        writeln!(out, "element face {}", triangles.len())?;
        writeln!(out, "property list uchar int vertex_indices")?;
    }
    writeln!(out, "end_header")?;

    for p in vertices {
        writeln!(out, "{} {} {}", p.x, p.y, p.z)?;
    }
    for t in triangles {
        let [a, b, c] = t.indices;
        writeln!(out, "3 {} {} {}", a, b, c)?;
    }

    out.flush()?;
    Ok(())
}
