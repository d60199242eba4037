// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STL importer

use crate::geometry::{Mesh, Triangle, Vertex};
use anyhow::{Context, Result};
use nalgebra::{Point3, Vector3};
use std::fs::File;
use std::path::Path;
use stl_io::read_stl;
use tracing::debug;

/// Import an ASCII or binary STL file.
///
/// Every facet gets its own three vertices; welding happens when the mesh
/// is turned into a `Polymesh`.
pub fn import_stl(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let mut file = File::open(path).with_context(|| format!("Failed to open STL file: {:?}", path))?;
    let stl = read_stl(&mut file).with_context(|| format!("Failed to read STL file: {:?}", path))?;

    let mut mesh = Mesh::with_capacity(stl.faces.len() * 3, stl.faces.len());
    for face in &stl.faces {
        let normal = Vector3::new(
            face.normal[0] as f64,
            face.normal[1] as f64,
            face.normal[2] as f64,
        );

        let mut indices = [0; 3];
        for (slot, &vertex) in indices.iter_mut().zip(face.vertices.iter()) {
            let p = &stl.vertices[vertex];
            *slot = mesh.add_vertex(Vertex::new(
                Point3::new(p[0] as f64, p[1] as f64, p[2] as f64),
                normal,
            ));
        }
        mesh.add_triangle(Triangle::new(indices));
    }

    debug!(triangles = mesh.triangle_count(), "imported STL {:?}", path);
    Ok(mesh)
}
