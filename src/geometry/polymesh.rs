// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Face-based mesh with adjacency by local edge index

use super::{BoundingBox, HalfEdgeMesh, Mesh, Polygon};
use crate::error::{ShapeError, ShapeResult};
use nalgebra::Point3;
use tracing::debug;

/// Immutable polygon mesh consumed by the detection stages.
///
/// `adjacent_face(f, e)` is the face across local edge `e` of face `f`, or
/// `None` on a free boundary.
#[derive(Debug, Clone)]
pub struct Polymesh {
    faces: Vec<Polygon>,
    adjacency: Vec<Vec<Option<usize>>>,
    vertices: Vec<Point3<f64>>,
}

impl Polymesh {
    /// Weld a triangle mesh and derive adjacency from shared edges
    pub fn from_mesh(mesh: &Mesh, weld_epsilon: f64) -> Self {
        let mut welded = mesh.clone();
        let removed = welded.weld_vertices(weld_epsilon);
        let degenerate = welded.remove_degenerate_triangles();
        if removed > 0 || degenerate > 0 {
            debug!(removed, degenerate, "welded mesh before adjacency");
        }

        let faces = welded
            .triangles
            .iter()
            .map(|t| {
                let [a, b, c] = welded.triangle_positions(t);
                Polygon::triangle(a, b, c)
            })
            .collect();
        let loops: Vec<Vec<usize>> = welded
            .triangles
            .iter()
            .map(|t| t.indices.to_vec())
            .collect();

        let vertices = welded.vertices.iter().map(|v| v.position).collect();
        Self::with_topology(faces, &loops, vertices)
    }

    /// Derive adjacency from faces whose corners coincide within `weld_epsilon`
    pub fn from_polygons(faces: Vec<Polygon>, weld_epsilon: f64) -> Self {
        let mut vertices: Vec<Point3<f64>> = Vec::new();
        let loops: Vec<Vec<usize>> = faces
            .iter()
            .map(|face| {
                face.points()
                    .iter()
                    .map(|p| {
                        match vertices.iter().position(|q| (p - q).norm() <= weld_epsilon) {
                            Some(index) => index,
                            None => {
                                vertices.push(*p);
                                vertices.len() - 1
                            }
                        }
                    })
                    .collect()
            })
            .collect();

        Self::with_topology(faces, &loops, vertices)
    }

    /// Use a caller-supplied adjacency table. The table may be asymmetric.
    pub fn with_adjacency(
        faces: Vec<Polygon>,
        adjacency: Vec<Vec<Option<usize>>>,
    ) -> ShapeResult<Self> {
        if faces.len() != adjacency.len() {
            return Err(ShapeError::InvalidInput(format!(
                "{} faces but {} adjacency rows",
                faces.len(),
                adjacency.len()
            )));
        }
        for (index, (face, row)) in faces.iter().zip(&adjacency).enumerate() {
            if face.num_points() != row.len() {
                return Err(ShapeError::InvalidInput(format!(
                    "face {} has {} edges but {} adjacency entries",
                    index,
                    face.num_points(),
                    row.len()
                )));
            }
            if let Some(bad) = row.iter().flatten().find(|&&f| f >= faces.len()) {
                return Err(ShapeError::InvalidInput(format!(
                    "face {} is adjacent to missing face {}",
                    index, bad
                )));
            }
        }

        let mut vertices: Vec<Point3<f64>> = Vec::new();
        for p in faces.iter().flat_map(|f| f.points()) {
            if !vertices.contains(p) {
                vertices.push(*p);
            }
        }

        Ok(Self {
            faces,
            adjacency,
            vertices,
        })
    }

    fn with_topology(faces: Vec<Polygon>, loops: &[Vec<usize>], vertices: Vec<Point3<f64>>) -> Self {
        let he_mesh = HalfEdgeMesh::from_faces(loops);
        if he_mesh.non_manifold_edge_count() > 0 {
            debug!(
                edges = he_mesh.non_manifold_edge_count(),
                "non-manifold edges left unpaired"
            );
        }
        Self {
            faces,
            adjacency: he_mesh.face_adjacency(),
            vertices,
        }
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn face(&self, index: usize) -> &Polygon {
        &self.faces[index]
    }

    pub fn faces(&self) -> &[Polygon] {
        &self.faces
    }

    /// Distinct vertex positions
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn adjacent_face(&self, face: usize, edge: usize) -> Option<usize> {
        let row = &self.adjacency[face];
        row[edge % row.len()]
    }

    pub fn surface_area(&self) -> f64 {
        self.faces.iter().map(Polygon::area).sum()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use nalgebra::Vector3;

    #[test]
    fn test_cube_adjacency_is_closed() {
        let mesh = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), false).to_mesh();
        let polymesh = Polymesh::from_mesh(&mesh, 1e-9);

        assert_eq!(polymesh.num_faces(), 12);
        assert_eq!(polymesh.vertices().len(), 8);
        for face in 0..polymesh.num_faces() {
            for edge in 0..3 {
                let other = polymesh.adjacent_face(face, edge);
                assert!(other.is_some(), "face {} edge {} open", face, edge);
            }
        }
        assert!((polymesh.surface_area() - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_polygons_welds_corners() {
        let a = Polygon::triangle(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        );
        let b = Polygon::triangle(
            Point3::new(1.0, 1.0 + 1e-12, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        );
        let polymesh = Polymesh::from_polygons(vec![a, b], 1e-9);
        assert_eq!(polymesh.adjacent_face(0, 2), Some(1));
        assert_eq!(polymesh.adjacent_face(1, 2), Some(0));
        assert_eq!(polymesh.vertices().len(), 4);
    }

    #[test]
    fn test_with_adjacency_checks_shape() {
        let tri = Polygon::triangle(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let result = Polymesh::with_adjacency(vec![tri.clone()], vec![vec![None, None]]);
        assert!(matches!(result, Err(ShapeError::InvalidInput(_))));

        let result = Polymesh::with_adjacency(vec![tri], vec![vec![Some(3), None, None]]);
        assert!(matches!(result, Err(ShapeError::InvalidInput(_))));
    }

    #[test]
    fn test_bounding_box() {
        let mesh = Primitive::cube(Vector3::new(1.0, 2.0, 3.0), true).to_mesh();
        let bbox = Polymesh::from_mesh(&mesh, 1e-9).bounding_box();
        assert_eq!(bbox.max_extent(), 3.0);
    }
}
