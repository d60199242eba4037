// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Indexed triangle mesh

use super::BoundingBox;
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Vertex with position and normal
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self { position, normal }
    }

    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        self.position = matrix.transform_point(&self.position);
        // Normals go through the inverse transpose
        let normal_matrix = matrix
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or(*matrix);
        self.normal = normal_matrix.transform_vector(&self.normal).normalize();
    }
}

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

/// Triangular mesh as loaded from disk or generated
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a triangle
    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Transform all vertices by a matrix
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for vertex in &mut self.vertices {
            vertex.transform(matrix);
        }
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices.iter().map(|v| &v.position))
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get triangle count
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Positions of the three corners of a triangle
    pub fn triangle_positions(&self, triangle: &Triangle) -> [Point3<f64>; 3] {
        [
            self.vertices[triangle.indices[0]].position,
            self.vertices[triangle.indices[1]].position,
            self.vertices[triangle.indices[2]].position,
        ]
    }

    /// Append another mesh without any welding
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);

        for triangle in &other.triangles {
            self.triangles.push(Triangle::new([
                triangle.indices[0] + offset,
                triangle.indices[1] + offset,
                triangle.indices[2] + offset,
            ]));
        }
    }

    /// Weld vertices that are within epsilon distance of each other.
    /// Returns the number of vertices removed.
    pub fn weld_vertices(&mut self, epsilon: f64) -> usize {
        if self.vertices.is_empty() {
            return 0;
        }

        let original_count = self.vertices.len();
        let mut new_vertices: Vec<Vertex> = Vec::new();
        let mut new_indices: Vec<usize> = vec![0; original_count];

        for (i, vertex) in self.vertices.iter().enumerate() {
            let existing = new_vertices
                .iter()
                .position(|kept| (vertex.position - kept.position).norm() <= epsilon);

            new_indices[i] = match existing {
                Some(j) => j,
                None => {
                    new_vertices.push(*vertex);
                    new_vertices.len() - 1
                }
            };
        }

        for triangle in &mut self.triangles {
            for index in &mut triangle.indices {
                *index = new_indices[*index];
            }
        }

        self.vertices = new_vertices;

        original_count - self.vertices.len()
    }

    /// Drop triangles that collapsed to a line or a point after welding
    pub fn remove_degenerate_triangles(&mut self) -> usize {
        let before = self.triangles.len();
        self.triangles.retain(|t| {
            let [a, b, c] = t.indices;
            a != b && b != c && a != c
        });
        before - self.triangles.len()
    }

    /// Recompute vertex normals as area-weighted face normal averages
    pub fn recompute_normals(&mut self) {
        if self.vertices.is_empty() || self.triangles.is_empty() {
            return;
        }

        let mut normal_sums: Vec<Vector3<f64>> = vec![Vector3::zeros(); self.vertices.len()];

        for triangle in &self.triangles {
            let [p0, p1, p2] = self.triangle_positions(triangle);
            // Unnormalized cross product already carries the area weight
            let face_normal = (p1 - p0).cross(&(p2 - p0));
            if face_normal.norm() > 1e-10 {
                for &idx in &triangle.indices {
                    normal_sums[idx] += face_normal;
                }
            }
        }

        for (vertex, sum) in self.vertices.iter_mut().zip(normal_sums) {
            vertex.normal = sum.try_normalize(1e-12).unwrap_or_else(Vector3::z);
        }
    }
}
