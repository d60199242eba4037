// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Rectangles made of two right triangles sharing their hypotenuse

use super::plane::{angle_between, angle_between_vectors};
use crate::config::DetectionConfig;
use crate::error::ShapeResult;
use crate::geometry::Polymesh;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::{debug, trace};

/// Two right-triangle faces forming a rectangle.
///
/// Each parallel edge pair holds `[edge on triangle1, edge on triangle2]`
/// as local edge indices; the two edges of a pair are opposite sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rectangle {
    pub triangle1: usize,
    pub triangle2: usize,
    pub hypotenuse1: usize,
    pub hypotenuse2: usize,
    pub parallel_edges1: [usize; 2],
    pub parallel_edges2: [usize; 2],
}

impl Rectangle {
    pub fn triangles(&self) -> [usize; 2] {
        [self.triangle1, self.triangle2]
    }

    /// Parallel edge pair 1 or 2 (any other value is treated as 2)
    pub fn parallel_edges(&self, pair: usize) -> [usize; 2] {
        if pair == 1 {
            self.parallel_edges1
        } else {
            self.parallel_edges2
        }
    }

    /// Slot (0 or 1) of `face` within this rectangle
    pub fn slot_of(&self, face: usize) -> Option<usize> {
        if face == self.triangle1 {
            Some(0)
        } else if face == self.triangle2 {
            Some(1)
        } else {
            None
        }
    }

    /// Lengths of the pair edges on each triangle
    pub fn side_lengths(&self, mesh: &Polymesh, pair: usize) -> [f64; 2] {
        let edges = self.parallel_edges(pair);
        [
            mesh.face(self.triangle1).edge_length(edges[0]),
            mesh.face(self.triangle2).edge_length(edges[1]),
        ]
    }
}

/// Face to rectangle lookup
#[derive(Debug, Clone, Default)]
pub struct RectangleMask {
    rect_of_face: Vec<Option<usize>>,
}

impl RectangleMask {
    pub fn from_rectangles(num_faces: usize, rectangles: &[Rectangle]) -> Self {
        let mut rect_of_face = vec![None; num_faces];
        for (index, rect) in rectangles.iter().enumerate() {
            rect_of_face[rect.triangle1] = Some(index);
            rect_of_face[rect.triangle2] = Some(index);
        }
        Self { rect_of_face }
    }

    pub fn rectangle_of(&self, face: usize) -> Option<usize> {
        self.rect_of_face.get(face).copied().flatten()
    }
}

/// Mark every face that is a right triangle
pub fn find_right_triangles(mesh: &Polymesh, tolerance: f64) -> ShapeResult<Vec<bool>> {
    mesh.faces()
        .iter()
        .map(|face| face.is_right_triangle(tolerance))
        .collect()
}

fn is_parallel(angle: f64, tolerance: f64) -> bool {
    angle < tolerance || angle > PI - tolerance
}

/// Pair right triangles across their hypotenuse into rectangles.
///
/// A pair is accepted only when the adjacency is symmetric across both
/// hypotenuses; one-sided or missing adjacency skips the candidate.
pub fn find_rectangles(
    mesh: &Polymesh,
    right_triangles: &[bool],
    config: &DetectionConfig,
) -> ShapeResult<Vec<Rectangle>> {
    let mut rectangles = Vec::new();
    let mut consumed = vec![false; mesh.num_faces()];

    for face in 0..mesh.num_faces() {
        if !right_triangles[face] || consumed[face] {
            continue;
        }

        let tri1 = mesh.face(face);
        let h1 = tri1.longest_edge();
        let Some(adj) = mesh.adjacent_face(face, h1) else {
            continue;
        };
        if adj <= face || !right_triangles[adj] || consumed[adj] {
            continue;
        }

        let tri2 = mesh.face(adj);
        let h2 = tri2.longest_edge();
        if mesh.adjacent_face(adj, h2) != Some(face) {
            trace!(face, adj, "asymmetric hypotenuse adjacency, skipping");
            continue;
        }

        // The halves already share the hypotenuse, so only the normals are
        // compared; plane offsets drift with coordinate rounding far from
        // the origin
        let fold = angle_between(&tri1.fit_plane(), &tri2.fit_plane())?;
        if !is_parallel(fold, config.coplanar_angle_tolerance) {
            continue;
        }

        // Legs seen from the corner opposite the hypotenuse: edge (h + 2)
        // ends at that corner, edge (h + 1) starts there
        let leg = |tri: &crate::geometry::Polygon, h: usize| {
            let corner = tri.point(h + 2);
            (tri.point(h) - corner, tri.point(h + 1) - corner)
        };
        let (e11, e12) = leg(tri1, h1);
        let (e21, e22) = leg(tri2, h2);
        let tol = config.parallel_angle_tolerance;

        let straight = (
            [(h1 + 2) % 3, (h2 + 2) % 3],
            [(h1 + 1) % 3, (h2 + 1) % 3],
        );
        let crossed = (
            [(h1 + 2) % 3, (h2 + 1) % 3],
            [(h1 + 1) % 3, (h2 + 2) % 3],
        );

        let pairing = if is_parallel(angle_between_vectors(&e11, &e21)?, tol) {
            Some(straight)
        } else if is_parallel(angle_between_vectors(&e11, &e22)?, tol) {
            Some(crossed)
        } else if is_parallel(angle_between_vectors(&e12, &e21)?, tol) {
            Some(crossed)
        } else if is_parallel(angle_between_vectors(&e12, &e22)?, tol) {
            Some(straight)
        } else {
            None
        };

        if let Some((parallel_edges1, parallel_edges2)) = pairing {
            consumed[face] = true;
            consumed[adj] = true;
            rectangles.push(Rectangle {
                triangle1: face,
                triangle2: adj,
                hypotenuse1: h1,
                hypotenuse2: h2,
                parallel_edges1,
                parallel_edges2,
            });
        }
    }

    debug!(rectangles = rectangles.len(), "rectangle detection finished");
    Ok(rectangles)
}
