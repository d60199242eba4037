// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Brute-force search for circles through mesh vertices

use super::circle::Circle3;
use crate::config::DetectionConfig;
use crate::geometry::Polymesh;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Collinearity cutoff on the circumcircle cross product
const COLLINEAR_EPSILON: f64 = 1e-12;

/// A circumcircle is trivially supported by its three defining vertices
const MIN_SUPPORT: usize = 4;

/// A circle and the mesh vertices lying on it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleMatch {
    pub circle: Circle3,
    pub points: Vec<Point3<f64>>,
}

/// Visit every vertex triple in which one member's search sphere holds the
/// other two. Each triple is visited once, from the lowest such member.
fn for_each_triple(
    vertices: &[Point3<f64>],
    radius_sq: f64,
    mut visit: impl FnMut([usize; 3]),
) {
    let within = |a: usize, b: usize| (vertices[a] - vertices[b]).norm_squared() <= radius_sq;

    for i in 0..vertices.len() {
        let nearby: Vec<usize> = (0..vertices.len())
            .filter(|&j| j != i && within(i, j))
            .collect();

        for (n, &j) in nearby.iter().enumerate() {
            for &k in &nearby[n + 1..] {
                if (j < i || k < i) && within(j, k) {
                    continue;
                }
                visit([i, j, k]);
            }
        }
    }
}

/// Find circles passing through at least four mesh vertices.
///
/// Around every vertex, each pair of vertices inside a sphere of
/// `circle_search_fraction` times the largest bounding-box extent forms a
/// candidate circumcircle with it. Each candidate collects every vertex of
/// the mesh within `circle_match_tolerance` of it; equal circles are
/// reported once.
pub fn find_circles(mesh: &Polymesh, config: &DetectionConfig) -> Vec<CircleMatch> {
    let vertices = mesh.vertices();
    let search_radius = config.circle_search_fraction * mesh.bounding_box().max_extent();
    let tol = config.circle_match_tolerance;

    let mut found: Vec<CircleMatch> = Vec::new();
    for_each_triple(vertices, search_radius * search_radius, |[a, b, c]| {
        let Some(circle) = Circle3::through_three_points(
            &vertices[a],
            &vertices[b],
            &vertices[c],
            COLLINEAR_EPSILON,
        ) else {
            return;
        };
        if found.iter().any(|m| m.circle.matches(&circle, tol)) {
            return;
        }

        let points: Vec<Point3<f64>> = vertices
            .iter()
            .filter(|p| circle.contains(p, tol))
            .copied()
            .collect();
        if points.len() >= MIN_SUPPORT {
            found.push(CircleMatch { circle, points });
        }
    });

    debug!(
        circles = found.len(),
        search_radius, "circle search finished"
    );
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;
    use std::f64::consts::TAU;

    fn triples(points: &[Point3<f64>], radius: f64) -> Vec<[usize; 3]> {
        let mut seen = Vec::new();
        for_each_triple(points, radius * radius, |mut t| {
            t.sort_unstable();
            seen.push(t);
        });
        seen
    }

    #[test]
    fn test_each_triple_visited_once() {
        let square = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut seen = triples(&square, 2.0);
        seen.sort_unstable();
        assert_eq!(seen, vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]]);

        // Along a line only neighbours share a sphere
        let line: Vec<_> = (0..5).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
        let mut seen = triples(&line, 1.5);
        seen.sort_unstable();
        assert_eq!(seen, vec![[0, 1, 2], [1, 2, 3], [2, 3, 4]]);
    }

    #[test]
    fn test_short_shell_has_two_rim_circles() {
        // Rim spacing just under the 10% search radius
        let mesh = Primitive::cylinder_shell(0.1, 1.0, 32, TAU).to_mesh();
        let polymesh = Polymesh::from_mesh(&mesh, 1e-9);
        let found_all = find_circles(&polymesh, &DetectionConfig::default());

        // Facet rectangles are concyclic too, with four corners each
        assert!(found_all.iter().any(|c| c.points.len() == 4));
        let circles: Vec<_> = found_all.into_iter().filter(|c| c.points.len() > 4).collect();
        assert_eq!(circles.len(), 2);
        for found in &circles {
            assert_eq!(found.points.len(), 32);
            assert_relative_eq!(found.circle.radius, 1.0, epsilon = 1e-9);
            assert_relative_eq!(found.circle.normal.z.abs(), 1.0, epsilon = 1e-9);
        }
        let mut heights: Vec<f64> = circles.iter().map(|c| c.circle.center.z).collect();
        heights.sort_by(f64::total_cmp);
        assert_relative_eq!(heights[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(heights[1], 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_cube_face_corners_are_concyclic() {
        let mesh = Primitive::cube(nalgebra::Vector3::new(1.0, 1.0, 1.0), true).to_mesh();
        let polymesh = Polymesh::from_mesh(&mesh, 1e-9);
        let config = DetectionConfig {
            circle_search_fraction: 1.0,
            ..Default::default()
        };
        // Four corners of a face are concyclic
        let circles = find_circles(&polymesh, &config);
        assert!(circles.iter().all(|c| c.points.len() == 4));
        assert!(!circles.is_empty());
    }
}
