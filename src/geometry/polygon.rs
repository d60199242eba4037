// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Planar polygon faces

use crate::error::{ShapeError, ShapeResult};
use crate::shapes::{angle_between_vectors, Plane};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// Ordered vertex loop of a face. Edge `e` runs from vertex `e` to vertex `e + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point3<f64>>,
}

impl Polygon {
    /// Build a polygon from at least three points
    pub fn new(points: Vec<Point3<f64>>) -> ShapeResult<Self> {
        if points.len() < 3 {
            return Err(ShapeError::InvalidInput(format!(
                "a polygon needs at least 3 vertices, got {}",
                points.len()
            )));
        }
        Ok(Self { points })
    }

    pub fn triangle(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Self {
        Self {
            points: vec![a, b, c],
        }
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn point(&self, index: usize) -> &Point3<f64> {
        &self.points[index % self.points.len()]
    }

    /// Start and end of an edge
    pub fn edge_points(&self, edge: usize) -> (Point3<f64>, Point3<f64>) {
        (*self.point(edge), *self.point(edge + 1))
    }

    pub fn edge_vector(&self, edge: usize) -> Vector3<f64> {
        self.point(edge + 1) - self.point(edge)
    }

    pub fn edge_length(&self, edge: usize) -> f64 {
        self.edge_vector(edge).norm()
    }

    /// Index of the longest edge; the first one wins on ties
    pub fn longest_edge(&self) -> usize {
        let mut best = 0;
        let mut best_length = self.edge_length(0);
        for edge in 1..self.points.len() {
            let length = self.edge_length(edge);
            if length > best_length {
                best = edge;
                best_length = length;
            }
        }
        best
    }

    pub fn centroid(&self) -> Point3<f64> {
        let sum = self
            .points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / self.points.len() as f64)
    }

    /// Area as a fan of triangles around the centroid
    pub fn area(&self) -> f64 {
        let centroid = self.centroid();
        (0..self.points.len())
            .map(|i| {
                let to_centroid = centroid - self.point(i);
                0.5 * to_centroid.cross(&self.edge_vector(i)).norm()
            })
            .sum()
    }

    /// Unnormalized normal from the first two edges
    pub fn normal(&self) -> Vector3<f64> {
        self.edge_vector(0).cross(&(self.points[2] - self.points[0]))
    }

    pub fn fit_plane(&self) -> Plane {
        Plane::from_normal_and_point(&self.normal(), &self.points[0])
    }

    /// True for a triangle with one corner within `tolerance` of 90°.
    /// Polygons with more than three vertices, or with coincident corners,
    /// are never right triangles.
    pub fn is_right_triangle(&self, tolerance: f64) -> ShapeResult<bool> {
        if self.points.len() > 3 {
            return Ok(false);
        }
        if (0..3).any(|e| !(self.edge_vector(e).norm_squared() > 0.0)) {
            return Ok(false);
        }

        for i in 0..3 {
            let corner = self.points[i];
            let to_next = self.points[(i + 1) % 3] - corner;
            let to_prev = self.points[(i + 2) % 3] - corner;
            let angle = angle_between_vectors(&to_next, &to_prev)?;
            if (angle - FRAC_PI_2).abs() <= tolerance {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
