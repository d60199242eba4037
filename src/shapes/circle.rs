// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Circles in the plane and in space

use crate::error::{ShapeError, ShapeResult};
use nalgebra::{DMatrix, DVector, Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Singular values below this share of the largest one mark a degenerate fit
const RANK_EPSILON: f64 = 1e-12;

/// A circle in a 2-D frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2<f64>,
    pub radius: f64,
}

impl Circle {
    /// Algebraic least-squares circle fit.
    ///
    /// Solves `x² + y² + Dx + Ey + F = 0` over all points in the least-squares
    /// sense. Exact for points on a circle; needs three non-collinear points.
    pub fn fit(points: &[Point2<f64>]) -> ShapeResult<Self> {
        if points.len() < 3 {
            return Err(ShapeError::DomainError(format!(
                "circle fit needs at least 3 points, got {}",
                points.len()
            )));
        }

        let a = DMatrix::from_fn(points.len(), 3, |r, c| match c {
            0 => points[r].x,
            1 => points[r].y,
            _ => 1.0,
        });
        let b = DVector::from_iterator(
            points.len(),
            points.iter().map(|p| -(p.x * p.x + p.y * p.y)),
        );

        let svd = a.svd(true, true);
        let largest = svd.singular_values.max();
        if svd.singular_values.min() <= largest * RANK_EPSILON {
            return Err(ShapeError::DomainError(
                "circle fit points are collinear".to_string(),
            ));
        }
        let solution = svd
            .solve(&b, RANK_EPSILON)
            .map_err(|e| ShapeError::DomainError(e.to_string()))?;

        let center = Point2::new(-solution[0] / 2.0, -solution[1] / 2.0);
        let radius_sq = center.coords.norm_squared() - solution[2];
        if !radius_sq.is_finite() || radius_sq <= 0.0 {
            return Err(ShapeError::DomainError(format!(
                "circle fit produced squared radius {}",
                radius_sq
            )));
        }

        Ok(Self {
            center,
            radius: radius_sq.sqrt(),
        })
    }
}

/// A circle in space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle3 {
    pub center: Point3<f64>,
    /// Unit normal of the circle's plane
    pub normal: Vector3<f64>,
    pub radius: f64,
}

impl Circle3 {
    /// Circumcircle of a triangle, `None` when the points are collinear
    /// within `epsilon` (measured on the cross product length)
    pub fn through_three_points(
        p1: &Point3<f64>,
        p2: &Point3<f64>,
        p3: &Point3<f64>,
        epsilon: f64,
    ) -> Option<Self> {
        let a = p2 - p1;
        let c = p3 - p1;
        let cross = a.cross(&c);
        let cross_len = cross.norm();
        if cross_len <= epsilon {
            return None;
        }

        let b = p3 - p2;
        let radius = a.norm() * b.norm() * c.norm() / (2.0 * cross_len);
        let offset = (a.norm_squared() * c - c.norm_squared() * a).cross(&cross)
            / (2.0 * cross_len * cross_len);

        Some(Self {
            center: p1 + offset,
            normal: cross / cross_len,
            radius,
        })
    }

    /// Whether `point` lies on this circle within `tolerance`
    pub fn contains(&self, point: &Point3<f64>, tolerance: f64) -> bool {
        let offset = point - self.center;
        let height = offset.dot(&self.normal);
        height.abs() <= tolerance && (offset.norm() - self.radius).abs() <= tolerance
    }

    /// Same circle up to `tolerance`, regardless of normal direction
    pub fn matches(&self, other: &Circle3, tolerance: f64) -> bool {
        (self.center - other.center).norm() <= tolerance
            && (self.radius - other.radius).abs() <= tolerance
            && self.normal.cross(&other.normal).norm() <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::TAU;

    fn ring_points(cx: f64, cy: f64, r: f64, n: usize) -> Vec<Point2<f64>> {
        (0..n)
            .map(|i| {
                let a = TAU * i as f64 / n as f64 + 0.3;
                Point2::new(cx + r * a.cos(), cy + r * a.sin())
            })
            .collect()
    }

    #[test]
    fn test_fit_exact_circle() {
        let points = ring_points(3.0, -2.0, 1.5, 16);
        let circle = Circle::fit(&points).unwrap();
        assert_relative_eq!(circle.center, Point2::new(3.0, -2.0), epsilon = 1e-9);
        assert_relative_eq!(circle.radius, 1.5, epsilon = 1e-9);
    }

    #[test]
    fn test_fit_partial_arc() {
        // A quarter arc still pins down the circle
        let points: Vec<_> = (0..5)
            .map(|i| {
                let a = 0.25 * TAU * i as f64 / 4.0;
                Point2::new(2.0 * a.cos(), 2.0 * a.sin())
            })
            .collect();
        let circle = Circle::fit(&points).unwrap();
        assert_relative_eq!(circle.radius, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fit_rejects_collinear_and_short_input() {
        let line: Vec<_> = (0..4).map(|i| Point2::new(i as f64, 2.0 * i as f64)).collect();
        assert!(matches!(Circle::fit(&line), Err(ShapeError::DomainError(_))));
        assert!(Circle::fit(&line[..2]).is_err());
    }

    #[test]
    fn test_circumcircle() {
        let circle = Circle3::through_three_points(
            &Point3::new(1.0, 0.0, 2.0),
            &Point3::new(0.0, 1.0, 2.0),
            &Point3::new(-1.0, 0.0, 2.0),
            1e-12,
        )
        .unwrap();
        assert_relative_eq!(circle.center, Point3::new(0.0, 0.0, 2.0), epsilon = 1e-12);
        assert_relative_eq!(circle.radius, 1.0, epsilon = 1e-12);
        assert_relative_eq!(circle.normal.z.abs(), 1.0, epsilon = 1e-12);
        assert!(circle.contains(&Point3::new(0.0, -1.0, 2.0), 1e-9));
        assert!(!circle.contains(&Point3::new(0.0, -1.0, 2.1), 1e-9));
    }

    #[test]
    fn test_circumcircle_of_collinear_points() {
        let p = Point3::new(0.0, 0.0, 0.0);
        let q = Point3::new(1.0, 1.0, 1.0);
        let r = Point3::new(2.0, 2.0, 2.0);
        assert!(Circle3::through_three_points(&p, &q, &r, 1e-12).is_none());
    }

    #[test]
    fn test_matches_ignores_normal_direction() {
        let up = Circle3 {
            center: Point3::origin(),
            normal: Vector3::z(),
            radius: 1.0,
        };
        let down = Circle3 {
            normal: -Vector3::z(),
            ..up
        };
        assert!(up.matches(&down, 1e-9));
        assert!(!up.matches(&Circle3 { radius: 1.1, ..up }, 1e-9));
    }
}
