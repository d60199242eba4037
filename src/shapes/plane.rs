// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Plane algebra: construction, angles, coplanarity and least-squares fitting

use crate::error::{ShapeError, ShapeResult};
use nalgebra::{DMatrix, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Largest |cos| tolerated before clamping into [-1, 1]
const COSINE_SLACK: f64 = 1.0 + 5e-15;

/// Plane `a*x + b*y + c*z + d = 0` with `(a, b, c)` of unit length
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Plane {
    /// Plane through `point` with the given (not necessarily unit) normal.
    /// A zero normal gives a non-finite plane.
    pub fn from_normal_and_point(normal: &Vector3<f64>, point: &Point3<f64>) -> Self {
        let magnitude = normal.norm();
        let d = -normal.dot(&point.coords) / magnitude;
        Self {
            a: normal.x / magnitude,
            b: normal.y / magnitude,
            c: normal.z / magnitude,
            // -0.0 reads as 0.0 in every later sign test
            d: if d == 0.0 { 0.0 } else { d },
        }
    }

    /// Same as [`Plane::from_normal_and_point`] for raw coordinate slices.
    /// Only the first three coordinates are used.
    pub fn from_slices(normal: &[f64], point: &[f64]) -> ShapeResult<Self> {
        if normal.len() < 3 || point.len() < 3 {
            return Err(ShapeError::InvalidInput(format!(
                "plane needs 3-D normal and point, got {} and {} coordinates",
                normal.len(),
                point.len()
            )));
        }
        Ok(Self::from_normal_and_point(
            &Vector3::new(normal[0], normal[1], normal[2]),
            &Point3::new(point[0], point[1], point[2]),
        ))
    }

    /// Plane through three points. Collinear points give a non-finite plane;
    /// check with [`Plane::is_finite`].
    pub fn from_three_points(p1: &Point3<f64>, p2: &Point3<f64>, p3: &Point3<f64>) -> Self {
        let normal = (p2 - p1).cross(&(p3 - p1));
        Self::from_normal_and_point(&normal, p1)
    }

    pub fn normal(&self) -> Vector3<f64> {
        Vector3::new(self.a, self.b, self.c)
    }

    pub fn coefficients(&self) -> [f64; 4] {
        [self.a, self.b, self.c, self.d]
    }

    pub fn is_finite(&self) -> bool {
        self.coefficients().iter().all(|v| v.is_finite())
    }

    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal().dot(&point.coords) + self.d
    }

    /// Orthogonal projection of a point onto the plane
    pub fn project_point(&self, point: &Point3<f64>) -> Point3<f64> {
        point - self.normal() * self.signed_distance(point)
    }
}

/// Angle between two vectors in [0, π].
///
/// Cosines marginally outside [-1, 1] are clamped; anything further out, or a
/// zero-length input, is a [`ShapeError::DomainError`].
pub fn angle_between_vectors(a: &Vector3<f64>, b: &Vector3<f64>) -> ShapeResult<f64> {
    let cosine = a.dot(b) / (a.norm() * b.norm());
    if !cosine.is_finite() {
        return Err(ShapeError::DomainError(format!(
            "angle between {:?} and {:?} is undefined",
            a.as_slice(),
            b.as_slice()
        )));
    }
    if cosine.abs() > COSINE_SLACK {
        return Err(ShapeError::DomainError(format!(
            "cosine {} is outside [-1, 1]",
            cosine
        )));
    }
    Ok(cosine.clamp(-1.0, 1.0).acos())
}

/// Angle between the normals of two planes
pub fn angle_between(first: &Plane, second: &Plane) -> ShapeResult<f64> {
    angle_between_vectors(&first.normal(), &second.normal())
}

fn sign(value: f64) -> i8 {
    if value.abs() <= f64::EPSILON {
        0
    } else if value > 0.0 {
        1
    } else {
        -1
    }
}

/// Whether two planes describe the same surface.
///
/// The normals must be within `angle_tol` of parallel or anti-parallel, the
/// offsets must agree in magnitude within `dist_tol`, and the coefficients
/// must agree in sign either all the same way or all flipped. Zero
/// coefficients match anything. The sign test separates parallel planes at
/// the same distance on opposite sides of the origin.
pub fn are_coplanar(
    first: &Plane,
    second: &Plane,
    angle_tol: f64,
    dist_tol: f64,
) -> ShapeResult<bool> {
    let angle = angle_between(first, second)?;
    if angle > angle_tol && angle < std::f64::consts::PI - angle_tol {
        return Ok(false);
    }

    if (first.d.abs() - second.d.abs()).abs() > dist_tol {
        return Ok(false);
    }

    if first.d.abs() < f64::EPSILON && second.d.abs() < f64::EPSILON {
        return Ok(true);
    }

    let mut same = 0;
    let mut opposite = 0;
    for (x, y) in first.coefficients().iter().zip(second.coefficients()) {
        match sign(*x) * sign(y) {
            0 => {}
            s if s > 0 => same += 1,
            _ => opposite += 1,
        }
    }

    Ok(same == 0 || opposite == 0)
}

/// Four points are coplanar when the parallelepiped they span has (nearly) no volume
pub fn are_coplanar_points(
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    p3: &Point3<f64>,
    p4: &Point3<f64>,
    volume_tol: f64,
) -> bool {
    let volume = (p2 - p1).dot(&(p3 - p1).cross(&(p4 - p1)));
    volume.abs() < volume_tol
}

pub fn are_collinear(p1: &Point3<f64>, p2: &Point3<f64>, p3: &Point3<f64>, tol: f64) -> bool {
    (p2 - p1).cross(&(p3 - p1)).norm() < tol
}

pub fn centroid(points: &[Point3<f64>]) -> ShapeResult<Point3<f64>> {
    if points.is_empty() {
        return Err(ShapeError::InvalidInput(
            "centroid of an empty point set".to_string(),
        ));
    }
    let sum = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Ok(Point3::from(sum / points.len() as f64))
}

/// Orthogonal-distance plane fit.
///
/// The normal is the right singular vector of the centered point matrix with
/// the smallest singular value. Returns the centroid with the plane through it.
pub fn fit_plane_least_squares(points: &[Point3<f64>]) -> ShapeResult<(Point3<f64>, Plane)> {
    let center = centroid(points)?;

    // Zero rows leave the right singular vectors unchanged and guarantee
    // three of them for tiny point sets
    let rows = points.len().max(3);
    let centered = DMatrix::from_fn(rows, 3, |r, c| {
        points.get(r).map(|p| (p - center)[c]).unwrap_or(0.0)
    });

    let svd = centered.svd(false, true);
    let v_t = svd
        .v_t
        .ok_or_else(|| ShapeError::DomainError("SVD did not produce V^T".to_string()))?;
    let smallest = svd.singular_values.imin();
    let normal = Vector3::new(
        v_t[(smallest, 0)],
        v_t[(smallest, 1)],
        v_t[(smallest, 2)],
    );

    Ok((center, Plane::from_normal_and_point(&normal, &center)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    const TOL: f64 = 0.087266;

    #[test]
    fn test_normal_is_normalized() {
        let plane = Plane::from_normal_and_point(
            &Vector3::new(3.0, -4.0, 12.0),
            &Point3::new(1.0, 2.0, 3.0),
        );
        assert_relative_eq!(plane.normal().norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(
            plane.signed_distance(&Point3::new(1.0, 2.0, 3.0)),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_negative_zero_offset_is_cleared() {
        let plane = Plane::from_normal_and_point(&Vector3::z(), &Point3::origin());
        assert!(plane.d.is_sign_positive());
    }

    #[test]
    fn test_from_slices_requires_three_coordinates() {
        let result = Plane::from_slices(&[0.0, 1.0], &[0.0, 0.0, 0.0]);
        assert!(matches!(result, Err(ShapeError::InvalidInput(_))));
        let plane = Plane::from_slices(&[0.0, 0.0, 2.0, 9.0], &[0.0, 0.0, 1.0]).unwrap();
        assert_relative_eq!(plane.d, -1.0);
    }

    #[test]
    fn test_collinear_points_give_non_finite_plane() {
        let plane = Plane::from_three_points(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 1.0, 1.0),
            &Point3::new(2.0, 2.0, 2.0),
        );
        assert!(!plane.is_finite());
    }

    #[test]
    fn test_angle_between_vectors() {
        let angle = angle_between_vectors(&Vector3::x(), &Vector3::y()).unwrap();
        assert_relative_eq!(angle, FRAC_PI_2);
        let angle = angle_between_vectors(&Vector3::x(), &-Vector3::x()).unwrap();
        assert_relative_eq!(angle, PI);
    }

    #[test]
    fn test_angle_with_zero_vector_is_domain_error() {
        let result = angle_between_vectors(&Vector3::zeros(), &Vector3::x());
        assert!(matches!(result, Err(ShapeError::DomainError(_))));
    }

    #[test]
    fn test_flipped_plane_is_coplanar() {
        let p = Point3::new(0.0, 0.0, 2.0);
        let up = Plane::from_normal_and_point(&Vector3::new(0.0, 0.3, 1.0), &p);
        let down = Plane::from_normal_and_point(&Vector3::new(0.0, -0.3, -1.0), &p);
        assert!(are_coplanar(&up, &down, TOL, 1e-9).unwrap());
    }

    #[test]
    fn test_mirrored_parallel_planes_are_not_coplanar() {
        // z = 1 and z = -1 have equal |d|; only the sign test separates them
        let above = Plane::from_normal_and_point(&Vector3::z(), &Point3::new(0.0, 0.0, 1.0));
        let below = Plane::from_normal_and_point(&Vector3::z(), &Point3::new(0.0, 0.0, -1.0));
        assert!(!are_coplanar(&above, &below, TOL, 1e-9).unwrap());
    }

    #[test]
    fn test_coplanarity_is_symmetric() {
        let planes = [
            Plane::from_normal_and_point(&Vector3::z(), &Point3::new(0.0, 0.0, 1.0)),
            Plane::from_normal_and_point(&-Vector3::z(), &Point3::new(4.0, 0.0, 1.0)),
            Plane::from_normal_and_point(&Vector3::new(0.0, 0.05, 1.0), &Point3::new(0.0, 0.0, 1.0)),
            Plane::from_normal_and_point(&Vector3::x(), &Point3::new(1.0, 0.0, 0.0)),
            Plane::from_normal_and_point(&Vector3::z(), &Point3::new(0.0, 0.0, -1.0)),
            Plane::from_normal_and_point(&Vector3::z(), &Point3::origin()),
        ];
        for a in &planes {
            for b in &planes {
                assert_eq!(
                    are_coplanar(a, b, TOL, 1e-6).unwrap(),
                    are_coplanar(b, a, TOL, 1e-6).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_distance_tolerance() {
        let a = Plane::from_normal_and_point(&Vector3::z(), &Point3::new(0.0, 0.0, 1.0));
        let b = Plane::from_normal_and_point(&Vector3::z(), &Point3::new(0.0, 0.0, 1.001));
        assert!(!are_coplanar(&a, &b, TOL, 0.0).unwrap());
        assert!(are_coplanar(&a, &b, TOL, 0.01).unwrap());
    }

    #[test]
    fn test_coplanar_points() {
        let p1 = Point3::new(0.0, 0.0, 0.0);
        let p2 = Point3::new(1.0, 0.0, 0.0);
        let p3 = Point3::new(0.0, 1.0, 0.0);
        assert!(are_coplanar_points(&p1, &p2, &p3, &Point3::new(3.0, 7.0, 0.0), 1e-9));
        assert!(!are_coplanar_points(&p1, &p2, &p3, &Point3::new(0.0, 0.0, 1.0), 1e-9));
        assert!(are_collinear(&p1, &p2, &Point3::new(5.0, 0.0, 0.0), 1e-12));
    }

    #[test]
    fn test_least_squares_fit_tilted_plane() {
        let normal = Vector3::new(1.0, 2.0, 2.0).normalize();
        let u = Vector3::new(2.0, -1.0, 0.0).normalize();
        let v = normal.cross(&u);
        let origin = Point3::new(1.0, 1.0, 1.0);
        let points: Vec<_> = (0..12)
            .map(|i| {
                let t = i as f64;
                origin + u * t.cos() * 3.0 + v * (0.5 * t).sin() * 2.0
            })
            .collect();

        let (center, plane) = fit_plane_least_squares(&points).unwrap();
        assert_relative_eq!(plane.normal().dot(&normal).abs(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(plane.signed_distance(&origin), 0.0, epsilon = 1e-9);
        assert_relative_eq!(plane.signed_distance(&center), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_least_squares_fit_empty_is_invalid() {
        assert!(matches!(
            fit_plane_least_squares(&[]),
            Err(ShapeError::InvalidInput(_))
        ));
    }
}
