// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Local 2-D frame of a planar point set

use crate::error::{ShapeError, ShapeResult};
use nalgebra::{Matrix4, Point2, Point3, Vector3};

/// Rigid transform chain that maps a plane onto z = 0.
///
/// The chain is a translation of the first point to the origin, followed
/// (unless the normal is already along z) by a rotation about y and a
/// rotation about x that bring the normal onto +z.
#[derive(Debug, Clone)]
pub struct PlaneFrame {
    transforms: Vec<Matrix4<f64>>,
    points: Vec<Point2<f64>>,
}

impl PlaneFrame {
    /// Build the frame for `points` lying in the plane with `normal` and
    /// project them. Fails if a transformed point is further than
    /// `z_tolerance` from z = 0.
    pub fn new(points: &[Point3<f64>], normal: &Vector3<f64>, z_tolerance: f64) -> ShapeResult<Self> {
        let origin = points.first().ok_or_else(|| {
            ShapeError::InvalidInput("cannot build a frame for an empty point set".to_string())
        })?;

        let mut transforms = vec![Matrix4::new_translation(&-origin.coords)];

        if normal.x != 0.0 || normal.y != 0.0 {
            // Rotate about y until the normal has no x component. The
            // direction cosines give the rotation exactly, even for a
            // normal a hair away from z
            let h = normal.x.hypot(normal.z);
            let (sin_y, cos_y) = if normal.x != 0.0 {
                (normal.x / h, normal.z / h)
            } else {
                (0.0, 1.0)
            };
            #[rustfmt::skip]
            let rotate_y = Matrix4::new(
                cos_y, 0.0, -sin_y, 0.0,
                0.0,   1.0, 0.0,    0.0,
                sin_y, 0.0, cos_y,  0.0,
                0.0,   0.0, 0.0,    1.0,
            );

            // Then about x until it has no y component
            let tilted = rotate_y.transform_vector(normal);
            let length = tilted.norm();
            if !(length > 0.0) {
                return Err(ShapeError::DomainError(format!(
                    "plane normal {:?} has no direction",
                    normal.as_slice()
                )));
            }
            let (sin_x, cos_x) = (-tilted.y / length, tilted.z / length);
            #[rustfmt::skip]
            let rotate_x = Matrix4::new(
                1.0, 0.0,    0.0,   0.0,
                0.0, cos_x,  sin_x, 0.0,
                0.0, -sin_x, cos_x, 0.0,
                0.0, 0.0,    0.0,   1.0,
            );

            transforms.push(rotate_y);
            transforms.push(rotate_x);
        }

        let mut frame = Self {
            transforms,
            points: Vec::with_capacity(points.len()),
        };
        for point in points {
            let flat = frame.forward().transform_point(point);
            if flat.z.abs() > z_tolerance {
                return Err(ShapeError::DomainError(format!(
                    "point {:?} is {:e} off the plane after projection",
                    point.coords.as_slice(),
                    flat.z
                )));
            }
            frame.points.push(Point2::new(flat.x, flat.y));
        }

        Ok(frame)
    }

    fn forward(&self) -> Matrix4<f64> {
        self.transforms
            .iter()
            .fold(Matrix4::identity(), |acc, step| step * acc)
    }

    /// The projected points, in input order
    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    /// Map a 3-D point into the frame, dropping z
    pub fn project_to_xy(&self, point: &Point3<f64>) -> Point2<f64> {
        let flat = self.forward().transform_point(point);
        Point2::new(flat.x, flat.y)
    }

    /// Map a frame point back onto the 3-D plane by undoing the chain in
    /// reverse order
    pub fn translate_xy_point_to_3d_plane(&self, point: &Point2<f64>) -> ShapeResult<Point3<f64>> {
        let mut current = Point3::new(point.x, point.y, 0.0);
        for step in self.transforms.iter().rev() {
            let inverse = step.try_inverse().ok_or_else(|| {
                ShapeError::DomainError("plane frame transform is singular".to_string())
            })?;
            current = inverse.transform_point(&current);
        }
        Ok(current)
    }
}
