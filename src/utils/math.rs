// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Point comparison helpers

use nalgebra::Point3;
use std::cmp::Ordering;

/// Check if two points coincide within epsilon
pub fn points_coincide(a: &Point3<f64>, b: &Point3<f64>, epsilon: f64) -> bool {
    (a - b).norm() <= epsilon
}

/// Lexicographic ordering on (x, y, z)
pub fn lexicographic_cmp(a: &Point3<f64>, b: &Point3<f64>) -> Ordering {
    a.x.total_cmp(&b.x)
        .then(a.y.total_cmp(&b.y))
        .then(a.z.total_cmp(&b.z))
}
