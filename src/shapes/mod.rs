// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Shape detection stages: planes, rectangles, rings and cylinders

mod circle;
mod circles;
mod cylinder;
mod frame;
mod plane;
mod planes;
mod rectangles;
mod rings;

pub use circle::{Circle, Circle3};
pub use circles::{find_circles, CircleMatch};
pub use cylinder::{fit_cylinder, fit_cylinders, CylinderSection};
pub use frame::PlaneFrame;
pub use plane::{
    angle_between, angle_between_vectors, are_collinear, are_coplanar, are_coplanar_points,
    centroid, fit_plane_least_squares, Plane,
};
pub use planes::{find_planes, PlaneGroup, PlaneGrouping};
pub use rectangles::{find_rectangles, find_right_triangles, Rectangle, RectangleMask};
pub use rings::{find_rings, Ring, RingBoundary, RingMask, RingStatus};
