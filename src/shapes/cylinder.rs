// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Fitting cylinder sections to accepted rings

use super::circle::Circle;
use super::frame::PlaneFrame;
use super::plane::{angle_between_vectors, fit_plane_least_squares, Plane};
use super::rectangles::{Rectangle, RectangleMask};
use super::rings::Ring;
use crate::config::DetectionConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{ShapeError, ShapeResult};
use crate::geometry::Polymesh;
use crate::utils::math::{lexicographic_cmp, points_coincide};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::f64::consts::{PI, TAU};
use tracing::debug;

/// A fitted cylinder section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CylinderSection {
    pub top_center: Point3<f64>,
    pub bottom_center: Point3<f64>,
    pub radius: f64,
    /// Signed sweep in radians; negative when the ring turns clockwise
    /// seen from the top
    pub angle: f64,
    /// Bottom rim point where the section ends
    pub start_point: Point3<f64>,
    /// Bottom rim point at the other end
    pub end_point: Point3<f64>,
    pub face_indices: Vec<usize>,
}

impl CylinderSection {
    pub fn height(&self) -> f64 {
        (self.top_center - self.bottom_center).norm()
    }

    pub fn is_full_turn(&self, tolerance: f64) -> bool {
        (self.angle.abs() - TAU).abs() <= tolerance
    }
}

/// Rim vertex sets of a ring
#[derive(Debug, Default)]
struct Rims {
    top: Vec<Point3<f64>>,
    bottom: Vec<Point3<f64>>,
    epsilon: f64,
}

impl Rims {
    fn in_set(set: &[Point3<f64>], point: &Point3<f64>, epsilon: f64) -> bool {
        set.iter().any(|p| points_coincide(p, point, epsilon))
    }

    fn in_top(&self, point: &Point3<f64>) -> bool {
        Self::in_set(&self.top, point, self.epsilon)
    }

    fn in_bottom(&self, point: &Point3<f64>) -> bool {
        Self::in_set(&self.bottom, point, self.epsilon)
    }

    fn is_known(&self, point: &Point3<f64>) -> bool {
        self.in_top(point) || self.in_bottom(point)
    }

    fn push_top(&mut self, point: Point3<f64>) {
        if !self.in_top(&point) {
            self.top.push(point);
        }
    }

    fn push_bottom(&mut self, point: Point3<f64>) {
        if !self.in_bottom(&point) {
            self.bottom.push(point);
        }
    }

    /// A rim edge touches one set and stays clear of the other
    fn touches_only(&self, edge: &[Point3<f64>; 2], top: bool) -> bool {
        let (own, other): (&[Point3<f64>], &[Point3<f64>]) = if top {
            (&self.top, &self.bottom)
        } else {
            (&self.bottom, &self.top)
        };
        edge.iter().any(|p| Self::in_set(own, p, self.epsilon))
            && !edge.iter().any(|p| Self::in_set(other, p, self.epsilon))
    }
}

fn edge_of(mesh: &Polymesh, face: usize, edge: usize) -> [Point3<f64>; 2] {
    let (a, b) = mesh.face(face).edge_points(edge);
    [a, b]
}

fn rectangle_at<'r>(
    rectangles: &'r [Rectangle],
    mask: &RectangleMask,
    face: usize,
) -> ShapeResult<&'r Rectangle> {
    mask.rectangle_of(face)
        .and_then(|index| rectangles.get(index))
        .ok_or_else(|| ShapeError::MalformedMesh(format!("ring face {} is not in a rectangle", face)))
}

/// Split the ring's vertices into top and bottom rims
fn split_rims(
    mesh: &Polymesh,
    rectangles: &[Rectangle],
    mask: &RectangleMask,
    ring: &Ring,
    epsilon: f64,
) -> ShapeResult<Rims> {
    let faces = &ring.face_indices;
    if faces.len() < 4 || faces.len() % 2 != 0 {
        return Err(ShapeError::MalformedMesh(format!(
            "ring has {} faces, expected an even count of at least 4",
            faces.len()
        )));
    }

    let seed = rectangle_at(rectangles, mask, faces[0])?;
    let [t1, t2] = seed.triangles();
    if faces[1] != t2 && faces[1] != t1 {
        return Err(ShapeError::MalformedMesh(format!(
            "ring faces {} and {} are not one rectangle",
            faces[0], faces[1]
        )));
    }

    // The pair crossed by the walk leads to the third ring face; the other
    // pair holds the rim edges
    let third = Some(faces[2]);
    let walk_pair = [1, 2].into_iter().find(|&pair| {
        let edges = seed.parallel_edges(pair);
        mesh.adjacent_face(t1, edges[0]) == third || mesh.adjacent_face(t2, edges[1]) == third
    });
    let Some(walk_pair) = walk_pair else {
        return Err(ShapeError::MalformedMesh(format!(
            "ring face {} is not adjacent to the seed rectangle",
            faces[2]
        )));
    };
    let rim_edges = seed.parallel_edges(3 - walk_pair);

    let mut rims = Rims {
        epsilon,
        ..Default::default()
    };
    for p in edge_of(mesh, t1, rim_edges[0]) {
        rims.push_top(p);
    }
    for p in edge_of(mesh, t2, rim_edges[1]) {
        rims.push_bottom(p);
    }

    for halves in faces[2..].chunks(2) {
        let rect = rectangle_at(rectangles, mask, halves[0])?;
        if rect.slot_of(halves[1]).is_none() {
            return Err(ShapeError::MalformedMesh(format!(
                "ring faces {} and {} are not one rectangle",
                halves[0], halves[1]
            )));
        }

        let all_known = mesh
            .face(rect.triangle1)
            .points()
            .iter()
            .chain(mesh.face(rect.triangle2).points())
            .all(|p| rims.is_known(p));
        if all_known {
            continue;
        }

        let mut matched = false;
        for pair in [1, 2] {
            let edges = rect.parallel_edges(pair);
            let first = edge_of(mesh, rect.triangle1, edges[0]);
            let second = edge_of(mesh, rect.triangle2, edges[1]);

            let (top, bottom) = if rims.touches_only(&first, true) && rims.touches_only(&second, false)
            {
                (first, second)
            } else if rims.touches_only(&first, false) && rims.touches_only(&second, true) {
                (second, first)
            } else {
                continue;
            };

            for p in top {
                rims.push_top(p);
            }
            for p in bottom {
                rims.push_bottom(p);
            }
            matched = true;
            break;
        }

        if !matched {
            return Err(ShapeError::MalformedMesh(format!(
                "rectangle of faces {} and {} shares no rim vertex with the ring",
                rect.triangle1, rect.triangle2
            )));
        }
    }

    if let (Some(top), Some(bottom)) = (rims.top.first(), rims.bottom.first()) {
        if lexicographic_cmp(top, bottom) == Ordering::Less {
            std::mem::swap(&mut rims.top, &mut rims.bottom);
        }
    }

    Ok(rims)
}

/// Circle through one rim, with its center in 3-D and the rim plane
fn fit_rim(
    points: &[Point3<f64>],
    config: &DetectionConfig,
) -> ShapeResult<(Point3<f64>, f64, Plane)> {
    let (_, plane) = fit_plane_least_squares(points)?;
    let projected: Vec<Point3<f64>> = points.iter().map(|p| plane.project_point(p)).collect();

    let frame = PlaneFrame::new(&projected, &plane.normal(), config.projection_epsilon)?;
    let circle = Circle::fit(frame.points())?;
    let center = frame.translate_xy_point_to_3d_plane(&circle.center)?;
    Ok((center, circle.radius, plane))
}

/// Fit the cylinder section described by `ring`.
///
/// Rim vertices that cannot be matched between neighbouring rectangles make
/// the ring unusable and are reported as `MalformedMesh`. An orientation
/// check that is not clearly aligned with the axis becomes a diagnostic.
pub fn fit_cylinder(
    mesh: &Polymesh,
    rectangles: &[Rectangle],
    mask: &RectangleMask,
    ring_index: usize,
    ring: &Ring,
    config: &DetectionConfig,
    diagnostics: &mut Diagnostics,
) -> ShapeResult<CylinderSection> {
    let rims = split_rims(mesh, rectangles, mask, ring, config.weld_epsilon)?;
    let (top_center, top_radius, _) = fit_rim(&rims.top, config)?;
    let (bottom_center, bottom_radius, bottom_plane) = fit_rim(&rims.bottom, config)?;

    // Each axial boundary edge has exactly one bottom endpoint
    let bottom_point = |edge: &[Point3<f64>; 2]| -> ShapeResult<Point3<f64>> {
        let point = edge
            .iter()
            .find(|p| rims.in_bottom(p))
            .ok_or_else(|| {
                ShapeError::MalformedMesh(format!(
                    "ring {} boundary edge has no bottom rim vertex",
                    ring_index
                ))
            })?;
        Ok(bottom_plane.project_point(point))
    };
    let near = bottom_point(&ring.boundary.near_edge)?;
    let inner = bottom_point(&ring.boundary.inner_edge)?;
    let far = bottom_point(&ring.boundary.far_edge)?;

    let to_near = near - bottom_center;
    let to_far = far - bottom_center;
    let mut sweep = angle_between_vectors(&to_near, &to_far)?;
    if ring.total_angle > PI {
        sweep = TAU - sweep;
    }

    let axis = top_center - bottom_center;
    let turn = to_near.cross(&(inner - bottom_center));
    let magnitude = turn.norm() * axis.norm();
    let dot = turn.dot(&axis);
    let cosine = if magnitude > 0.0 { dot / magnitude } else { 0.0 };

    let eps = config.orientation_epsilon;
    let negative = if (cosine + 1.0).abs() <= eps {
        true
    } else if (cosine - 1.0).abs() <= eps {
        false
    } else {
        diagnostics.report(Diagnostic::AmbiguousOrientation {
            ring: ring_index,
            cosine,
        });
        dot < 0.0
    };
    let angle = if negative { -sweep } else { sweep };

    debug!(
        ring = ring_index,
        radius = (top_radius + bottom_radius) / 2.0,
        angle,
        "cylinder fitted"
    );

    Ok(CylinderSection {
        top_center,
        bottom_center,
        radius: (top_radius + bottom_radius) / 2.0,
        angle,
        start_point: near,
        end_point: far,
        face_indices: ring.face_indices.clone(),
    })
}

/// Fit every ring; the first failure stops the run
pub fn fit_cylinders(
    mesh: &Polymesh,
    rectangles: &[Rectangle],
    mask: &RectangleMask,
    rings: &[Ring],
    config: &DetectionConfig,
    diagnostics: &mut Diagnostics,
) -> ShapeResult<Vec<CylinderSection>> {
    rings
        .iter()
        .enumerate()
        .map(|(index, ring)| fit_cylinder(mesh, rectangles, mask, index, ring, config, diagnostics))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Polygon, Primitive};
    use crate::shapes::rectangles::{find_rectangles, find_right_triangles};
    use crate::shapes::rings::{find_rings, RingMask};
    use approx::assert_relative_eq;
    use nalgebra::{Matrix4, Rotation3, Vector3};

    struct Fitted {
        sections: Vec<CylinderSection>,
        diagnostics: Diagnostics,
    }

    fn fit_all(polymesh: &Polymesh) -> Fitted {
        let config = DetectionConfig::default();
        let right = find_right_triangles(polymesh, config.right_angle_tolerance).unwrap();
        let rectangles = find_rectangles(polymesh, &right, &config).unwrap();
        let mask = RectangleMask::from_rectangles(polymesh.num_faces(), &rectangles);
        let mut ring_mask = RingMask::new(rectangles.len());
        let mut diagnostics = Diagnostics::new();
        let rings = find_rings(
            polymesh,
            &rectangles,
            &mask,
            &mut ring_mask,
            &config,
            &mut diagnostics,
        )
        .unwrap();
        let sections =
            fit_cylinders(polymesh, &rectangles, &mask, &rings, &config, &mut diagnostics).unwrap();
        Fitted {
            sections,
            diagnostics,
        }
    }

    fn shell(segments: u32, sweep: f64, transform: Option<Matrix4<f64>>) -> Polymesh {
        let mut mesh = Primitive::cylinder_shell(2.0, 1.5, segments, sweep).to_mesh();
        if let Some(matrix) = transform {
            mesh.transform(&matrix);
        }
        Polymesh::from_mesh(&mesh, 1e-9)
    }

    #[test]
    fn test_closed_ring_fits_full_cylinder() {
        let fitted = fit_all(&shell(12, TAU, None));
        assert_eq!(fitted.sections.len(), 1);
        assert!(fitted.diagnostics.is_empty());

        let section = &fitted.sections[0];
        assert_relative_eq!(section.radius, 1.5, epsilon = 1e-9);
        assert_relative_eq!(section.height(), 2.0, epsilon = 1e-9);
        assert_relative_eq!(section.top_center, Point3::new(0.0, 0.0, 2.0), epsilon = 1e-9);
        assert_relative_eq!(section.bottom_center, Point3::origin(), epsilon = 1e-9);
        assert!(section.is_full_turn(1e-6));
        assert_eq!(section.face_indices.len(), 24);
    }

    #[test]
    fn test_half_cylinder_sweep() {
        let fitted = fit_all(&shell(4, PI, None));
        assert_eq!(fitted.sections.len(), 1);
        let section = &fitted.sections[0];
        assert_relative_eq!(section.angle.abs(), PI, epsilon = 1e-6);
        assert_relative_eq!(section.radius, 1.5, epsilon = 1e-9);
        // Start and end lie on the bottom rim, on opposite sides
        assert_relative_eq!(section.start_point.z, 0.0, epsilon = 1e-9);
        assert_relative_eq!(
            (section.start_point - section.end_point).norm(),
            3.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_leaning_axis_is_reported() {
        // Shearing the top rim sideways by 0.01 keeps every facet a
        // rectangle within tolerance but tilts the axis off the rim normal
        #[rustfmt::skip]
        let shear = Matrix4::new(
            1.0, 0.0, 0.005, 0.0,
            0.0, 1.0, 0.0,   0.0,
            0.0, 0.0, 1.0,   0.0,
            0.0, 0.0, 0.0,   1.0,
        );
        let plain = fit_all(&shell(8, PI, None));
        let leaning = fit_all(&shell(8, PI, Some(shear)));
        assert_eq!(leaning.sections.len(), 1);

        match leaning.diagnostics.entries() {
            [Diagnostic::AmbiguousOrientation { ring, cosine }] => {
                assert_eq!(*ring, 0);
                assert!((cosine.abs() - 1.0).abs() > 1e-6);
                assert!(cosine.abs() > 0.99);
            }
            other => panic!("expected an orientation diagnostic, got {:?}", other),
        }
        // The sign of the dot product still decides
        assert!(leaning.sections[0].angle * plain.sections[0].angle > 0.0);
        assert_relative_eq!(leaning.sections[0].angle.abs(), PI, epsilon = 1e-6);
    }

    #[test]
    fn test_near_z_tilt_fits() {
        // A tilt so small that its cosine rounds to one
        let tilt = Rotation3::from_axis_angle(&Vector3::x_axis(), 1e-8).to_homogeneous();
        let mut mesh = Primitive::cylinder_shell(2.0, 10.0, 24, TAU).to_mesh();
        mesh.transform(&tilt);
        let fitted = fit_all(&Polymesh::from_mesh(&mesh, 1e-9));
        assert_eq!(fitted.sections.len(), 1);
        assert_relative_eq!(fitted.sections[0].radius, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mirrored_winding_flips_sign() {
        let mirror = Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, -1.0, 1.0));
        let plain = fit_all(&shell(6, PI, None));
        let mirrored = fit_all(&shell(6, PI, Some(mirror)));
        assert_eq!(plain.sections.len(), 1);
        assert_eq!(mirrored.sections.len(), 1);

        let a = plain.sections[0].angle;
        let b = mirrored.sections[0].angle;
        assert!(a * b < 0.0, "angles {} and {} share a sign", a, b);
        assert_relative_eq!(a.abs(), b.abs(), epsilon = 1e-6);
    }

    #[test]
    fn test_tilted_cylinder() {
        let tilt = Matrix4::new_rotation(Vector3::new(0.4, -0.2, 0.1))
            * Matrix4::new_translation(&Vector3::new(1.0, 2.0, 3.0));
        let fitted = fit_all(&shell(10, TAU, Some(tilt)));
        assert_eq!(fitted.sections.len(), 1);

        let section = &fitted.sections[0];
        assert_relative_eq!(section.radius, 1.5, epsilon = 1e-6);
        assert_relative_eq!(section.height(), 2.0, epsilon = 1e-6);
        let expected_axis = tilt.transform_vector(&Vector3::z());
        let axis = (section.top_center - section.bottom_center).normalize();
        assert_relative_eq!(axis.dot(&expected_axis).abs(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_broken_ring_is_fatal() {
        let polymesh = shell(4, PI, None);
        let config = DetectionConfig::default();
        let right = find_right_triangles(&polymesh, config.right_angle_tolerance).unwrap();
        let rectangles = find_rectangles(&polymesh, &right, &config).unwrap();
        let mask = RectangleMask::from_rectangles(polymesh.num_faces(), &rectangles);
        let mut ring_mask = RingMask::new(rectangles.len());
        let mut diagnostics = Diagnostics::new();
        let mut rings = find_rings(
            &polymesh,
            &rectangles,
            &mask,
            &mut ring_mask,
            &config,
            &mut diagnostics,
        )
        .unwrap();

        // Pair the last face with a face of a different rectangle
        let ring = &mut rings[0];
        let n = ring.face_indices.len();
        ring.face_indices.swap(n - 1, 2);
        let result = fit_cylinder(
            &polymesh,
            &rectangles,
            &mask,
            0,
            ring,
            &config,
            &mut diagnostics,
        );
        assert!(matches!(result, Err(ShapeError::MalformedMesh(_))));
    }

    #[test]
    fn test_odd_face_count_is_fatal() {
        let ring = Ring {
            face_indices: vec![0, 1, 2],
            total_angle: PI,
            status: crate::shapes::rings::RingStatus::Growing,
            boundary: crate::shapes::rings::RingBoundary {
                near_edge: [Point3::origin(); 2],
                inner_edge: [Point3::origin(); 2],
                far_edge: [Point3::origin(); 2],
            },
        };
        let polymesh = Polymesh::from_polygons(
            vec![Polygon::triangle(
                Point3::origin(),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            )],
            1e-9,
        );
        let result = fit_cylinder(
            &polymesh,
            &[],
            &RectangleMask::default(),
            0,
            &ring,
            &DetectionConfig::default(),
            &mut Diagnostics::new(),
        );
        assert!(matches!(result, Err(ShapeError::MalformedMesh(_))));
    }
}
