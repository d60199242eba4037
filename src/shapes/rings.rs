// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Rings of rectangles approximating a cylindrical band
//!
//! A ring grows from a seed rectangle across one of its two pairs of
//! parallel edges. Every step enters the next rectangle through one parallel
//! edge and leaves through the opposite one, so the crossed edges are the
//! cylinder's axial edges and the other pair forms the rims.

use super::plane::{angle_between, Plane};
use super::rectangles::{Rectangle, RectangleMask};
use crate::config::DetectionConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::ShapeResult;
use crate::geometry::Polymesh;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::{debug, trace};

/// Lifecycle of a ring walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RingStatus {
    /// Still growing, or stopped at a free boundary as an open section
    Growing,
    /// Came back around to the seed rectangle
    ClosedComplete,
    /// Rejected: inconsistent angles, a duplicate of a lower seed, or broken adjacency
    Abandoned,
}

/// Edge endpoints that fix the orientation of a ring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingBoundary {
    /// Axial edge where the ring ends
    pub near_edge: [Point3<f64>; 2],
    /// Axial edge one rectangle inward from `near_edge`
    pub inner_edge: [Point3<f64>; 2],
    /// Axial edge at the other end of the ring
    pub far_edge: [Point3<f64>; 2],
}

impl RingBoundary {
    pub fn points(&self) -> [Point3<f64>; 6] {
        [
            self.near_edge[0],
            self.near_edge[1],
            self.inner_edge[0],
            self.inner_edge[1],
            self.far_edge[0],
            self.far_edge[1],
        ]
    }
}

/// An accepted cylinder candidate.
///
/// `face_indices` starts with the seed rectangle's two halves and keeps the
/// two halves of every rectangle next to each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    pub face_indices: Vec<usize>,
    /// Subtended angle in radians
    pub total_angle: f64,
    pub status: RingStatus,
    pub boundary: RingBoundary,
}

/// Rectangle to ring assignment. Each rectangle is claimed at most once.
#[derive(Debug, Clone, Default)]
pub struct RingMask {
    ring_of_rect: Vec<Option<usize>>,
}

impl RingMask {
    pub fn new(num_rectangles: usize) -> Self {
        Self {
            ring_of_rect: vec![None; num_rectangles],
        }
    }

    pub fn ring_of(&self, rectangle: usize) -> Option<usize> {
        self.ring_of_rect.get(rectangle).copied().flatten()
    }

    pub fn is_assigned(&self, rectangle: usize) -> bool {
        self.ring_of(rectangle).is_some()
    }

    /// Assign a free rectangle to a ring. Returns false if it was taken.
    pub fn claim(&mut self, rectangle: usize, ring: usize) -> bool {
        match self.ring_of_rect.get_mut(rectangle) {
            Some(slot @ None) => {
                *slot = Some(ring);
                true
            }
            _ => false,
        }
    }
}

/// State carried by one walk
#[derive(Debug, Clone)]
struct Walk {
    faces: Vec<usize>,
    angle_sum: f64,
    joints: usize,
    smallest: f64,
    largest: f64,
    status: RingStatus,
    near_edge: Option<[Point3<f64>; 2]>,
    inner_edge: Option<[Point3<f64>; 2]>,
}

impl Walk {
    fn new(seed_faces: [usize; 2]) -> Self {
        Self {
            faces: seed_faces.to_vec(),
            angle_sum: 0.0,
            joints: 0,
            smallest: TAU,
            largest: 0.0,
            status: RingStatus::Growing,
            near_edge: None,
            inner_edge: None,
        }
    }

    fn is_valid(&self) -> bool {
        self.joints > 0 && self.status != RingStatus::Abandoned
    }

    /// Widen the dihedral bounds to cover `angle`, unless that stretches
    /// them beyond `tolerance`
    fn widen_bounds(&mut self, angle: f64, tolerance: f64) -> bool {
        if angle < self.smallest {
            if (self.largest - angle).abs() > tolerance && self.joints > 0 {
                return false;
            }
            self.smallest = angle;
        }
        if angle > self.largest {
            if (angle - self.smallest).abs() > tolerance && self.joints > 0 {
                return false;
            }
            self.largest = angle;
        }
        true
    }

    fn add_joint(&mut self, angle: f64) {
        self.angle_sum += angle;
        self.joints += 1;
    }

    fn abandon(&mut self) {
        self.angle_sum = 0.0;
        self.status = RingStatus::Abandoned;
    }

    /// An open band of n rectangles has n - 1 joints but subtends n steps
    fn total_angle(&self) -> f64 {
        match self.status {
            RingStatus::ClosedComplete => self.angle_sum,
            RingStatus::Abandoned => 0.0,
            RingStatus::Growing if self.joints == 0 => 0.0,
            RingStatus::Growing => self.angle_sum + self.angle_sum / self.joints as f64,
        }
    }
}

/// First rectangle reached from a seed half
struct Step {
    face: usize,
    rectangle: usize,
    angle: f64,
}

struct RingWalker<'a> {
    mesh: &'a Polymesh,
    rectangles: &'a [Rectangle],
    rect_mask: &'a RectangleMask,
    planes: Vec<Plane>,
    config: &'a DetectionConfig,
}

impl<'a> RingWalker<'a> {
    fn edge(&self, face: usize, edge: usize) -> [Point3<f64>; 2] {
        let (a, b) = self.mesh.face(face).edge_points(edge);
        [a, b]
    }

    fn dihedral(&self, first: usize, second: usize) -> ShapeResult<f64> {
        angle_between(&self.planes[first], &self.planes[second])
    }

    /// Mean lengths of the two halves' sides, for pair 1 and pair 2
    fn side_lengths(&self, rect: &Rectangle) -> [f64; 2] {
        let [a1, a2] = rect.side_lengths(self.mesh, 1);
        let [b1, b2] = rect.side_lengths(self.mesh, 2);
        [(a1 + a2) / 2.0, (b1 + b2) / 2.0]
    }

    fn halves_match(&self, rect: &Rectangle) -> bool {
        let tol = self.config.length_tolerance;
        let [a1, a2] = rect.side_lengths(self.mesh, 1);
        let [b1, b2] = rect.side_lengths(self.mesh, 2);
        (a1 - a2).abs() <= tol && (b1 - b2).abs() <= tol
    }

    /// Step from a seed half across `edge` into a higher, unclaimed
    /// rectangle of matching size at a plausible facet angle
    fn first_step(
        &self,
        seed: usize,
        from_face: usize,
        edge: usize,
        sides: [f64; 2],
        ring_mask: &RingMask,
    ) -> ShapeResult<Option<Step>> {
        let Some(face) = self.mesh.adjacent_face(from_face, edge) else {
            return Ok(None);
        };
        let Some(rectangle) = self.rect_mask.rectangle_of(face) else {
            return Ok(None);
        };
        if rectangle <= seed || ring_mask.is_assigned(rectangle) {
            return Ok(None);
        }

        let angle = self.dihedral(from_face, face)?;
        if angle <= self.config.coplanar_angle_tolerance || angle >= self.config.max_step_angle {
            return Ok(None);
        }

        let tol = self.config.length_tolerance;
        let [n1, n2] = self.side_lengths(&self.rectangles[rectangle]);
        let same_way = (n1 - sides[0]).abs() <= tol && (n2 - sides[1]).abs() <= tol;
        let swapped = (n1 - sides[1]).abs() <= tol && (n2 - sides[0]).abs() <= tol;
        if !same_way && !swapped {
            return Ok(None);
        }

        Ok(Some(Step {
            face,
            rectangle,
            angle,
        }))
    }

    /// Walk rectangle by rectangle until the ring stops, closes on
    /// `closing_face`, or is abandoned
    #[allow(clippy::too_many_arguments)]
    fn advance(
        &self,
        walk: &mut Walk,
        seed: usize,
        closing_face: usize,
        mut rectangle: usize,
        mut prev_face: usize,
        width: f64,
        ring_mask: &RingMask,
        diagnostics: &mut Diagnostics,
    ) -> ShapeResult<()> {
        let angle_tol = self.config.ring_angle_tolerance;
        let length_tol = self.config.length_tolerance;

        loop {
            let rect = &self.rectangles[rectangle];
            let halves = rect.triangles();

            let entry = [(0, 1), (1, 1), (0, 2), (1, 2)]
                .into_iter()
                .find(|&(slot, pair)| {
                    self.mesh
                        .adjacent_face(halves[slot], rect.parallel_edges(pair)[slot])
                        == Some(prev_face)
                });
            let Some((slot, pair)) = entry else {
                diagnostics.report(Diagnostic::AsymmetricAdjacency {
                    face: prev_face,
                    rectangle,
                });
                walk.abandon();
                return Ok(());
            };

            let edges = rect.parallel_edges(pair);
            let entered = halves[slot];
            let other = halves[1 - slot];
            let exit_edge = edges[1 - slot];

            walk.faces.push(other);
            walk.inner_edge = Some(self.edge(entered, edges[slot]));
            walk.near_edge = Some(self.edge(other, exit_edge));

            let Some(next_face) = self.mesh.adjacent_face(other, exit_edge) else {
                return Ok(());
            };
            let Some(next_rect) = self.rect_mask.rectangle_of(next_face) else {
                return Ok(());
            };
            if ring_mask.is_assigned(next_rect) {
                return Ok(());
            }

            let angle = self.dihedral(other, next_face)?;
            if !walk.widen_bounds(angle, angle_tol) {
                trace!(rectangle = next_rect, angle, "dihedral angle out of band");
                walk.abandon();
                return Ok(());
            }

            if next_face == closing_face {
                walk.add_joint(angle);
                if (walk.angle_sum - TAU).abs() > angle_tol {
                    diagnostics.report(Diagnostic::RingClosureMismatch {
                        seed_rectangle: seed,
                        angle_sum: walk.angle_sum,
                    });
                }
                walk.angle_sum = TAU;
                walk.status = RingStatus::ClosedComplete;
                return Ok(());
            }
            if walk.faces.contains(&next_face) {
                return Ok(());
            }

            // The next rectangle shares `height` with this one; its other
            // side is the width
            let height = self.mesh.face(other).edge_length(exit_edge);
            let next = &self.rectangles[next_rect];
            let Some(next_slot) = next.slot_of(next_face) else {
                return Ok(());
            };
            let next_polygon = self.mesh.face(next_face);
            let l1 = next_polygon.edge_length(next.parallel_edges1[next_slot]);
            let l2 = next_polygon.edge_length(next.parallel_edges2[next_slot]);
            let (shared_error, next_width) = if (l1 - height).abs() <= (l2 - height).abs() {
                ((l1 - height).abs(), l2)
            } else {
                ((l2 - height).abs(), l1)
            };
            if shared_error > length_tol || (width - next_width).abs() > length_tol {
                return Ok(());
            }

            if next_rect <= seed {
                // Reachable from a lower seed, which already had its chance
                walk.abandon();
                return Ok(());
            }

            walk.faces.push(next_face);
            walk.add_joint(angle);
            prev_face = other;
            rectangle = next_rect;
        }
    }

    /// Grow a ring from `seed` across parallel edge pair `pair`
    fn grow(
        &self,
        seed: usize,
        pair: usize,
        ring_mask: &RingMask,
        diagnostics: &mut Diagnostics,
    ) -> ShapeResult<Option<Ring>> {
        let rect = &self.rectangles[seed];
        let [t1, t2] = rect.triangles();
        let edges = rect.parallel_edges(pair);
        let sides = self.side_lengths(rect);
        let width = if pair == 1 { sides[1] } else { sides[0] };
        let angle_tol = self.config.ring_angle_tolerance;

        // Side A: leave through the first half, close on the second
        let mut walk = Walk::new([t1, t2]);
        if let Some(step) = self.first_step(seed, t1, edges[0], sides, ring_mask)? {
            walk.faces.push(step.face);
            walk.widen_bounds(step.angle, angle_tol);
            walk.add_joint(step.angle);
            self.advance(
                &mut walk,
                seed,
                t2,
                step.rectangle,
                t1,
                width,
                ring_mask,
                diagnostics,
            )?;
            if walk.status == RingStatus::Abandoned {
                walk = Walk::new([t1, t2]);
            }
        }
        let side_a = walk.is_valid();

        let mut far_edge = self.edge(t2, edges[1]);

        // Side B: leave through the second half, close on the first
        if walk.status != RingStatus::ClosedComplete {
            if let Some(step) = self.first_step(seed, t2, edges[1], sides, ring_mask)? {
                if walk.widen_bounds(step.angle, angle_tol) {
                    far_edge = match walk.near_edge {
                        Some(edge) if side_a => edge,
                        _ => self.edge(t1, edges[0]),
                    };
                    walk.faces.push(step.face);
                    walk.add_joint(step.angle);
                    self.advance(
                        &mut walk,
                        seed,
                        t1,
                        step.rectangle,
                        t2,
                        width,
                        ring_mask,
                        diagnostics,
                    )?;
                    if walk.status == RingStatus::Abandoned {
                        return Ok(None);
                    }
                }
            }
        }

        let total_angle = walk.total_angle();
        if !walk.is_valid()
            || total_angle < self.config.min_ring_angle
            || walk.faces.len() <= self.config.min_ring_faces
        {
            trace!(seed, pair, total_angle, faces = walk.faces.len(), "ring rejected");
            return Ok(None);
        }

        let (Some(near_edge), Some(inner_edge)) = (walk.near_edge, walk.inner_edge) else {
            return Ok(None);
        };

        Ok(Some(Ring {
            face_indices: walk.faces,
            total_angle,
            status: walk.status,
            boundary: RingBoundary {
                near_edge,
                inner_edge,
                far_edge,
            },
        }))
    }
}

/// Find rings of rectangles, claiming each member rectangle in `ring_mask`.
///
/// Seeds are visited in rectangle order. For each seed the first parallel
/// edge pair is tried before the second, and only one ring per seed is kept.
pub fn find_rings(
    mesh: &Polymesh,
    rectangles: &[Rectangle],
    rect_mask: &RectangleMask,
    ring_mask: &mut RingMask,
    config: &DetectionConfig,
    diagnostics: &mut Diagnostics,
) -> ShapeResult<Vec<Ring>> {
    let walker = RingWalker {
        mesh,
        rectangles,
        rect_mask,
        planes: mesh.faces().iter().map(|f| f.fit_plane()).collect(),
        config,
    };

    let mut rings = Vec::new();
    for seed in 0..rectangles.len() {
        if ring_mask.is_assigned(seed) || !walker.halves_match(&rectangles[seed]) {
            continue;
        }

        for pair in [1, 2] {
            let Some(ring) = walker.grow(seed, pair, ring_mask, diagnostics)? else {
                continue;
            };

            let ring_index = rings.len();
            for &face in &ring.face_indices {
                if let Some(rect) = rect_mask.rectangle_of(face) {
                    // Both halves map to the same rectangle; the second claim is a no-op
                    ring_mask.claim(rect, ring_index);
                }
            }
            debug!(
                ring = ring_index,
                seed,
                faces = ring.face_indices.len(),
                angle = ring.total_angle,
                status = ?ring.status,
                "ring accepted"
            );
            rings.push(ring);
            break;
        }
    }

    Ok(rings)
}
