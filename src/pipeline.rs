// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end shape detection over one mesh

use crate::config::DetectionConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::ShapeResult;
use crate::geometry::Polymesh;
use crate::shapes::{
    find_planes, find_rectangles, find_right_triangles, find_rings, fit_cylinders,
    CylinderSection, PlaneGroup, PlaneGrouping, Rectangle, RectangleMask, Ring, RingMask,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Receiver of detection results, called in pipeline order
pub trait ShapeSink {
    fn plane_group(&mut self, _group: &PlaneGroup) {}
    fn plane_remainder(&mut self, _faces: &[usize]) {}
    fn rectangle(&mut self, _rectangle: &Rectangle) {}
    fn ring(&mut self, _ring: &Ring) {}
    fn cylinder(&mut self, _cylinder: &CylinderSection) {}
    fn diagnostic(&mut self, _diagnostic: &Diagnostic) {}
}

/// Everything one run found
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShapeReport {
    pub face_count: usize,
    pub planes: PlaneGrouping,
    pub rectangles: Vec<Rectangle>,
    pub rings: Vec<Ring>,
    pub cylinders: Vec<CylinderSection>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ShapeReport {
    /// Plane face lists, remainder last
    pub fn plane_face_lists(&self) -> Vec<Vec<usize>> {
        self.planes.face_lists()
    }

    pub fn cylinder_face_lists(&self) -> Vec<Vec<usize>> {
        self.cylinders
            .iter()
            .map(|c| c.face_indices.clone())
            .collect()
    }
}

impl ShapeSink for ShapeReport {
    fn plane_group(&mut self, group: &PlaneGroup) {
        self.planes.groups.push(group.clone());
    }

    fn plane_remainder(&mut self, faces: &[usize]) {
        self.planes.remainder = faces.to_vec();
    }

    fn rectangle(&mut self, rectangle: &Rectangle) {
        self.rectangles.push(*rectangle);
    }

    fn ring(&mut self, ring: &Ring) {
        self.rings.push(ring.clone());
    }

    fn cylinder(&mut self, cylinder: &CylinderSection) {
        self.cylinders.push(cylinder.clone());
    }

    fn diagnostic(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.push(diagnostic.clone());
    }
}

/// Run plane grouping, rectangle detection, ring walking and cylinder
/// fitting, streaming results into `sink`.
///
/// Every call allocates its own masks, so runs over different meshes do not
/// interact.
pub fn detect_shapes_into<S: ShapeSink + ?Sized>(
    mesh: &Polymesh,
    config: &DetectionConfig,
    sink: &mut S,
) -> ShapeResult<()> {
    config.validate()?;
    let start = Instant::now();

    let grouping = find_planes(mesh, config)?;
    for group in &grouping.groups {
        sink.plane_group(group);
    }
    sink.plane_remainder(&grouping.remainder);

    let right_triangles = find_right_triangles(mesh, config.right_angle_tolerance)?;
    let rectangles = find_rectangles(mesh, &right_triangles, config)?;
    for rectangle in &rectangles {
        sink.rectangle(rectangle);
    }

    let rect_mask = RectangleMask::from_rectangles(mesh.num_faces(), &rectangles);
    let mut ring_mask = RingMask::new(rectangles.len());
    let mut diagnostics = Diagnostics::new();
    let rings = find_rings(
        mesh,
        &rectangles,
        &rect_mask,
        &mut ring_mask,
        config,
        &mut diagnostics,
    )?;
    for ring in &rings {
        sink.ring(ring);
    }
    debug!(rings = rings.len(), "ring walk finished");

    let cylinders = fit_cylinders(
        mesh,
        &rectangles,
        &rect_mask,
        &rings,
        config,
        &mut diagnostics,
    )?;
    for cylinder in &cylinders {
        sink.cylinder(cylinder);
    }
    for diagnostic in diagnostics.entries() {
        sink.diagnostic(diagnostic);
    }

    info!(
        faces = mesh.num_faces(),
        planes = grouping.groups.len(),
        rectangles = rectangles.len(),
        cylinders = cylinders.len(),
        diagnostics = diagnostics.entries().len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "shape detection finished"
    );
    Ok(())
}

/// Run the full pipeline and collect the results
pub fn detect_shapes(mesh: &Polymesh, config: &DetectionConfig) -> ShapeResult<ShapeReport> {
    let mut report = ShapeReport {
        face_count: mesh.num_faces(),
        ..Default::default()
    };
    detect_shapes_into(mesh, config, &mut report)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShapeError;
    use crate::geometry::Primitive;
    use nalgebra::Vector3;

    #[derive(Default)]
    struct Counter {
        rectangles: usize,
        cylinders: usize,
    }

    impl ShapeSink for Counter {
        fn rectangle(&mut self, _rectangle: &Rectangle) {
            self.rectangles += 1;
        }

        fn cylinder(&mut self, _cylinder: &CylinderSection) {
            self.cylinders += 1;
        }
    }

    #[test]
    fn test_sink_receives_stages() {
        let mesh = Primitive::cylinder(2.0, 1.0, 16).to_mesh();
        let polymesh = Polymesh::from_mesh(&mesh, 1e-9);
        let mut counter = Counter::default();
        detect_shapes_into(&polymesh, &DetectionConfig::default(), &mut counter).unwrap();
        assert_eq!(counter.rectangles, 16);
        assert_eq!(counter.cylinders, 1);
    }

    #[test]
    fn test_cube_report() {
        let mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        let polymesh = Polymesh::from_mesh(&mesh, 1e-9);
        let report = detect_shapes(&polymesh, &DetectionConfig::default()).unwrap();

        assert_eq!(report.face_count, 12);
        assert_eq!(report.planes.groups.len(), 6);
        assert_eq!(report.rectangles.len(), 6);
        // Right angles between faces are too steep for a ring
        assert!(report.rings.is_empty());
        assert!(report.cylinders.is_empty());
        assert_eq!(report.plane_face_lists().len(), 7);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        let polymesh = Polymesh::from_mesh(&mesh, 1e-9);
        let config = DetectionConfig {
            length_tolerance: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            detect_shapes(&polymesh, &config),
            Err(ShapeError::Config { .. })
        ));
    }
}
