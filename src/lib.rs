// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe Shapes
//!
//! Extracts planar regions, rectangles and cylinder sections from
//! triangulated meshes. Stages run in order: plane grouping, rectangle
//! detection, ring walking and cylinder fitting.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod io;
pub mod pipeline;
pub mod shapes;
pub mod utils;

pub use config::DetectionConfig;
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{ShapeError, ShapeResult};
pub use geometry::{Mesh, Polygon, Polymesh, Primitive};
pub use io::{export_report_json, import_stl, read_face_lists, write_face_lists};
pub use pipeline::{detect_shapes, detect_shapes_into, ShapeReport, ShapeSink};
pub use shapes::{CylinderSection, Plane, PlaneGroup, Rectangle, Ring, RingStatus};

use anyhow::{Context, Result};
use std::path::Path;

/// Import an STL file and run the full pipeline on it
pub fn detect_file(path: impl AsRef<Path>, config: &DetectionConfig) -> Result<ShapeReport> {
    let path = path.as_ref();
    let mesh = import_stl(path)?;
    let polymesh = Polymesh::from_mesh(&mesh, config.weld_epsilon);
    detect_shapes(&polymesh, config)
        .with_context(|| format!("Shape detection failed for {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_cylinder() {
        let mesh = Primitive::cylinder(3.0, 1.0, 24).to_mesh();
        let polymesh = Polymesh::from_mesh(&mesh, 1e-9);
        let report = detect_shapes(&polymesh, &DetectionConfig::default()).unwrap();
        assert_eq!(report.cylinders.len(), 1);
        assert_eq!(report.rings[0].status, RingStatus::ClosedComplete);
    }
}
