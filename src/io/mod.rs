// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - importing meshes and exporting detection results

mod exporter;
mod importer;

pub use exporter::{export_report_json, export_stl, read_face_lists, write_face_lists};
pub use importer::import_stl;
