// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Grouping of faces into coplanar regions

use super::plane::{are_coplanar, Plane};
use crate::config::DetectionConfig;
use crate::error::ShapeResult;
use crate::geometry::Polymesh;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Faces lying in one plane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaneGroup {
    pub plane: Plane,
    pub face_indices: Vec<usize>,
    /// Share of the total mesh surface area
    pub area_fraction: f64,
}

/// Accepted plane groups plus every face left over
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaneGrouping {
    pub groups: Vec<PlaneGroup>,
    pub remainder: Vec<usize>,
}

impl PlaneGrouping {
    /// Face lists in output order, with the remainder last
    pub fn face_lists(&self) -> Vec<Vec<usize>> {
        self.groups
            .iter()
            .map(|g| g.face_indices.clone())
            .chain(std::iter::once(self.remainder.clone()))
            .collect()
    }
}

/// Partition faces into coplanar groups.
///
/// Each unvisited face seeds a group with its own plane, and every later
/// unvisited face coplanar with that seed plane joins it. Groups whose area
/// share does not exceed `area_fraction_threshold` go to the remainder.
pub fn find_planes(mesh: &Polymesh, config: &DetectionConfig) -> ShapeResult<PlaneGrouping> {
    let num_faces = mesh.num_faces();
    let areas: Vec<f64> = mesh.faces().iter().map(|f| f.area()).collect();
    let total_area: f64 = areas.iter().sum();
    let planes: Vec<Plane> = mesh.faces().iter().map(|f| f.fit_plane()).collect();

    let mut grouping = PlaneGrouping::default();
    if total_area <= 0.0 {
        grouping.remainder = (0..num_faces).collect();
        return Ok(grouping);
    }

    let mut visited = vec![false; num_faces];
    for seed in 0..num_faces {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;

        let plane = planes[seed];
        if !plane.is_finite() {
            grouping.remainder.push(seed);
            continue;
        }

        let mut face_indices = vec![seed];
        let mut area = areas[seed];
        for other in seed + 1..num_faces {
            if visited[other] || !planes[other].is_finite() {
                continue;
            }
            if are_coplanar(
                &plane,
                &planes[other],
                config.plane_angle_tolerance,
                config.plane_distance_tolerance,
            )? {
                visited[other] = true;
                face_indices.push(other);
                area += areas[other];
            }
        }

        let area_fraction = area / total_area;
        if area_fraction > config.area_fraction_threshold {
            grouping.groups.push(PlaneGroup {
                plane,
                face_indices,
                area_fraction,
            });
        } else {
            grouping.remainder.extend(face_indices);
        }
    }

    grouping.remainder.sort_unstable();
    debug!(
        groups = grouping.groups.len(),
        remainder = grouping.remainder.len(),
        "plane grouping finished"
    );
    Ok(grouping)
}
