// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Detection configuration
//!
//! All angles are in radians, all lengths in mesh units.

use crate::error::{ShapeError, ShapeResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use std::path::Path;

/// Half a degree, the default for most angular checks.
pub const HALF_DEGREE: f64 = 0.0087266;

/// Tolerances shared by every detection stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Maximum angle between two face planes for plane grouping (about 5°).
    pub plane_angle_tolerance: f64,
    /// Maximum difference of plane offsets for plane grouping.
    pub plane_distance_tolerance: f64,
    /// Minimum share of total surface area for a plane group to be reported.
    pub area_fraction_threshold: f64,
    /// Slack around 90° when classifying right triangles.
    pub right_angle_tolerance: f64,
    /// Coplanarity tolerance between the halves of a rectangle. Also the
    /// smallest dihedral angle that counts as a ring step.
    pub coplanar_angle_tolerance: f64,
    /// Slack around 0 / π for parallel rectangle sides.
    pub parallel_angle_tolerance: f64,
    /// Allowed spread of dihedral angles within one ring.
    pub ring_angle_tolerance: f64,
    /// Largest dihedral angle accepted when leaving the seed rectangle.
    pub max_step_angle: f64,
    /// Slack on rectangle side lengths.
    pub length_tolerance: f64,
    /// Smallest subtended angle for a ring to be accepted.
    pub min_ring_angle: f64,
    /// A ring must have strictly more faces than this.
    pub min_ring_faces: usize,
    /// Relative slack of the sweep orientation check.
    pub orientation_epsilon: f64,
    /// Largest out-of-plane coordinate tolerated after projecting a rim to XY.
    pub projection_epsilon: f64,
    /// Circle search radius as a fraction of the largest bounding box extent.
    pub circle_search_fraction: f64,
    /// Distance tolerance for vertices lying on a searched circle.
    pub circle_match_tolerance: f64,
    /// Vertex welding distance used when building adjacency from a mesh.
    pub weld_epsilon: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            plane_angle_tolerance: 0.087266,
            plane_distance_tolerance: 1e-6,
            area_fraction_threshold: 1e-6,
            right_angle_tolerance: HALF_DEGREE,
            coplanar_angle_tolerance: HALF_DEGREE,
            parallel_angle_tolerance: HALF_DEGREE,
            ring_angle_tolerance: HALF_DEGREE,
            max_step_angle: FRAC_PI_4 + HALF_DEGREE,
            length_tolerance: 0.1,
            min_ring_angle: FRAC_PI_2,
            min_ring_faces: 4,
            orientation_epsilon: 1e-6,
            projection_epsilon: 1e-8,
            circle_search_fraction: 0.1,
            circle_match_tolerance: 1e-7,
            weld_epsilon: 1e-9,
        }
    }
}

impl DetectionConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: DetectionConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Reject negative tolerances and angles outside (0, 2π].
    pub fn validate(&self) -> ShapeResult<()> {
        let non_negative = [
            ("plane_angle_tolerance", self.plane_angle_tolerance),
            ("plane_distance_tolerance", self.plane_distance_tolerance),
            ("area_fraction_threshold", self.area_fraction_threshold),
            ("right_angle_tolerance", self.right_angle_tolerance),
            ("coplanar_angle_tolerance", self.coplanar_angle_tolerance),
            ("parallel_angle_tolerance", self.parallel_angle_tolerance),
            ("ring_angle_tolerance", self.ring_angle_tolerance),
            ("length_tolerance", self.length_tolerance),
            ("orientation_epsilon", self.orientation_epsilon),
            ("projection_epsilon", self.projection_epsilon),
            ("circle_search_fraction", self.circle_search_fraction),
            ("circle_match_tolerance", self.circle_match_tolerance),
            ("weld_epsilon", self.weld_epsilon),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) {
                return Err(ShapeError::Config { field, value });
            }
        }

        let full_turn = 2.0 * std::f64::consts::PI;
        for (field, value) in [
            ("max_step_angle", self.max_step_angle),
            ("min_ring_angle", self.min_ring_angle),
        ] {
            if !(value > 0.0 && value <= full_turn) {
                return Err(ShapeError::Config { field, value });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_is_valid() {
        assert!(DetectionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let config = DetectionConfig {
            length_tolerance: -0.5,
            ..Default::default()
        };
        match config.validate() {
            Err(ShapeError::Config { field, .. }) => assert_eq!(field, "length_tolerance"),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let file = NamedTempFile::new()?;
        let config = DetectionConfig {
            min_ring_faces: 6,
            ..Default::default()
        };
        config.save(file.path())?;

        let loaded = DetectionConfig::from_file(file.path())?;
        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() -> Result<()> {
        let file = NamedTempFile::new()?;
        std::fs::write(file.path(), "length_tolerance = 0.25\n")?;

        let loaded = DetectionConfig::from_file(file.path())?;
        assert_eq!(loaded.length_tolerance, 0.25);
        assert_eq!(loaded.min_ring_faces, 4);
        Ok(())
    }
}
