// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Non-fatal findings raised while detecting shapes

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// A numeric or topological oddity that did not stop the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A ring walk entered a rectangle that does not point back at the
    /// face it came from
    AsymmetricAdjacency { face: usize, rectangle: usize },
    /// A ring closed but its dihedral angles do not add up to a full turn
    RingClosureMismatch { seed_rectangle: usize, angle_sum: f64 },
    /// The sweep orientation cross product is not aligned with the axis
    AmbiguousOrientation { ring: usize, cosine: f64 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AsymmetricAdjacency { face, rectangle } => write!(
                f,
                "rectangle {} is not adjacent back to face {}",
                rectangle, face
            ),
            Self::RingClosureMismatch {
                seed_rectangle,
                angle_sum,
            } => write!(
                f,
                "ring seeded at rectangle {} closed with angle sum {:.6} instead of 2π",
                seed_rectangle, angle_sum
            ),
            Self::AmbiguousOrientation { ring, cosine } => write!(
                f,
                "ring {} orientation check is ambiguous (cos = {:.6})",
                ring, cosine
            ),
        }
    }
}

/// Collected diagnostics of one pipeline run
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it
    pub fn report(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
