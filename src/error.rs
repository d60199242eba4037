// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for shape detection

use thiserror::Error;

/// Errors raised by the shape detection stages.
#[derive(Debug, Error)]
pub enum ShapeError {
    /// A point or vector argument is malformed (too few coordinates, empty set).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A numerically impossible result, e.g. a cosine well outside [-1, 1].
    #[error("domain error: {0}")]
    DomainError(String),

    /// Mesh topology that the current stage cannot recover from.
    #[error("malformed mesh: {0}")]
    MalformedMesh(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {field} = {value}")]
    Config { field: &'static str, value: f64 },
}

/// Result alias for shape detection.
pub type ShapeResult<T> = std::result::Result<T, ShapeError>;
