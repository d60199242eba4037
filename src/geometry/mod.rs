// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh representation, faces and adjacency

mod bbox;
mod halfedge;
mod mesh;
mod polygon;
mod polymesh;
mod primitives;

pub use bbox::BoundingBox;
pub use halfedge::{HalfEdge, HalfEdgeMesh};
pub use mesh::{Mesh, Triangle, Vertex};
pub use polygon::Polygon;
pub use polymesh::Polymesh;
pub use primitives::Primitive;
