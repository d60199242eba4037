// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Half-edge connectivity used to derive face adjacency by edge index

use std::collections::HashMap;

/// Half-edge in a half-edge mesh.
/// Each interior edge has two half-edges, one for each direction.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge {
    /// Next half-edge in the same face
    pub next: usize,
    /// Previous half-edge in the same face
    pub prev: usize,
    /// Twin half-edge (opposite direction, belongs to adjacent face)
    pub twin: Option<usize>,
    /// Vertex this half-edge points to
    pub vertex: usize,
    /// Face this half-edge belongs to
    pub face: usize,
}

/// Half-edge topology over indexed polygon faces.
///
/// Face `f` owns the half-edges `first_half_edge[f]..first_half_edge[f] + len`,
/// and its local edge `e` runs from vertex `e` to vertex `e + 1`.
#[derive(Debug, Clone, Default)]
pub struct HalfEdgeMesh {
    pub half_edges: Vec<HalfEdge>,
    first_half_edge: Vec<usize>,
    face_sizes: Vec<usize>,
    /// Edges shared by more than two faces
    non_manifold_edges: usize,
}

impl HalfEdgeMesh {
    /// Build topology from faces given as vertex index loops
    pub fn from_faces(faces: &[Vec<usize>]) -> Self {
        let mut he_mesh = Self::default();

        for (face_idx, face) in faces.iter().enumerate() {
            let base = he_mesh.half_edges.len();
            let n = face.len();
            he_mesh.first_half_edge.push(base);
            he_mesh.face_sizes.push(n);

            for local in 0..n {
                he_mesh.half_edges.push(HalfEdge {
                    next: base + (local + 1) % n,
                    prev: base + (local + n - 1) % n,
                    twin: None,
                    vertex: face[(local + 1) % n],
                    face: face_idx,
                });
            }
        }

        he_mesh.build_edge_map();
        he_mesh
    }

    /// Connect twin half-edges through a canonical (min, max) vertex key.
    /// The first two half-edges seen on an edge become twins; further ones
    /// stay unpaired.
    fn build_edge_map(&mut self) {
        let mut edge_map: HashMap<(usize, usize), usize> = HashMap::new();
        let mut twin_pairs: Vec<(usize, usize)> = Vec::new();
        let mut paired: HashMap<(usize, usize), usize> = HashMap::new();

        for (he_idx, he) in self.half_edges.iter().enumerate() {
            let v_from = self.half_edges[he.prev].vertex;
            let v_to = he.vertex;
            let key = (v_from.min(v_to), v_from.max(v_to));

            if let Some(&other_he_idx) = edge_map.get(&key) {
                let count = paired.entry(key).or_insert(0);
                if *count == 0 {
                    twin_pairs.push((he_idx, other_he_idx));
                } else {
                    self.non_manifold_edges += 1;
                }
                *count += 1;
            } else {
                edge_map.insert(key, he_idx);
            }
        }

        for (he_idx, other_he_idx) in twin_pairs {
            self.half_edges[he_idx].twin = Some(other_he_idx);
            self.half_edges[other_he_idx].twin = Some(he_idx);
        }
    }

    /// Face across local edge `edge` of `face`
    pub fn adjacent_face(&self, face: usize, edge: usize) -> Option<usize> {
        let he = self.first_half_edge[face] + edge % self.face_sizes[face];
        self.half_edges[he].twin.map(|twin| self.half_edges[twin].face)
    }

    /// Per-face adjacency table indexed by local edge
    pub fn face_adjacency(&self) -> Vec<Vec<Option<usize>>> {
        (0..self.face_count())
            .map(|face| {
                (0..self.face_sizes[face])
                    .map(|edge| self.adjacent_face(face, edge))
                    .collect()
            })
            .collect()
    }

    pub fn face_count(&self) -> usize {
        self.face_sizes.len()
    }

    /// Number of half-edges without a twin
    pub fn boundary_edge_count(&self) -> usize {
        self.half_edges.iter().filter(|he| he.twin.is_none()).count()
    }

    pub fn non_manifold_edge_count(&self) -> usize {
        self.non_manifold_edges
    }
}
