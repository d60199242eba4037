// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator

use super::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector3};
use std::f64::consts::TAU;

/// Geometric primitives used to build reference meshes
pub enum Primitive {
    Cube { size: Vector3<f64>, center: bool },
    /// Closed cylinder with fan caps, axis along +z from z = 0
    Cylinder { h: f64, r: f64, fn_: u32 },
    /// Lateral band of a cylinder without caps, covering `sweep` radians
    /// from the +x axis in `segments` facets
    CylinderShell {
        h: f64,
        r: f64,
        segments: u32,
        sweep: f64,
    },
}

impl Primitive {
    pub fn cube(size: Vector3<f64>, center: bool) -> Self {
        Self::Cube { size, center }
    }

    pub fn cylinder(h: f64, r: f64, fn_: u32) -> Self {
        let segments = if fn_ > 0 { fn_ } else { 32 };
        Self::Cylinder {
            h,
            r,
            fn_: segments,
        }
    }

    pub fn cylinder_shell(h: f64, r: f64, segments: u32, sweep: f64) -> Self {
        Self::CylinderShell {
            h,
            r,
            segments: segments.max(1),
            sweep,
        }
    }

    pub fn to_mesh(&self) -> Mesh {
        match self {
            Self::Cube { size, center } => generate_cube_mesh(*size, *center),
            Self::Cylinder { h, r, fn_ } => generate_cylinder_mesh(*h, *r, *fn_),
            Self::CylinderShell {
                h,
                r,
                segments,
                sweep,
            } => {
                let mut mesh = Mesh::new();
                let (bottom, top) = add_rims(&mut mesh, *h, *r, *segments, *sweep);
                add_side_triangles(&mut mesh, &bottom, &top);
                mesh.recompute_normals();
                mesh
            }
        }
    }
}

fn generate_cube_mesh(size: Vector3<f64>, center: bool) -> Mesh {
    let mut mesh = Mesh::new();

    let offset = if center { size / 2.0 } else { Vector3::zeros() };
    let (min_x, max_x) = (-offset.x, size.x - offset.x);
    let (min_y, max_y) = (-offset.y, size.y - offset.y);
    let (min_z, max_z) = (-offset.z, size.z - offset.z);

    let positions = [
        Point3::new(min_x, min_y, min_z),
        Point3::new(max_x, min_y, min_z),
        Point3::new(max_x, max_y, min_z),
        Point3::new(min_x, max_y, min_z),
        Point3::new(min_x, min_y, max_z),
        Point3::new(max_x, min_y, max_z),
        Point3::new(max_x, max_y, max_z),
        Point3::new(min_x, max_y, max_z),
    ];

    // 6 faces, each split along a diagonal into two right triangles
    let faces = [
        ([4, 5, 6], Vector3::new(0.0, 0.0, 1.0)),
        ([4, 6, 7], Vector3::new(0.0, 0.0, 1.0)),
        ([1, 0, 3], Vector3::new(0.0, 0.0, -1.0)),
        ([1, 3, 2], Vector3::new(0.0, 0.0, -1.0)),
        ([5, 1, 2], Vector3::new(1.0, 0.0, 0.0)),
        ([5, 2, 6], Vector3::new(1.0, 0.0, 0.0)),
        ([0, 4, 7], Vector3::new(-1.0, 0.0, 0.0)),
        ([0, 7, 3], Vector3::new(-1.0, 0.0, 0.0)),
        ([7, 6, 2], Vector3::new(0.0, 1.0, 0.0)),
        ([7, 2, 3], Vector3::new(0.0, 1.0, 0.0)),
        ([0, 1, 5], Vector3::new(0.0, -1.0, 0.0)),
        ([0, 5, 4], Vector3::new(0.0, -1.0, 0.0)),
    ];

    // Per-face corner copies keep flat normals; adjacency welds them back
    for (indices, normal) in faces {
        let v0 = mesh.add_vertex(Vertex::new(positions[indices[0]], normal));
        let v1 = mesh.add_vertex(Vertex::new(positions[indices[1]], normal));
        let v2 = mesh.add_vertex(Vertex::new(positions[indices[2]], normal));
        mesh.add_triangle(Triangle::new([v0, v1, v2]));
    }

    mesh
}

fn generate_cylinder_mesh(height: f64, radius: f64, segments: u32) -> Mesh {
    let mut mesh = Mesh::new();

    let bottom_center_idx = mesh.add_vertex(Vertex::new(
        Point3::new(0.0, 0.0, 0.0),
        Vector3::new(0.0, 0.0, -1.0),
    ));
    let top_center_idx = mesh.add_vertex(Vertex::new(
        Point3::new(0.0, 0.0, height),
        Vector3::new(0.0, 0.0, 1.0),
    ));

    let (bottom, top) = add_rims(&mut mesh, height, radius, segments, TAU);
    let n = segments as usize;

    for i in 0..n {
        mesh.add_triangle(Triangle::new([bottom_center_idx, bottom[i + 1], bottom[i]]));
        mesh.add_triangle(Triangle::new([top_center_idx, top[i], top[i + 1]]));
    }

    add_side_triangles(&mut mesh, &bottom, &top);

    mesh.recompute_normals();
    mesh
}

/// Rim vertex indices at z = 0 and z = height. A full turn repeats the
/// first index at the end so both rims always have `segments + 1` entries.
fn add_rims(
    mesh: &mut Mesh,
    height: f64,
    radius: f64,
    segments: u32,
    sweep: f64,
) -> (Vec<usize>, Vec<usize>) {
    let closed = (sweep.abs() - TAU).abs() < 1e-12;
    let unique = if closed { segments } else { segments + 1 };

    let mut bottom = Vec::with_capacity(segments as usize + 1);
    let mut top = Vec::with_capacity(segments as usize + 1);

    for i in 0..unique {
        let angle = sweep * i as f64 / segments as f64;
        let (sin, cos) = angle.sin_cos();
        let radial = Vector3::new(cos, sin, 0.0);

        bottom.push(mesh.add_vertex(Vertex::new(
            Point3::new(radius * cos, radius * sin, 0.0),
            radial,
        )));
        top.push(mesh.add_vertex(Vertex::new(
            Point3::new(radius * cos, radius * sin, height),
            radial,
        )));
    }

    if closed {
        bottom.push(bottom[0]);
        top.push(top[0]);
    }

    (bottom, top)
}

/// Two right triangles per rectangular facet, split along the bottom-next /
/// top-current diagonal
fn add_side_triangles(mesh: &mut Mesh, bottom: &[usize], top: &[usize]) {
    for i in 0..bottom.len() - 1 {
        let bi = bottom[i];
        let ti = top[i];
        let bn = bottom[i + 1];
        let tn = top[i + 1];

        mesh.add_triangle(Triangle::new([bi, ti, bn]));
        mesh.add_triangle(Triangle::new([ti, tn, bn]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::f64::consts::PI;

    fn edge_counts(mesh: &Mesh) -> HashMap<(usize, usize), u32> {
        let mut counts = HashMap::new();
        for t in &mesh.triangles {
            for e in 0..3 {
                let a = t.indices[e];
                let b = t.indices[(e + 1) % 3];
                *counts.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }
        counts
    }

    #[test]
    fn test_cube_generation() {
        let mesh = generate_cube_mesh(Vector3::new(10.0, 10.0, 10.0), false);
        assert_eq!(mesh.vertex_count(), 36);
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_cylinder_is_closed() {
        let mesh = generate_cylinder_mesh(10.0, 5.0, 16);
        assert_eq!(mesh.vertex_count(), 2 + 16 * 2);
        assert_eq!(mesh.triangle_count(), 16 * 4);
        assert!(edge_counts(&mesh).values().all(|&c| c == 2));
    }

    #[test]
    fn test_open_shell_has_boundary() {
        let mesh = Primitive::cylinder_shell(1.0, 1.0, 4, PI).to_mesh();
        assert_eq!(mesh.vertex_count(), 10);
        assert_eq!(mesh.triangle_count(), 8);
        assert!(edge_counts(&mesh).values().any(|&c| c == 1));
    }
}
