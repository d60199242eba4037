// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Writers for meshes, face lists and detection reports

use crate::geometry::Mesh;
use crate::pipeline::ShapeReport;
use anyhow::{bail, Context, Result};
use nalgebra::{Point3, Vector3};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Export mesh to binary STL
pub fn export_stl(mesh: &Mesh, path: impl AsRef<Path>) -> Result<()> {
    use stl_io::{Normal, Triangle as StlTriangle, Vertex as StlVertex};

    let path = path.as_ref();
    let triangles: Vec<StlTriangle> = mesh
        .triangles
        .iter()
        .map(|tri| {
            let [p0, p1, p2] = mesh.triangle_positions(tri);
            let normal = (p1 - p0)
                .cross(&(p2 - p0))
                .try_normalize(1e-12)
                .unwrap_or_else(Vector3::zeros);
            let vertex = |p: Point3<f64>| StlVertex::new([p.x as f32, p.y as f32, p.z as f32]);

            StlTriangle {
                normal: Normal::new([normal.x as f32, normal.y as f32, normal.z as f32]),
                vertices: [vertex(p0), vertex(p1), vertex(p2)],
            }
        })
        .collect();

    let mut file = File::create(path).with_context(|| format!("Failed to create STL file: {:?}", path))?;
    stl_io::write_stl(&mut file, triangles.iter()).context("Failed to write STL file")?;
    Ok(())
}

/// Write face lists as text: the number of lists on the first line, then one
/// line per list holding its length followed by its face indices
pub fn write_face_lists(lists: &[Vec<usize>], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("Failed to create face list file: {:?}", path))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", lists.len())?;
    for list in lists {
        write!(writer, "{}", list.len())?;
        for face in list {
            write!(writer, " {}", face)?;
        }
        writeln!(writer)?;
    }
    writer.flush().context("Failed to write face list file")?;
    Ok(())
}

/// Read face lists written by [`write_face_lists`]
pub fn read_face_lists(path: impl AsRef<Path>) -> Result<Vec<Vec<usize>>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read face list file: {:?}", path))?;
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());

    let count: usize = lines
        .next()
        .context("Face list file is empty")?
        .trim()
        .parse()
        .context("Invalid face list count")?;

    let mut lists = Vec::with_capacity(count);
    for (index, line) in lines.enumerate() {
        let numbers = line
            .split_whitespace()
            .map(str::parse::<usize>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Invalid face index on list {}", index))?;
        let Some((&len, faces)) = numbers.split_first() else {
            continue;
        };
        if faces.len() != len {
            bail!(
                "Face list {} declares {} faces but holds {}",
                index,
                len,
                faces.len()
            );
        }
        lists.push(faces.to_vec());
    }

    if lists.len() != count {
        bail!("Expected {} face lists, found {}", count, lists.len());
    }
    Ok(lists)
}

/// Write the full report as pretty JSON
pub fn export_report_json(report: &ShapeReport, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write report: {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_face_list_format() -> Result<()> {
        let file = NamedTempFile::new()?;
        write_face_lists(&[vec![3, 1, 4], vec![], vec![5]], file.path())?;

        let text = std::fs::read_to_string(file.path())?;
        assert_eq!(text, "3\n3 3 1 4\n0\n1 5\n");
        Ok(())
    }

    #[test]
    fn test_length_mismatch_is_rejected() -> Result<()> {
        let file = NamedTempFile::new()?;
        std::fs::write(file.path(), "1\n3 0 1\n")?;
        assert!(read_face_lists(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_count_mismatch_is_rejected() -> Result<()> {
        let file = NamedTempFile::new()?;
        std::fs::write(file.path(), "2\n1 7\n")?;
        let err = read_face_lists(file.path()).unwrap_err();
        assert!(err.to_string().contains("Expected 2"));
        Ok(())
    }
}
