//! Wavefront OBJ format support.
//!
//! Only `v` and `f` records are read; texture and normal indices in face
//! records are accepted and ignored. Polygons are fan-triangulated.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{EditorError, Result};
use crate::mesh::{CutMesh, Mesh, QuadMesh};
use crate::solver::UvLayout;

/// Vertices and polygons as read from an OBJ file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjPolygons {
    /// Vertex positions.
    pub vertices: Vec<Point3<f64>>,
    /// Zero-based polygon index lists.
    pub faces: Vec<Vec<usize>>,
}

impl ObjPolygons {
    /// Fan-triangulate every polygon.
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        self.faces
            .iter()
            .flat_map(|poly| {
                (1..poly.len().saturating_sub(1)).map(move |i| [poly[0], poly[i], poly[i + 1]])
            })
            .collect()
    }

    /// The polygons as quads, if every polygon has four corners.
    pub fn quads(&self) -> Option<Vec<[usize; 4]>> {
        self.faces
            .iter()
            .map(|poly| <[usize; 4]>::try_from(poly.as_slice()).ok())
            .collect()
    }
}

fn parse_error(path: &Path, line: usize, message: impl std::fmt::Display) -> EditorError {
    EditorError::LoadError {
        path: path.to_path_buf(),
        message: format!("line {}: {}", line, message),
    }
}

/// Parse OBJ records from a reader. `path` is only used in error messages.
pub fn parse<R: BufRead>(reader: R, path: &Path) -> Result<ObjPolygons> {
    let mut obj = ObjPolygons::default();

    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = n + 1;
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let mut coords = [0.0; 3];
                for c in &mut coords {
                    let token = parts
                        .next()
                        .ok_or_else(|| parse_error(path, lineno, "vertex needs 3 coordinates"))?;
                    *c = token
                        .parse()
                        .map_err(|e| parse_error(path, lineno, format!("{}: {:?}", e, token)))?;
                }
                obj.vertices.push(Point3::from(coords));
            }
            Some("f") => {
                let mut face = Vec::with_capacity(4);
                for token in parts {
                    let index = token.split('/').next().unwrap_or(token);
                    let i: i64 = index
                        .parse()
                        .map_err(|e| parse_error(path, lineno, format!("{}: {:?}", e, token)))?;
                    // Negative indices count back from the last vertex.
                    let resolved = if i < 0 {
                        obj.vertices.len() as i64 + i
                    } else {
                        i - 1
                    };
                    if resolved < 0 || resolved as usize >= obj.vertices.len() {
                        return Err(parse_error(path, lineno, format!("index {} out of range", i)));
                    }
                    face.push(resolved as usize);
                }
                if face.len() < 3 {
                    return Err(parse_error(path, lineno, "face needs at least 3 vertices"));
                }
                obj.faces.push(face);
            }
            _ => {}
        }
    }

    Ok(obj)
}

/// Load the raw polygons of an OBJ file.
pub fn load_polygons<P: AsRef<Path>>(path: P) -> Result<ObjPolygons> {
    let path = path.as_ref();
    let file = File::open(path)?;
    parse(BufReader::new(file), path)
}

/// Load an OBJ file as a triangle mesh.
///
/// # Example
///
/// ```no_run
/// use seamstress::io::obj;
///
/// let mesh = obj::load("model.obj").unwrap();
/// println!("{} faces", mesh.num_faces());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    load_with_quads(path).map(|(mesh, _)| mesh)
}

/// Load an OBJ file as a triangle mesh, plus the quad mesh when every
/// polygon is a quad.
pub fn load_with_quads<P: AsRef<Path>>(path: P) -> Result<(Mesh, Option<QuadMesh>)> {
    let obj = load_polygons(path)?;
    let mesh = Mesh::from_triangles(&obj.vertices, &obj.triangles())?;
    let quads = match obj.quads() {
        Some(quads) if !quads.is_empty() => Some(QuadMesh::from_quads(&obj.vertices, &quads)?),
        _ => None,
    };
    Ok((mesh, quads))
}

/// Write a cut mesh, with one `vt` record per vertex when a layout is given.
pub fn write<W: Write>(
    cut: &CutMesh,
    layout: Option<&UvLayout>,
    out: &mut W,
) -> std::io::Result<()> {
    for v in &cut.vertices {
        writeln!(out, "v {} {} {}", v.x, v.y, v.z)?;
    }
    let layout = layout.filter(|l| l.len() == cut.vertices.len());
    if let Some(layout) = layout {
        for p in layout.positions() {
            writeln!(out, "vt {} {}", p.x, p.y)?;
        }
    }
    for f in &cut.faces {
        let [a, b, c] = f.map(|i| i + 1);
        if layout.is_some() {
            writeln!(out, "f {a}/{a} {b}/{b} {c}/{c}")?;
        } else {
            writeln!(out, "f {a} {b} {c}")?;
        }
    }
    out.flush()
}

/// Save a cut mesh to an OBJ file.
pub fn save<P: AsRef<Path>>(cut: &CutMesh, layout: Option<&UvLayout>, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write(cut, layout, &mut writer).map_err(|e| EditorError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
