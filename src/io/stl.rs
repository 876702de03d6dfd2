//! STL (stereolithography) format support.
//!
//! Both binary and ASCII STL files are read. Triangles that collapse after
//! vertex merging are dropped.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use log::debug;
use nalgebra::Point3;

use crate::error::{EditorError, Result};
use crate::mesh::{CutMesh, Mesh};

/// Load a mesh from an STL file.
///
/// Automatically detects binary vs ASCII format.
///
/// # Example
///
/// ```no_run
/// use seamstress::io::stl;
///
/// let mesh = stl::load("model.stl").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let stl = stl_io::read_stl(&mut file).map_err(|e| EditorError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    // stl_io already merges identical vertices.
    let vertices: Vec<Point3<f64>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();

    let faces: Vec<[usize; 3]> = stl
        .faces
        .iter()
        .map(|tri| tri.vertices)
        .filter(|[a, b, c]| a != b && b != c && a != c)
        .collect();
    let dropped = stl.faces.len() - faces.len();
    if dropped > 0 {
        debug!("dropped {} collapsed STL triangles", dropped);
    }

    if faces.is_empty() {
        return Err(EditorError::LoadError {
            path: path.to_path_buf(),
            message: "STL file contains no valid triangles".to_string(),
        });
    }

    Mesh::from_triangles(&vertices, &faces)
}

/// Save a cut mesh to a binary STL file.
pub fn save<P: AsRef<Path>>(cut: &CutMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let triangles: Vec<stl_io::Triangle> = cut
        .faces
        .iter()
        .map(|f| {
            let [p0, p1, p2] = f.map(|i| cut.vertices[i]);
            let n = (p1 - p0).cross(&(p2 - p0)).normalize();
            let vertex = |p: Point3<f64>| stl_io::Vertex::new([p.x as f32, p.y as f32, p.z as f32]);

            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [vertex(p0), vertex(p1), vertex(p2)],
            }
        })
        .collect();

    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| EditorError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
