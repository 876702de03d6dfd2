//! Mesh file I/O.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | Wavefront OBJ | `.obj` | ✓ | ✓ | Quads detected on load, UVs written on save |
//! | STL | `.stl` | ✓ | ✓ | Binary and ASCII, no UVs |
//!
//! # Usage
//!
//! ```no_run
//! use seamstress::io;
//!
//! let (mesh, quads) = io::load_with_quads("model.obj").unwrap();
//! println!("{} faces, quads: {}", mesh.num_faces(), quads.is_some());
//! ```

pub mod obj;
pub mod stl;

use std::path::Path;

use crate::error::{EditorError, Result};
use crate::mesh::{CutMesh, Mesh, QuadMesh};
use crate::solver::UvLayout;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ format.
    Obj,
    /// STL (stereolithography) format.
    Stl,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            "stl" => Some(Format::Stl),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

fn detect(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| EditorError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a mesh from a file with automatic format detection.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    load_with_quads(path).map(|(mesh, _)| mesh)
}

/// Load a mesh, plus its quad mesh when the file is an all-quad OBJ.
pub fn load_with_quads<P: AsRef<Path>>(path: P) -> Result<(Mesh, Option<QuadMesh>)> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Obj => obj::load_with_quads(path),
        Format::Stl => stl::load(path).map(|mesh| (mesh, None)),
    }
}

/// Save a cut mesh with automatic format detection.
///
/// The layout is written as texture coordinates where the format has them.
pub fn save_cut_mesh<P: AsRef<Path>>(
    cut: &CutMesh,
    layout: Option<&UvLayout>,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Obj => obj::save(cut, layout, path),
        Format::Stl => stl::save(cut, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path("a/b/model.OBJ"), Some(Format::Obj));
        assert_eq!(Format::from_path("model.stl"), Some(Format::Stl));
        assert_eq!(Format::from_path("model.ply"), None);
        assert_eq!(Format::from_path("model"), None);
    }

    #[test]
    fn test_unsupported_extension() {
        match load("mesh.fbx") {
            Err(EditorError::UnsupportedFormat { extension }) => assert_eq!(extension, "fbx"),
            other => panic!("expected UnsupportedFormat, got {:?}", other),
        }
        assert!(matches!(
            load("no_extension"),
            Err(EditorError::UnsupportedFormat { .. })
        ));
    }
}
