//! Error types for seamstress.
//!
//! This module defines all error types used throughout the library. Pick
//! misses (a pointer event that resolves to no triangle, vertex or edge) are
//! not errors; the pick functions return `None` for them.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`EditorError`].
pub type Result<T> = std::result::Result<T, EditorError>;

/// Why a face was rejected as degenerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateReason {
    /// Two corners of the face reference the same vertex.
    RepeatedVertex,
    /// The face has (numerically) zero area.
    ZeroArea,
    /// The face uses the same three vertices as an earlier face.
    Duplicate {
        /// Index of the earlier face.
        of: usize,
    },
}

impl fmt::Display for DegenerateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegenerateReason::RepeatedVertex => write!(f, "repeated vertex"),
            DegenerateReason::ZeroArea => write!(f, "zero area"),
            DegenerateReason::Duplicate { of } => write!(f, "duplicate of face {}", of),
        }
    }
}

/// Numerical failures raised by a solver iteration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverFailure {
    /// A UV coordinate became NaN or infinite.
    #[error("non-finite uv coordinate at soup vertex {vertex} in iteration {iteration}")]
    NonFinite {
        /// Iteration in which the value appeared.
        iteration: u64,
        /// Offending soup vertex.
        vertex: usize,
    },

    /// The energy grew past the divergence limit.
    #[error("solver diverged in iteration {iteration} (energy {energy:e})")]
    Diverged {
        /// Iteration in which the limit was exceeded.
        iteration: u64,
        /// Energy at that iteration.
        energy: f64,
    },

    /// A face has no usable rest shape.
    #[error("singular rest shape for face {face}")]
    Singular {
        /// The face index.
        face: usize,
    },
}

/// Errors that can occur while editing.
#[derive(Error, Debug)]
pub enum EditorError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face is degenerate; the whole mesh is rejected.
    #[error("face {face} is degenerate ({reason})")]
    DegenerateMesh {
        /// The face index.
        face: usize,
        /// What makes it degenerate.
        reason: DegenerateReason,
    },

    /// The two seam endpoints lie in different connected components.
    #[error("no path between vertex {from} and vertex {to}")]
    NoPath {
        /// Start vertex index.
        from: usize,
        /// End vertex index.
        to: usize,
    },

    /// The background solver failed and was stopped.
    #[error("solver failure: {0}")]
    Solver(#[from] SolverFailure),

    /// Snapshot slot index out of range.
    #[error(
        "snapshot slot {slot} does not exist (valid slots are 0..{max})",
        max = crate::snapshot::SNAPSHOT_SLOTS
    )]
    InvalidSnapshotSlot {
        /// The requested slot.
        slot: usize,
    },

    /// The operation needs a loaded mesh.
    #[error("no mesh loaded")]
    NoMeshLoaded,

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Invalid state for the requested operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl EditorError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        EditorError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Whether the caller can retry after this error without reloading.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EditorError::NoPath { .. }
                | EditorError::InvalidSnapshotSlot { .. }
                | EditorError::InvalidParameter { .. }
        )
    }
}
