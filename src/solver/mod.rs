//! UV solver interface and its background thread.
//!
//! A [`Solver`] relaxes a [`UvLayout`] one iteration at a time under a set of
//! [`SolverConstraints`]. The [`SolverThreadController`] runs one solver on a
//! background worker, hands it constraint updates over a channel and exposes
//! the most recently published layout.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeSet;
//! use seamstress::mesh::{build_soup, AdjacencyIndex, Mesh};
//! use seamstress::solver::{
//!     RelaxationSolver, SolverOptions, SolverProblem, SolverThreadController, UvLayout,
//! };
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mesh = Mesh::from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
//! let adjacency = AdjacencyIndex::build(&mesh);
//! let soup = build_soup(&mesh, &adjacency, &BTreeSet::new()).unwrap();
//!
//! let layout = UvLayout::planar_projection(&soup);
//! let problem = SolverProblem::new(&soup, layout, SolverOptions::default());
//! let solver = RelaxationSolver::new(problem).unwrap();
//!
//! let mut controller = SolverThreadController::new(SolverOptions::default());
//! controller.set_solver(Box::new(solver)).unwrap();
//! controller.start().unwrap();
//! controller.stop().unwrap();
//! assert_eq!(controller.latest_layout().len(), 4);
//! ```

mod controller;
mod layout;
mod metrics;
mod relax;

use std::collections::BTreeMap;
use std::time::Duration;

use nalgebra::{Point2, Point3};

use crate::error::SolverFailure;
use crate::mesh::{FaceId, SoupMesh, SoupVertexId};

pub use controller::{SolverState, SolverThreadController};
pub use layout::UvLayout;
pub use metrics::{distortion_errors, overlapping_faces, separation_errors, FaceErrors};
pub use relax::{flipped_faces, RelaxationSolver};

/// Options shared by the solver and its controller.
#[derive(Debug, Clone)]
pub struct SolverOptions {
    /// Largest per-iteration vertex displacement still counted as converged.
    pub convergence_tolerance: f64,
    /// How long a converged worker waits for new constraints before
    /// re-checking its stop flag.
    pub idle_interval: Duration,
    /// Energy growth factor over the initial energy treated as divergence.
    pub divergence_limit: f64,
    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            convergence_tolerance: 1e-6,
            idle_interval: Duration::from_millis(10),
            divergence_limit: 1e8,
            parallel: true,
        }
    }
}

impl SolverOptions {
    /// Set the convergence tolerance.
    pub fn with_convergence_tolerance(mut self, tolerance: f64) -> Self {
        self.convergence_tolerance = tolerance;
        self
    }

    /// Set the idle wait interval.
    pub fn with_idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval;
        self
    }

    /// Set the divergence limit.
    pub fn with_divergence_limit(mut self, limit: f64) -> Self {
        self.divergence_limit = limit;
        self
    }

    /// Enable or disable parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Two soup copies of the same vertex pulled together by separation energy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeparationPair {
    /// First copy.
    pub a: SoupVertexId,
    /// Second copy.
    pub b: SoupVertexId,
    /// Esep weight of the pair.
    pub weight: f64,
}

/// Soft positional target for the corners of one face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceTarget {
    /// Target UV position of each corner.
    pub positions: [Point2<f64>; 3],
    /// Weight of the target.
    pub weight: f64,
}

/// Everything the UI publishes to the solver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverConstraints {
    /// Incremented on every publish.
    pub revision: u64,
    /// Hard-pinned soup vertices.
    pub pinned: BTreeMap<SoupVertexId, Point2<f64>>,
    /// Soft targets for painted or dragged faces.
    pub face_targets: BTreeMap<FaceId, FaceTarget>,
    /// Seam copies to pull together. Fixed seams have no pairs.
    pub separation: Vec<SeparationPair>,
}

/// Result of one solver iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolverStatus {
    /// The layout is still moving.
    Running {
        /// Energy before the iteration.
        energy: f64,
    },
    /// The layout stopped moving under the current constraints.
    Converged {
        /// Energy before the iteration.
        energy: f64,
    },
}

impl SolverStatus {
    /// Energy reported by the iteration.
    pub fn energy(&self) -> f64 {
        match self {
            SolverStatus::Running { energy } | SolverStatus::Converged { energy } => *energy,
        }
    }

    /// Whether the solver converged.
    pub fn is_converged(&self) -> bool {
        matches!(self, SolverStatus::Converged { .. })
    }
}

/// An iterative UV solver.
pub trait Solver: Send {
    /// Replace the active constraints.
    fn set_constraints(&mut self, constraints: &SolverConstraints);

    /// Run one iteration.
    fn step(&mut self) -> Result<SolverStatus, SolverFailure>;

    /// The current layout.
    fn layout(&self) -> &UvLayout;

    /// Iterations run so far.
    fn iterations(&self) -> u64;
}

/// Input to construct a solver for one soup topology.
#[derive(Debug, Clone)]
pub struct SolverProblem {
    /// Soup vertices at the corners of each face.
    pub faces: Vec<[SoupVertexId; 3]>,
    /// 3D rest positions of each face's corners.
    pub rest: Vec<[Point3<f64>; 3]>,
    /// Starting layout.
    pub initial: UvLayout,
    /// Solver options.
    pub options: SolverOptions,
}

impl SolverProblem {
    /// Build a problem from a soup mesh and a starting layout.
    pub fn new(soup: &SoupMesh, initial: UvLayout, options: SolverOptions) -> Self {
        let faces = soup.faces().to_vec();
        let rest = faces
            .iter()
            .map(|f| f.map(|s| soup.vertex(s).position))
            .collect();
        Self {
            faces,
            rest,
            initial,
            options,
        }
    }
}

/// Builds a solver for a new soup topology.
pub type SolverFactory =
    Box<dyn Fn(SolverProblem) -> Result<Box<dyn Solver>, SolverFailure> + Send>;

/// The factory for [`RelaxationSolver`].
pub fn relaxation_factory() -> SolverFactory {
    Box::new(|problem| {
        RelaxationSolver::new(problem).map(|s| Box::new(s) as Box<dyn Solver>)
    })
}
