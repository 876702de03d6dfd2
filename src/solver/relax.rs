//! Local/global relaxation of a UV layout.
//!
//! Each iteration fits, per face, the rotation that best maps the face's
//! flattened rest triangle onto its current UV triangle (2x2 SVD). Every
//! vertex then moves to the weighted mean of the positions its faces want
//! for it, its face targets, and its separation partners. Pinned vertices
//! stay put.

use nalgebra::{Matrix2, Point2, Point3, Vector2};
use rayon::prelude::*;

use super::{Solver, SolverConstraints, SolverOptions, SolverProblem, SolverStatus, UvLayout};
use crate::error::SolverFailure;
use crate::mesh::{FaceId, SoupVertexId, MIN_FACE_AREA};

/// Rest triangle of one face in its own plane, centred on its centroid.
#[derive(Debug, Clone, Copy)]
pub(super) struct RestTriangle {
    pub(super) corners: [Vector2<f64>; 3],
    pub(super) area: f64,
}

/// Built-in [`Solver`]: Jacobi-style local/global relaxation.
#[derive(Debug, Clone)]
pub struct RelaxationSolver {
    faces: Vec<[SoupVertexId; 3]>,
    rest: Vec<RestTriangle>,
    layout: UvLayout,
    constraints: SolverConstraints,
    options: SolverOptions,
    initial_energy: Option<f64>,
    iterations: u64,
}

/// Flatten a 3D triangle into its plane, scaled by `scale`.
pub(super) fn flatten(rest: &[Point3<f64>; 3], scale: f64) -> Option<RestTriangle> {
    let e1 = rest[1] - rest[0];
    let e2 = rest[2] - rest[0];
    let e1_len = e1.norm();
    let normal = e1.cross(&e2);
    let area = 0.5 * normal.norm();
    if e1_len < 1e-12 || area < MIN_FACE_AREA {
        return None;
    }

    let x_axis = e1 / e1_len;
    let y_axis = normal.cross(&e1).normalize();
    let q = [
        Vector2::zeros(),
        Vector2::new(e1_len, 0.0),
        Vector2::new(e2.dot(&x_axis), e2.dot(&y_axis)),
    ];
    let centroid = (q[0] + q[1] + q[2]) / 3.0;
    Some(RestTriangle {
        corners: q.map(|c| (c - centroid) * scale),
        area: area * scale * scale,
    })
}

/// Closest rotation to `m` (polar decomposition via SVD).
fn closest_rotation(m: &Matrix2<f64>) -> Matrix2<f64> {
    let svd = m.svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return Matrix2::identity();
    };

    let r = u * v_t;
    if r.determinant() < 0.0 {
        let mut u_fixed = u;
        u_fixed[(0, 1)] = -u_fixed[(0, 1)];
        u_fixed[(1, 1)] = -u_fixed[(1, 1)];
        return u_fixed * v_t;
    }
    r
}

fn triangle_area_2d(p: &[Point2<f64>; 3]) -> f64 {
    0.5 * signed_area_2x(p).abs()
}

/// Twice the signed area of a UV triangle; positive when counter-clockwise.
pub(super) fn signed_area_2x(p: &[Point2<f64>; 3]) -> f64 {
    let a = p[1] - p[0];
    let b = p[2] - p[0];
    a.x * b.y - a.y * b.x
}

/// Scale taking rest shapes to the total area of `layout`.
pub(super) fn rest_scale(
    rest: &[[Point3<f64>; 3]],
    faces: &[[SoupVertexId; 3]],
    layout: &UvLayout,
) -> f64 {
    let rest_area: f64 = rest
        .iter()
        .map(|r| 0.5 * (r[1] - r[0]).cross(&(r[2] - r[0])).norm())
        .sum();
    let uv_area: f64 = faces
        .iter()
        .map(|f| triangle_area_2d(&f.map(|s| layout.position(s))))
        .sum();
    if rest_area > 0.0 && uv_area > 0.0 {
        (uv_area / rest_area).sqrt()
    } else {
        1.0
    }
}

impl RelaxationSolver {
    /// Create a solver. Fails with [`SolverFailure::Singular`] if a face has
    /// no usable rest shape.
    pub fn new(problem: SolverProblem) -> Result<Self, SolverFailure> {
        // Rest shapes are scaled so the relaxed layout keeps the area of the
        // initial layout.
        let scale = rest_scale(&problem.rest, &problem.faces, &problem.initial);

        let rest = problem
            .rest
            .iter()
            .enumerate()
            .map(|(fi, r)| flatten(r, scale).ok_or(SolverFailure::Singular { face: fi }))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            faces: problem.faces,
            rest,
            layout: problem.initial,
            constraints: SolverConstraints::default(),
            options: problem.options,
            initial_energy: None,
            iterations: 0,
        })
    }

    /// Best-fit target positions of one face's corners.
    fn face_targets(&self, fi: usize) -> [Point2<f64>; 3] {
        let face = self.faces[fi];
        let rest = &self.rest[fi];
        let uv = face.map(|s| self.layout.position(s).coords);
        let centroid = (uv[0] + uv[1] + uv[2]) / 3.0;

        let mut s = Matrix2::zeros();
        for k in 0..3 {
            s += (uv[k] - centroid) * rest.corners[k].transpose();
        }
        let r = closest_rotation(&s);
        rest.corners.map(|c| Point2::from(centroid + r * c))
    }

    fn energy(&self, targets: &[[Point2<f64>; 3]]) -> f64 {
        let mut energy = 0.0;
        for (fi, face) in self.faces.iter().enumerate() {
            let w = self.rest[fi].area;
            for k in 0..3 {
                energy += w * (self.layout.position(face[k]) - targets[fi][k]).norm_squared();
            }
        }
        for (f, target) in &self.constraints.face_targets {
            let Some(face) = self.faces.get(f.index()) else {
                continue;
            };
            for k in 0..3 {
                energy += target.weight
                    * (self.layout.position(face[k]) - target.positions[k]).norm_squared();
            }
        }
        let n = self.layout.len();
        for pair in &self.constraints.separation {
            if pair.a.index() >= n || pair.b.index() >= n {
                continue;
            }
            energy += pair.weight
                * (self.layout.position(pair.a) - self.layout.position(pair.b)).norm_squared();
        }
        energy
    }

    fn apply_pins(&mut self) {
        for (&s, &p) in &self.constraints.pinned {
            if s.index() < self.layout.len() {
                self.layout.set_position(s, p);
            }
        }
    }
}

impl Solver for RelaxationSolver {
    fn set_constraints(&mut self, constraints: &SolverConstraints) {
        self.constraints = constraints.clone();
        self.initial_energy = None;
        self.apply_pins();
    }

    fn step(&mut self) -> Result<SolverStatus, SolverFailure> {
        let n = self.layout.len();
        let targets: Vec<[Point2<f64>; 3]> = if self.options.parallel {
            (0..self.faces.len())
                .into_par_iter()
                .map(|fi| self.face_targets(fi))
                .collect()
        } else {
            (0..self.faces.len()).map(|fi| self.face_targets(fi)).collect()
        };

        let energy = self.energy(&targets);
        let iteration = self.iterations;
        let initial = *self.initial_energy.get_or_insert(energy);
        if !energy.is_finite() || energy > self.options.divergence_limit * initial.max(1.0) {
            return Err(SolverFailure::Diverged { iteration, energy });
        }

        let mut sum = vec![Vector2::zeros(); n];
        let mut weight = vec![0.0; n];
        for (fi, face) in self.faces.iter().enumerate() {
            let w = self.rest[fi].area;
            for k in 0..3 {
                sum[face[k].index()] += targets[fi][k].coords * w;
                weight[face[k].index()] += w;
            }
        }
        for (f, target) in &self.constraints.face_targets {
            let Some(face) = self.faces.get(f.index()) else {
                continue;
            };
            for k in 0..3 {
                sum[face[k].index()] += target.positions[k].coords * target.weight;
                weight[face[k].index()] += target.weight;
            }
        }
        for pair in &self.constraints.separation {
            let (a, b) = (pair.a.index(), pair.b.index());
            if a >= n || b >= n {
                continue;
            }
            let mid =
                (self.layout.position(pair.a).coords + self.layout.position(pair.b).coords) * 0.5;
            sum[a] += mid * pair.weight;
            weight[a] += pair.weight;
            sum[b] += mid * pair.weight;
            weight[b] += pair.weight;
        }

        let mut max_move: f64 = 0.0;
        for i in 0..n {
            let s = SoupVertexId::new(i);
            if self.constraints.pinned.contains_key(&s) || weight[i] <= 0.0 {
                continue;
            }
            let next = Point2::from(sum[i] / weight[i]);
            if !next.x.is_finite() || !next.y.is_finite() {
                return Err(SolverFailure::NonFinite {
                    iteration,
                    vertex: i,
                });
            }
            max_move = max_move.max((next - self.layout.position(s)).norm());
            self.layout.set_position(s, next);
        }

        self.iterations += 1;
        if max_move < self.options.convergence_tolerance {
            Ok(SolverStatus::Converged { energy })
        } else {
            Ok(SolverStatus::Running { energy })
        }
    }

    fn layout(&self) -> &UvLayout {
        &self.layout
    }

    fn iterations(&self) -> u64 {
        self.iterations
    }
}

/// Faces whose UV triangle is flipped relative to the majority orientation.
pub fn flipped_faces(layout: &UvLayout, faces: &[[SoupVertexId; 3]]) -> Vec<FaceId> {
    let signed: Vec<f64> = faces
        .iter()
        .map(|f| signed_area_2x(&f.map(|s| layout.position(s))))
        .collect();
    let positive = signed.iter().filter(|&&s| s > 0.0).count();
    let majority_positive = positive * 2 >= signed.len();
    signed
        .iter()
        .enumerate()
        .filter(|(_, s)| if majority_positive { **s < 0.0 } else { **s > 0.0 })
        .map(|(i, _)| FaceId::new(i))
        .collect()
}
