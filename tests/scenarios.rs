//! End-to-end editing scenarios against the public API.

use std::collections::BTreeSet;
use std::fs;
use std::thread;
use std::time::Duration;

use nalgebra::Point2;
use seamstress::interaction::{triangle_in_box, BoundingBox, PaintSet};
use seamstress::prelude::*;
use seamstress::seam::EdgeHighlight;
use seamstress::solver::{
    Solver, SolverConstraints, SolverFactory, SolverProblem, SolverState, SolverStatus, UvLayout,
};

/// Eight vertices, three stacked quads. Quads 0 and 1 share edge (2, 3).
const QUAD_LADDER: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
v 1 1 0
v 0 2 0
v 1 2 0
v 0 3 0
v 1 3 0
f 1 2 4 3
f 3 4 6 5
f 5 6 8 7
";

fn ladder() -> Mesh {
    let vertices: Vec<_> = (0..8)
        .map(|i| nalgebra::Point3::new((i % 2) as f64, (i / 2) as f64, 0.0))
        .collect();
    let faces = [[0, 1, 3], [0, 3, 2], [2, 3, 5], [2, 5, 4], [4, 5, 7], [4, 7, 6]];
    Mesh::from_triangles(&vertices, &faces).unwrap()
}

/// A 4x3 grid of quads, two triangles each.
fn grid() -> Mesh {
    let (w, h) = (4, 3);
    let mut vertices = Vec::new();
    for j in 0..=h {
        for i in 0..=w {
            vertices.push(nalgebra::Point3::new(i as f64, j as f64, 0.0));
        }
    }
    let mut faces = Vec::new();
    for j in 0..h {
        for i in 0..w {
            let v00 = j * (w + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + w + 1;
            let v11 = v01 + 1;
            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }
    Mesh::from_triangles(&vertices, &faces).unwrap()
}

fn e(a: usize, b: usize) -> MeshEdge {
    MeshEdge::new(VertexId::new(a), VertexId::new(b))
}

fn face_pointer(editor: &Editor, face: usize) -> PointerPos {
    let scene = editor.scene().unwrap();
    let tri = scene.layout().face_positions(scene.soup(), FaceId::new(face));
    let centroid = Point2::from((tri[0].coords + tri[1].coords + tri[2].coords) / 3.0);
    let ndc = editor.uv_view().uv_to_ndc(&centroid);
    PointerPos::uv(ndc.x, ndc.y)
}

#[test]
fn cut_between_two_quads_splits_shared_edge() {
    let path = std::env::temp_dir().join(format!("seamstress-ladder-{}.obj", std::process::id()));
    fs::write(&path, QUAD_LADDER).unwrap();

    let mut editor = Editor::new();
    editor.initialize().unwrap();
    assert!(editor.load(&path));
    fs::remove_file(&path).unwrap();

    let before = editor.scene().unwrap().cut_mesh().boundary_edges().len();
    assert!(editor.scene().unwrap().quads().is_some());
    editor.cut_between(VertexId::new(2), VertexId::new(3)).unwrap();

    let scene = editor.scene().unwrap();
    let soup = scene.soup();
    assert_eq!(soup.copies_of(VertexId::new(2)).len(), 2);
    assert_eq!(soup.copies_of(VertexId::new(3)).len(), 2);
    assert_eq!(soup.num_vertices(), 10);

    // The two sides of the cut no longer share a vertex.
    let cut = scene.cut_mesh();
    assert_eq!(cut.boundary_edges().len(), before + 2);
    let below: BTreeSet<usize> = cut.faces[..2].iter().flatten().copied().collect();
    let above: BTreeSet<usize> = cut.faces[2..].iter().flatten().copied().collect();
    assert!(below.is_disjoint(&above));

    assert!(scene.tracker().is_fixed(e(2, 3)));
}

#[test]
fn path_between_components_is_reported() {
    let vertices = vec![
        nalgebra::Point3::new(0.0, 0.0, 0.0),
        nalgebra::Point3::new(1.0, 0.0, 0.0),
        nalgebra::Point3::new(1.0, 1.0, 0.0),
        nalgebra::Point3::new(0.0, 1.0, 0.0),
        nalgebra::Point3::new(5.0, 0.0, 0.0),
        nalgebra::Point3::new(6.0, 0.0, 0.0),
        nalgebra::Point3::new(5.0, 1.0, 0.0),
    ];
    let mesh = Mesh::from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3], [4, 5, 6]]).unwrap();
    let adjacency = AdjacencyIndex::build(&mesh);

    let result = SeamPathFinder::new(&adjacency).find_path(VertexId::new(0), VertexId::new(6));
    assert!(matches!(result, Err(EditorError::NoPath { from: 0, to: 6 })));

    let mut editor = Editor::new();
    editor.load_mesh(mesh).unwrap();
    editor.set_mode(Mode::EdgeCutting).unwrap();
    let err = editor
        .cut_between(VertexId::new(0), VertexId::new(6))
        .unwrap_err();
    assert!(err.is_recoverable());
    assert_eq!(editor.mode(), Mode::EdgeCutting);
    assert!(editor.scene().unwrap().seam().is_empty());
}

#[test]
fn paint_stroke_commits_deduplicated_fixed_set() {
    let mut strokes = PaintSet::new();
    for f in [3, 7, 7, 9] {
        strokes.paint(FaceId::new(f), PainterMode::Fix);
    }
    let batch = strokes.commit();
    let expected: BTreeSet<_> = [3, 7, 9].into_iter().map(FaceId::new).collect();
    assert_eq!(batch.fixed, expected);
    assert!(batch.active.is_empty());
    assert!(batch.erased.is_empty());
}

#[test]
fn paint_drag_in_uv_panel_fixes_faces() {
    let mut editor = Editor::new();
    editor.load_mesh(grid()).unwrap();
    editor.set_mode(Mode::Painting).unwrap();

    let down = face_pointer(&editor, 3);
    editor
        .mouse_down(down, MouseButton::Left, Modifiers::NONE)
        .unwrap();
    for f in [7, 7, 9] {
        editor.mouse_move(face_pointer(&editor, f)).unwrap();
    }
    let outcome = editor
        .mouse_up(face_pointer(&editor, 9), MouseButton::Left)
        .unwrap();
    assert!(outcome.publish);

    let batch = editor.last_paint_batch().unwrap();
    let expected: BTreeSet<_> = [3, 7, 9].into_iter().map(FaceId::new).collect();
    assert_eq!(batch.fixed, expected);
    assert!(batch.active.is_empty() && batch.erased.is_empty());

    let published = editor.controller().constraints().unwrap();
    assert_eq!(published.face_targets.len(), 3);
}

#[test]
fn start_then_stop_immediately() {
    let mut editor = Editor::new();
    editor.load_mesh(ladder()).unwrap();
    editor.start_solver_thread().unwrap();
    editor.stop_solver_thread().unwrap();
    assert_eq!(editor.controller().state(), SolverState::Stopped);
    assert_eq!(editor.controller().workers_spawned(), 1);
}

#[test]
fn start_and_toggle_are_idempotent() {
    let mut editor = Editor::new();
    editor.load_mesh(ladder()).unwrap();
    editor.start_solver_thread().unwrap();
    editor.start_solver_thread().unwrap();
    assert_eq!(editor.controller().workers_spawned(), 1);
    editor.stop_solver_thread().unwrap();
    editor.stop_solver_thread().unwrap();

    let mut scene = Scene::new(ladder()).unwrap();
    let before = scene.tracker().state(e(2, 3));
    scene.toggle_edge(e(2, 3));
    scene.toggle_edge(e(2, 3));
    assert_eq!(scene.tracker().state(e(2, 3)), before);
}

#[test]
fn no_publication_after_stop() {
    let mut editor = Editor::new();
    editor.load_mesh(ladder()).unwrap();
    editor.start_solver_thread().unwrap();
    thread::sleep(Duration::from_millis(20));
    editor.stop_solver_thread().unwrap();

    let iterations = editor.controller().iterations();
    let first: UvLayout = (*editor.controller().latest_layout()).clone();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(editor.controller().iterations(), iterations);
    assert_eq!(*editor.controller().latest_layout(), first);
    assert_eq!(*editor.controller().latest_layout(), first);
    assert!(!editor.tick().unwrap());
}

/// Diverges on its first iteration.
struct Diverging {
    layout: UvLayout,
}

impl Solver for Diverging {
    fn set_constraints(&mut self, _constraints: &SolverConstraints) {}

    fn step(&mut self) -> std::result::Result<SolverStatus, SolverFailure> {
        Err(SolverFailure::Diverged {
            iteration: 0,
            energy: f64::INFINITY,
        })
    }

    fn layout(&self) -> &UvLayout {
        &self.layout
    }

    fn iterations(&self) -> u64 {
        0
    }
}

#[test]
fn failed_solver_stops_and_is_not_restarted() {
    let factory: SolverFactory = Box::new(|problem: SolverProblem| {
        Ok(Box::new(Diverging {
            layout: problem.initial,
        }) as Box<dyn Solver>)
    });
    let mut editor = Editor::new().with_solver_factory(factory);
    editor.load_mesh(ladder()).unwrap();
    editor.start_solver_thread().unwrap();
    for _ in 0..2000 {
        if !editor.controller().is_running() {
            break;
        }
        thread::sleep(Duration::from_millis(1));
    }

    let err = editor.tick().unwrap_err();
    assert!(matches!(err, EditorError::Solver(SolverFailure::Diverged { .. })));
    assert_eq!(editor.controller().state(), SolverState::Stopped);

    editor.cut_between(VertexId::new(2), VertexId::new(3)).unwrap();
    editor.set_mode(Mode::EdgeCutting).unwrap();
    editor.key_down(Key::Enter, Modifiers::NONE).unwrap();
    assert_eq!(editor.controller().workers_spawned(), 1);
    assert_eq!(editor.controller().state(), SolverState::Stopped);
    assert!(!editor.tick().unwrap());
}

#[test]
fn box_corner_order_does_not_matter() {
    let tri = [
        Point2::new(0.2, 0.2),
        Point2::new(0.4, 0.2),
        Point2::new(0.3, 0.5),
    ];
    let corners = [
        (Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)),
        (Point2::new(0.25, 0.0), Point2::new(1.0, 1.0)),
        (Point2::new(0.0, 0.6), Point2::new(0.5, 0.1)),
        (Point2::new(0.3, 0.3), Point2::new(0.3, 0.9)),
    ];
    for (a, b) in corners {
        assert_eq!(
            triangle_in_box(&tri, &BoundingBox::new(a, b)),
            triangle_in_box(&tri, &BoundingBox::new(b, a))
        );
    }
}

#[test]
fn fixing_a_seam_edge_mirrors_to_both_uv_copies() {
    let mut scene = Scene::new(ladder()).unwrap();
    scene.rebuild([e(2, 3)].into()).unwrap();

    assert!(scene.fix_edge(e(2, 3)));
    let uv = scene.tracker().uv_edges_of(e(2, 3)).to_vec();
    assert_eq!(uv.len(), 2);
    for &edge in &uv {
        assert_eq!(scene.tracker().uv_state(edge), EdgeHighlight::Fixed);
    }

    assert!(scene.unfix_edge(e(2, 3)));
    for &edge in &uv {
        assert_eq!(scene.tracker().uv_state(edge), EdgeHighlight::Cleared);
    }
    assert!(scene.tracker().domains_agree());
}
