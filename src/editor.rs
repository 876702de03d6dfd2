//! The host-facing editor.
//!
//! [`Editor`] ties a [`Scene`] to the interaction machine, the two view
//! transforms, the snapshot slots and the background solver. A host viewer
//! forwards its frame ticks and input events here and draws what
//! [`Editor::frame`] returns.

use std::path::Path;

use log::{debug, info, warn};
use nalgebra::{Point2, Point3, Vector3};

use crate::algo::{PathGraph, SeamPathFinder, SeamPathOptions};
use crate::error::{EditorError, Result};
use crate::interaction::{
    EventContext, InteractionModeMachine, Key, Mode, Modifiers, MouseButton, Outcome, PaintBatch,
    PointerPos,
};
use crate::io;
use crate::mesh::{Mesh, MeshEdge, QuadMesh, UvEdge, VertexId};
use crate::scene::Scene;
use crate::seam::Rgb;
use crate::settings::EditorSettings;
use crate::snapshot::{Snapshot, SnapshotSource, SnapshotStore, SNAPSHOT_SLOTS};
use crate::solver::{
    relaxation_factory, SolverFactory, SolverOptions, SolverThreadController, UvLayout,
};
use crate::view::{OrbitCamera, UvView};

/// Everything a host needs to draw one frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// UV position of every soup vertex.
    pub layout: UvLayout,
    /// Shading normal of every mesh vertex.
    pub normals: Vec<Vector3<f64>>,
    /// Color of every face, shared by both panels.
    pub face_colors: Vec<Rgb>,
    /// Seam separation gap of every face.
    pub separation_error: Vec<f64>,
    /// Distortion error of every face.
    pub distortion_error: Vec<f64>,
    /// Whether each face is flipped or overlaps another. All `false` unless
    /// overlaps are shown.
    pub overlapping: Vec<bool>,
    /// Highlighted 3D edges.
    pub mesh_edges: Vec<(MeshEdge, Rgb)>,
    /// Highlighted UV edges.
    pub uv_edges: Vec<(UvEdge, Rgb)>,
}

/// Interactive seam and UV editor.
///
/// # Example
///
/// ```
/// use seamstress::editor::Editor;
/// use seamstress::interaction::Mode;
/// use seamstress::mesh::Mesh;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let mesh = Mesh::from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
///
/// let mut editor = Editor::new();
/// editor.initialize().unwrap();
/// editor.load_mesh(mesh).unwrap();
/// editor.set_mode(Mode::Painting).unwrap();
/// editor.start_solver_thread().unwrap();
/// editor.tick().unwrap();
/// editor.stop_solver_thread().unwrap();
/// assert_eq!(editor.frame().unwrap().face_colors.len(), 2);
/// ```
pub struct Editor {
    settings: EditorSettings,
    solver_options: SolverOptions,
    factory: SolverFactory,
    controller: SolverThreadController,
    scene: Option<Scene>,
    machine: InteractionModeMachine,
    camera: OrbitCamera,
    uv_view: UvView,
    snapshots: SnapshotStore,
    last_synced: u64,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("mode", &self.machine.mode())
            .field("has_mesh", &self.scene.is_some())
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// Create an editor with default settings and the built-in relaxation
    /// solver.
    pub fn new() -> Self {
        Self::with_settings(EditorSettings::default(), SolverOptions::default())
    }

    /// Create an editor with explicit settings.
    pub fn with_settings(settings: EditorSettings, solver_options: SolverOptions) -> Self {
        Self {
            settings,
            controller: SolverThreadController::new(solver_options.clone()),
            solver_options,
            factory: relaxation_factory(),
            scene: None,
            machine: InteractionModeMachine::new(),
            camera: OrbitCamera::default(),
            uv_view: UvView::default(),
            snapshots: SnapshotStore::new(),
            last_synced: 0,
        }
    }

    /// Use a different solver for every topology built from now on.
    pub fn with_solver_factory(mut self, factory: SolverFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Validate the settings and reset interaction state and snapshots.
    pub fn initialize(&mut self) -> Result<()> {
        self.settings.validate()?;
        self.machine = InteractionModeMachine::new();
        self.snapshots.clear();
        debug!("editor initialized in {} mode", self.machine.mode());
        Ok(())
    }

    /// Load a mesh file. Returns `false` and keeps the current mesh if the
    /// file cannot be read or is rejected.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> bool {
        let path = path.as_ref();
        let result = io::load_with_quads(path).and_then(|(mesh, quads)| {
            let mut scene = Scene::new(mesh)?;
            if let Some(quads) = quads {
                scene.attach_quads(quads)?;
            }
            self.install_scene(scene)
        });
        match result {
            Ok(()) => {
                info!("loaded {}", path.display());
                true
            }
            Err(e) => {
                warn!("failed to load {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Replace the edited mesh. A rejected mesh leaves the current state
    /// untouched.
    pub fn load_mesh(&mut self, mesh: Mesh) -> Result<()> {
        let scene = Scene::new(mesh)?;
        self.install_scene(scene)
    }

    /// Attach the auxiliary quad mesh used for quad-graph seam paths.
    pub fn attach_quad_mesh(&mut self, quads: QuadMesh) -> Result<()> {
        self.scene_mut()?.attach_quads(quads)
    }

    fn install_scene(&mut self, scene: Scene) -> Result<()> {
        if let Err(e) = self.controller.stop() {
            warn!("discarding solver failure from previous mesh: {}", e);
        }
        self.snapshots.clear();
        if let Some((min, max)) = scene.mesh().bounding_box() {
            self.camera.frame(&min, &max);
        }
        if let Some((min, max)) = scene.layout().bounding_box() {
            self.uv_view.fit(&min, &max);
        }
        self.machine = InteractionModeMachine::new();
        self.scene = Some(scene);
        self.resync_solver()
    }

    /// The loaded scene.
    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    fn scene_mut(&mut self) -> Result<&mut Scene> {
        self.scene.as_mut().ok_or(EditorError::NoMeshLoaded)
    }

    /// Editor settings.
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Mutable access to the settings. Weight changes take effect on the
    /// next publish.
    pub fn settings_mut(&mut self) -> &mut EditorSettings {
        &mut self.settings
    }

    /// The 3D panel camera.
    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    /// The UV panel transform.
    pub fn uv_view(&self) -> &UvView {
        &self.uv_view
    }

    /// The background solver.
    pub fn controller(&self) -> &SolverThreadController {
        &self.controller
    }

    /// The snapshot slots.
    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// The active interaction mode.
    pub fn mode(&self) -> Mode {
        self.machine.mode()
    }

    /// The last committed paint or box batch.
    pub fn last_paint_batch(&self) -> Option<&PaintBatch> {
        self.machine.last_paint_batch()
    }

    /// Switch interaction modes.
    pub fn set_mode(&mut self, mode: Mode) -> Result<Outcome> {
        let outcome = self.machine.set_mode(mode, self.scene.as_mut());
        self.apply(outcome)
    }

    /// Per-frame update: surface solver failures and pull the latest
    /// published layout into the scene. Returns whether the layout changed.
    ///
    /// The layout is left alone while a drag edits it.
    pub fn tick(&mut self) -> Result<bool> {
        self.controller.poll()?;
        let iterations = self.controller.iterations();
        if iterations == self.last_synced || self.machine.is_dragging() {
            return Ok(false);
        }
        self.last_synced = iterations;
        Ok(self.pull_layout())
    }

    fn pull_layout(&mut self) -> bool {
        let Some(scene) = self.scene.as_mut() else {
            return false;
        };
        let latest = self.controller.latest_layout();
        if latest.len() != scene.soup().num_vertices() {
            return false;
        }
        scene.set_layout((*latest).clone()).is_ok()
    }

    fn dispatch<T>(
        &mut self,
        handler: impl FnOnce(&mut InteractionModeMachine, &mut EventContext<'_>) -> Result<T>,
    ) -> Result<Option<T>> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(None);
        };
        let mut ctx = EventContext {
            scene,
            camera: &mut self.camera,
            uv_view: &mut self.uv_view,
            settings: &self.settings,
        };
        handler(&mut self.machine, &mut ctx).map(Some)
    }

    fn apply(&mut self, outcome: Outcome) -> Result<Outcome> {
        if outcome.topology_changed {
            self.resync_solver()?;
        } else if outcome.publish {
            self.publish_constraints();
        }
        Ok(outcome)
    }

    /// Handle pointer motion.
    pub fn mouse_move(&mut self, pos: PointerPos) -> Result<Outcome> {
        let outcome = self.dispatch(|m, ctx| m.mouse_move(ctx, pos))?;
        self.apply(outcome.unwrap_or(Outcome::NONE))
    }

    /// Handle a button press.
    pub fn mouse_down(
        &mut self,
        pos: PointerPos,
        button: MouseButton,
        modifiers: Modifiers,
    ) -> Result<Outcome> {
        let outcome = self.dispatch(|m, ctx| m.mouse_down(ctx, pos, button, modifiers))?;
        self.apply(outcome.unwrap_or(Outcome::NONE))
    }

    /// Handle a button release.
    pub fn mouse_up(&mut self, pos: PointerPos, button: MouseButton) -> Result<Outcome> {
        let outcome = self.dispatch(|m, ctx| m.mouse_up(ctx, pos, button))?;
        self.apply(outcome.unwrap_or(Outcome::NONE))
    }

    /// Handle a scroll. Positive `delta` zooms in.
    pub fn mouse_scroll(&mut self, pos: PointerPos, delta: f64) -> Result<Outcome> {
        let outcome = self.dispatch(|m, ctx| Ok(m.mouse_scroll(ctx, pos, delta)))?;
        Ok(outcome.unwrap_or(Outcome::NONE))
    }

    /// Handle a key press.
    ///
    /// Ctrl+1..3 saves a snapshot slot and Alt+1..3 restores it in every
    /// mode; other keys go to the active mode.
    pub fn key_down(&mut self, key: Key, modifiers: Modifiers) -> Result<Outcome> {
        if let Key::Digit(d @ 1..=3) = key {
            let slot = usize::from(d - 1);
            if modifiers.ctrl {
                self.save_snapshot(slot)?;
                return Ok(Outcome::NONE);
            }
            if modifiers.alt {
                let restored = self.restore_snapshot(slot)?;
                return Ok(Outcome::redraw_if(restored));
            }
        }
        let outcome = self.dispatch(|m, ctx| m.key_down(ctx, key, modifiers))?;
        self.apply(outcome.unwrap_or(Outcome::NONE))
    }

    /// Handle a key release.
    pub fn key_up(&mut self, key: Key, modifiers: Modifiers) -> Outcome {
        self.machine.key_up(key, modifiers)
    }

    /// Start the background solver. Does nothing if it is already running.
    pub fn start_solver_thread(&mut self) -> Result<()> {
        if self.scene.is_none() {
            return Err(EditorError::NoMeshLoaded);
        }
        self.controller.start()
    }

    /// Stop the background solver and pull its final layout. Safe to call
    /// when it is not running.
    pub fn stop_solver_thread(&mut self) -> Result<()> {
        let result = self.controller.stop();
        self.last_synced = self.controller.iterations();
        self.pull_layout();
        result
    }

    /// Cut along the shortest path between two vertices.
    pub fn cut_between(&mut self, from: VertexId, to: VertexId) -> Result<()> {
        let scene = self.scene_mut()?;
        let graph = if scene.adjacency().has_quads() {
            PathGraph::Quads
        } else {
            PathGraph::Triangles
        };
        let path = SeamPathFinder::new(scene.adjacency())
            .with_options(SeamPathOptions::default().with_graph(graph))
            .find_path(from, to)?;
        if path.is_empty() {
            return Ok(());
        }
        scene.confirm_cut(&path)?;
        self.resync_solver()
    }

    /// Add every fixed edge to the seam.
    pub fn apply_fixed_seams(&mut self) -> Result<()> {
        self.scene_mut()?.apply_fixed_seams()?;
        self.resync_solver()
    }

    /// Remove the seam. Fixed highlights stay.
    pub fn clear_seam(&mut self) -> Result<()> {
        self.scene_mut()?.clear_seam()?;
        self.resync_solver()
    }

    /// Save the current mesh or layout and camera zoom into `slot`.
    pub fn save_snapshot(&mut self, slot: usize) -> Result<()> {
        if slot >= SNAPSHOT_SLOTS {
            return Err(EditorError::InvalidSnapshotSlot { slot });
        }
        let scene = self.scene.as_ref().ok_or(EditorError::NoMeshLoaded)?;
        let snapshot = if self.settings.store_3d_mesh {
            Snapshot {
                source: SnapshotSource::Mesh,
                positions: scene.mesh().positions().to_vec(),
                camera_zoom: self.camera.distance,
                normals: scene.normals().to_vec(),
            }
        } else {
            let layout = scene.layout();
            Snapshot {
                source: SnapshotSource::Uv,
                positions: layout
                    .positions()
                    .iter()
                    .map(|p| Point3::new(p.x, p.y, 0.0))
                    .collect(),
                camera_zoom: self.camera.distance,
                normals: Vec::new(),
            }
        };
        self.snapshots.save(slot, snapshot)
    }

    /// Copy `slot` back into the live state. Returns `false` if the slot is
    /// empty.
    pub fn restore_snapshot(&mut self, slot: usize) -> Result<bool> {
        let Some(snapshot) = self.snapshots.get(slot)?.cloned() else {
            debug!("snapshot {} is empty", slot);
            return Ok(false);
        };
        let scene = self.scene.as_mut().ok_or(EditorError::NoMeshLoaded)?;
        match snapshot.source {
            SnapshotSource::Mesh => {
                scene.set_positions(snapshot.positions)?;
                scene.set_normals(snapshot.normals)?;
            }
            SnapshotSource::Uv => {
                let uv = snapshot
                    .positions
                    .iter()
                    .map(|p| Point2::new(p.x, p.y))
                    .collect();
                scene.set_layout(UvLayout::new(uv))?;
            }
        }
        self.camera.distance = snapshot.camera_zoom;
        info!("restored snapshot {}", slot);
        self.resync_solver()?;
        Ok(true)
    }

    /// Draw data for the current state. `None` before a mesh is loaded.
    pub fn frame(&self) -> Option<Frame> {
        let scene = self.scene.as_ref()?;
        let (mesh_edges, uv_edges) = scene.highlighted_edges(&self.settings.palette);
        let errors = scene.face_errors(&self.settings);
        Some(Frame {
            layout: scene.layout().clone(),
            normals: scene.normals().to_vec(),
            face_colors: scene.face_colors(&self.settings, &errors),
            separation_error: errors.separation,
            distortion_error: errors.distortion,
            overlapping: errors.overlapping,
            mesh_edges,
            uv_edges,
        })
    }

    fn publish_constraints(&mut self) {
        if let Some(scene) = &self.scene {
            self.controller.publish(scene.solver_constraints(&self.settings));
        }
    }

    /// Rebuild the solver for the current soup, restarting it if it was
    /// running. A failure of the old worker is returned after the rebuild and
    /// the new solver stays stopped.
    fn resync_solver(&mut self) -> Result<()> {
        let Some(scene) = self.scene.as_ref() else {
            return Ok(());
        };
        let was_running = self.controller.is_running();
        let stopped = self.controller.stop();
        let problem = scene.solver_problem(self.solver_options.clone());
        let solver = (self.factory)(problem)?;
        self.controller.set_solver(solver)?;
        self.controller.publish(scene.solver_constraints(&self.settings));
        self.last_synced = 0;
        stopped?;
        if was_running {
            self.controller.start()?;
        }
        Ok(())
    }
}
