//! The interaction mode state machine.

use log::{debug, warn};
use nalgebra::Point2;

use super::mode::{BoxDrag, FaceDrag, Mode, ModeState};
use super::{BoundingBox, Key, Modifiers, MouseButton, PaintBatch, PainterMode, Panel, PointerPos};
use crate::algo::pick::{
    nearest_edge_3d, nearest_edge_uv, nearest_vertex_3d, nearest_vertex_uv, pick_face_3d,
    pick_face_uv, FaceHit,
};
use crate::algo::{PathGraph, SeamPathFinder, SeamPathOptions};
use crate::error::Result;
use crate::mesh::{MeshEdge, VertexId};
use crate::scene::Scene;
use crate::settings::EditorSettings;
use crate::view::{OrbitCamera, UvView};

/// Everything an event handler may read or change.
pub struct EventContext<'a> {
    /// The loaded scene.
    pub scene: &'a mut Scene,
    /// 3D panel camera.
    pub camera: &'a mut OrbitCamera,
    /// UV panel transform.
    pub uv_view: &'a mut UvView,
    /// Editor settings.
    pub settings: &'a EditorSettings,
}

/// What the host has to do after an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Something visible changed.
    pub redraw: bool,
    /// Constraints changed and must be published to the solver.
    pub publish: bool,
    /// The soup was rebuilt and the solver must be rebuilt with it.
    pub topology_changed: bool,
}

impl Outcome {
    /// Nothing happened.
    pub const NONE: Self = Self {
        redraw: false,
        publish: false,
        topology_changed: false,
    };

    /// Only a redraw is needed.
    pub const REDRAW: Self = Self {
        redraw: true,
        publish: false,
        topology_changed: false,
    };

    /// Constraints changed.
    pub const PUBLISH: Self = Self {
        redraw: true,
        publish: true,
        topology_changed: false,
    };

    /// The soup topology changed.
    pub const TOPOLOGY: Self = Self {
        redraw: true,
        publish: true,
        topology_changed: true,
    };

    /// Redraw if `changed`.
    pub fn redraw_if(changed: bool) -> Self {
        if changed {
            Self::REDRAW
        } else {
            Self::NONE
        }
    }

    /// Whether the event had any effect.
    pub fn handled(&self) -> bool {
        self.redraw || self.publish || self.topology_changed
    }
}

#[derive(Debug, Clone, Copy)]
struct CameraDrag {
    button: MouseButton,
    panel: Panel,
    last: Point2<f64>,
}

fn pick_face(ctx: &EventContext<'_>, pos: &PointerPos) -> Option<FaceHit> {
    match pos.panel {
        Panel::Mesh => pick_face_3d(ctx.scene.mesh(), &ctx.camera.ray_from_ndc(&pos.ndc)),
        Panel::Uv => pick_face_uv(
            ctx.scene.soup(),
            ctx.scene.layout(),
            &ctx.uv_view.ndc_to_uv(&pos.ndc),
        ),
    }
}

fn pick_edge(ctx: &EventContext<'_>, pos: &PointerPos) -> Option<MeshEdge> {
    let scene = &*ctx.scene;
    let hit = pick_face(ctx, pos)?;
    match pos.panel {
        Panel::Mesh => {
            let point = ctx.camera.ray_from_ndc(&pos.ndc).at(hit.t);
            let tolerance = ctx.settings.edge_pick_tolerance * scene.mesh().extent();
            nearest_edge_3d(scene.mesh(), hit.face, &point, tolerance)
        }
        Panel::Uv => {
            let uv = ctx.uv_view.ndc_to_uv(&pos.ndc);
            nearest_edge_uv(
                scene.soup(),
                scene.layout(),
                hit.face,
                &uv,
                ctx.settings.uv_pick_tolerance,
            )
            .map(|e| scene.soup().mesh_edge_of(e))
        }
    }
}

fn pick_vertex(ctx: &EventContext<'_>, pos: &PointerPos) -> Option<VertexId> {
    let scene = &*ctx.scene;
    let hit = pick_face(ctx, pos)?;
    match pos.panel {
        Panel::Mesh => {
            let point = ctx.camera.ray_from_ndc(&pos.ndc).at(hit.t);
            let tolerance = ctx.settings.vertex_pick_tolerance * scene.mesh().extent();
            nearest_vertex_3d(scene.mesh(), hit.face, &point, tolerance)
        }
        Panel::Uv => {
            let uv = ctx.uv_view.ndc_to_uv(&pos.ndc);
            nearest_vertex_uv(
                scene.soup(),
                scene.layout(),
                hit.face,
                &uv,
                ctx.settings.uv_pick_tolerance,
            )
            .map(|s| scene.soup().soup_to_orig(s))
        }
    }
}

/// Routes pointer and key events to the active mode.
///
/// # Example
///
/// ```
/// use seamstress::interaction::{InteractionModeMachine, Mode};
///
/// let mut machine = InteractionModeMachine::new();
/// machine.set_mode(Mode::Painting, None);
/// assert_eq!(machine.mode(), Mode::Painting);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InteractionModeMachine {
    state: ModeState,
    camera_drag: Option<CameraDrag>,
    last_batch: Option<PaintBatch>,
}

impl InteractionModeMachine {
    /// Create a machine in face positioning mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// The active mode.
    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    /// The active mode's state.
    pub fn state(&self) -> &ModeState {
        &self.state
    }

    /// Whether a drag that edits the layout is in progress.
    pub fn is_dragging(&self) -> bool {
        self.state.is_dragging()
    }

    /// The last committed paint or box batch.
    pub fn last_paint_batch(&self) -> Option<&PaintBatch> {
        self.last_batch.as_ref()
    }

    /// Switch modes, running the exit action of the current mode and
    /// discarding its transient state. Re-selecting the active mode does
    /// nothing.
    pub fn set_mode(&mut self, mode: Mode, scene: Option<&mut Scene>) -> Outcome {
        if mode == self.mode() {
            return Outcome::NONE;
        }
        let mut outcome = Outcome::REDRAW;
        if let Some(scene) = scene {
            match &mut self.state {
                ModeState::EdgeCutting(_) => {
                    scene.clear_hover();
                }
                ModeState::FacePositioning(state) => {
                    if let Some(drag) = state.drag.take() {
                        scene.commit_face_position(drag.face);
                        outcome = Outcome::PUBLISH;
                    }
                }
                ModeState::BBoxDrawing(state) => {
                    if let Some(BoxDrag::NewBox { start, current }) = state.drag.take() {
                        if !BoundingBox::new(start, current).is_degenerate() {
                            scene.add_box(start, current);
                        }
                    }
                    scene.reclassify_boxes();
                }
                _ => {}
            }
        }
        debug!("mode {} -> {}", self.mode(), mode);
        self.state = ModeState::enter(mode);
        self.camera_drag = None;
        outcome
    }

    /// Handle pointer motion.
    pub fn mouse_move(&mut self, ctx: &mut EventContext<'_>, pos: PointerPos) -> Result<Outcome> {
        if let Some(drag) = self.camera_drag.as_mut() {
            if drag.panel == pos.panel {
                let delta = pos.ndc - drag.last;
                drag.last = pos.ndc;
                let sensitivity = ctx.settings.rotation_sensitivity;
                match (drag.panel, drag.button) {
                    (Panel::Mesh, MouseButton::Left) => {
                        ctx.camera
                            .rotate(-delta.x * sensitivity, -delta.y * sensitivity);
                    }
                    (Panel::Mesh, _) => ctx.camera.translate(delta),
                    (Panel::Uv, _) => ctx.uv_view.pan(delta),
                }
                return Ok(Outcome::REDRAW);
            }
        }

        let outcome = match &mut self.state {
            ModeState::EdgeCutting(_) => match pick_edge(ctx, &pos) {
                Some(edge) => Outcome::redraw_if(ctx.scene.hover_edge(edge)),
                None => Outcome::redraw_if(ctx.scene.clear_hover()),
            },
            ModeState::FacePositioning(state) => match (state.drag.as_mut(), pos.panel) {
                (Some(drag), Panel::Uv) => {
                    let uv = ctx.uv_view.ndc_to_uv(&pos.ndc);
                    ctx.scene.translate_faces(&[drag.face], uv - drag.last);
                    drag.last = uv;
                    Outcome::REDRAW
                }
                _ => Outcome::NONE,
            },
            ModeState::Painting(state) => {
                if state.painting {
                    match pick_face(ctx, &pos) {
                        Some(hit) => {
                            Outcome::redraw_if(state.strokes.paint(hit.face, state.painter))
                        }
                        None => Outcome::NONE,
                    }
                } else if let (Some(last), Panel::Uv) = (state.translating, pos.panel) {
                    let uv = ctx.uv_view.ndc_to_uv(&pos.ndc);
                    let delta = uv - last;
                    let active: Vec<_> = ctx.scene.constraints().active_faces().collect();
                    ctx.scene.constraints_mut().translate_active(delta);
                    ctx.scene.translate_faces(&active, delta);
                    state.translating = Some(uv);
                    Outcome::REDRAW
                } else {
                    Outcome::NONE
                }
            }
            ModeState::BBoxDrawing(state) => match (state.drag.as_mut(), pos.panel) {
                (Some(BoxDrag::NewBox { current, .. }), Panel::Uv) => {
                    *current = ctx.uv_view.ndc_to_uv(&pos.ndc);
                    Outcome::REDRAW
                }
                (Some(BoxDrag::Corner { index, corner }), Panel::Uv) => {
                    let uv = ctx.uv_view.ndc_to_uv(&pos.ndc);
                    ctx.scene.move_box_corner(*index, *corner, uv);
                    Outcome::REDRAW
                }
                _ => Outcome::NONE,
            },
            ModeState::Move | ModeState::VertexClicking => Outcome::NONE,
        };
        Ok(outcome)
    }

    /// Handle a button press.
    ///
    /// Returns [`EditorError::NoPath`](crate::error::EditorError::NoPath)
    /// when the two endpoints of an initial cut are disconnected; the
    /// endpoints are cleared and cutting mode stays active.
    pub fn mouse_down(
        &mut self,
        ctx: &mut EventContext<'_>,
        pos: PointerPos,
        button: MouseButton,
        modifiers: Modifiers,
    ) -> Result<Outcome> {
        let camera_drag = CameraDrag {
            button,
            panel: pos.panel,
            last: pos.ndc,
        };
        if button == MouseButton::Middle {
            self.camera_drag = Some(camera_drag);
            return Ok(Outcome::NONE);
        }

        let outcome = match &mut self.state {
            ModeState::Move => {
                self.camera_drag = Some(camera_drag);
                Outcome::NONE
            }
            ModeState::EdgeCutting(state) => {
                if button != MouseButton::Left {
                    return Ok(Outcome::NONE);
                }
                if !modifiers.ctrl {
                    return Ok(match pick_edge(ctx, &pos) {
                        Some(edge) => {
                            ctx.scene.toggle_edge(edge);
                            Outcome::PUBLISH
                        }
                        None => Outcome::NONE,
                    });
                }
                let Some(v) = pick_vertex(ctx, &pos) else {
                    return Ok(Outcome::NONE);
                };
                let Some(first) = state.first.take() else {
                    debug!("cut start at {:?}", v);
                    state.first = Some(v);
                    return Ok(Outcome::REDRAW);
                };

                let graph = if ctx.scene.adjacency().has_quads() {
                    PathGraph::Quads
                } else {
                    PathGraph::Triangles
                };
                let path = SeamPathFinder::new(ctx.scene.adjacency())
                    .with_options(SeamPathOptions::default().with_graph(graph))
                    .find_path(first, v);
                match path {
                    Ok(path) if path.is_empty() => Outcome::NONE,
                    Ok(path) => {
                        ctx.scene.confirm_cut(&path)?;
                        Outcome::TOPOLOGY
                    }
                    Err(e) => {
                        warn!("initial cut failed: {}", e);
                        return Err(e);
                    }
                }
            }
            ModeState::FacePositioning(state) => {
                if button != MouseButton::Left || pos.panel != Panel::Uv {
                    return Ok(Outcome::NONE);
                }
                match pick_face(ctx, &pos) {
                    Some(hit) => {
                        state.drag = Some(FaceDrag {
                            face: hit.face,
                            last: ctx.uv_view.ndc_to_uv(&pos.ndc),
                        });
                        Outcome::REDRAW
                    }
                    None => Outcome::NONE,
                }
            }
            ModeState::Painting(state) => match button {
                MouseButton::Left => {
                    state.painting = true;
                    state.strokes.clear();
                    match pick_face(ctx, &pos) {
                        Some(hit) => {
                            Outcome::redraw_if(state.strokes.paint(hit.face, state.painter))
                        }
                        None => Outcome::NONE,
                    }
                }
                MouseButton::Right
                    if state.painter == PainterMode::Move && pos.panel == Panel::Uv =>
                {
                    state.translating = Some(ctx.uv_view.ndc_to_uv(&pos.ndc));
                    Outcome::NONE
                }
                _ => Outcome::NONE,
            },
            ModeState::VertexClicking => {
                if button != MouseButton::Left {
                    return Ok(Outcome::NONE);
                }
                match pick_vertex(ctx, &pos) {
                    Some(v) => {
                        ctx.scene.toggle_pin(v);
                        Outcome::PUBLISH
                    }
                    None => Outcome::NONE,
                }
            }
            ModeState::BBoxDrawing(state) => {
                if button != MouseButton::Left || pos.panel != Panel::Uv {
                    return Ok(Outcome::NONE);
                }
                let uv = ctx.uv_view.ndc_to_uv(&pos.ndc);
                let boxes = ctx.scene.boxes_mut();
                if let Some((index, corner)) =
                    boxes.corner_near(&uv, ctx.settings.uv_pick_tolerance)
                {
                    boxes.select(Some(index));
                    state.drag = Some(BoxDrag::Corner { index, corner });
                } else if let Some(index) = boxes.box_at(&uv) {
                    boxes.select(Some(index));
                } else if state.is_adding_first_corner {
                    boxes.select(None);
                    state.is_adding_first_corner = false;
                    state.drag = Some(BoxDrag::NewBox {
                        start: uv,
                        current: uv,
                    });
                }
                Outcome::REDRAW
            }
        };
        Ok(outcome)
    }

    /// Handle a button release.
    pub fn mouse_up(
        &mut self,
        ctx: &mut EventContext<'_>,
        pos: PointerPos,
        button: MouseButton,
    ) -> Result<Outcome> {
        if self.camera_drag.is_some_and(|d| d.button == button) {
            self.camera_drag = None;
            return Ok(Outcome::NONE);
        }

        let outcome = match &mut self.state {
            ModeState::FacePositioning(state) if button == MouseButton::Left => {
                match state.drag.take() {
                    Some(drag) => {
                        ctx.scene.commit_face_position(drag.face);
                        Outcome::PUBLISH
                    }
                    None => Outcome::NONE,
                }
            }
            ModeState::Painting(state) if button == MouseButton::Left => {
                if !state.painting {
                    return Ok(Outcome::NONE);
                }
                state.painting = false;
                let batch = state.strokes.commit();
                debug!(
                    "paint batch: {} fixed, {} active, {} erased",
                    batch.fixed.len(),
                    batch.active.len(),
                    batch.erased.len()
                );
                if batch.is_empty() {
                    Outcome::NONE
                } else {
                    ctx.scene.apply_batch(&batch);
                    self.last_batch = Some(batch);
                    Outcome::PUBLISH
                }
            }
            ModeState::Painting(state) if button == MouseButton::Right => {
                match state.translating.take() {
                    Some(_) => Outcome::PUBLISH,
                    None => Outcome::NONE,
                }
            }
            ModeState::BBoxDrawing(state) if button == MouseButton::Left => {
                match state.drag.take() {
                    Some(BoxDrag::NewBox { start, .. }) => {
                        state.is_adding_first_corner = true;
                        let end = if pos.panel == Panel::Uv {
                            ctx.uv_view.ndc_to_uv(&pos.ndc)
                        } else {
                            start
                        };
                        if BoundingBox::new(start, end).is_degenerate() {
                            debug!("discarding zero-area box");
                        } else {
                            let index = ctx.scene.add_box(start, end);
                            ctx.scene.boxes_mut().select(Some(index));
                        }
                        Outcome::REDRAW
                    }
                    Some(BoxDrag::Corner { .. }) => Outcome::REDRAW,
                    None => Outcome::NONE,
                }
            }
            _ => Outcome::NONE,
        };
        Ok(outcome)
    }

    /// Zoom the panel under the pointer. Positive `delta` zooms in.
    pub fn mouse_scroll(
        &mut self,
        ctx: &mut EventContext<'_>,
        pos: PointerPos,
        delta: f64,
    ) -> Outcome {
        if delta == 0.0 {
            return Outcome::NONE;
        }
        let factor = (1.0 - ctx.settings.zoom_step).powf(delta);
        match pos.panel {
            Panel::Mesh => ctx.camera.zoom(factor),
            Panel::Uv => ctx.uv_view.zoom_at(&pos.ndc, 1.0 / factor),
        }
        Outcome::REDRAW
    }

    /// Handle a key press.
    pub fn key_down(
        &mut self,
        ctx: &mut EventContext<'_>,
        key: Key,
        _modifiers: Modifiers,
    ) -> Result<Outcome> {
        let outcome = match (&mut self.state, key) {
            (ModeState::EdgeCutting(_), Key::Enter) => {
                ctx.scene.apply_fixed_seams()?;
                Outcome::TOPOLOGY
            }
            (ModeState::EdgeCutting(state), Key::Escape) => {
                state.first = None;
                ctx.scene.clear_hover();
                Outcome::REDRAW
            }
            (ModeState::Painting(state), Key::Char(c)) => match PainterMode::from_key(c) {
                Some(painter) => {
                    debug!("painter mode {:?}", painter);
                    state.painter = painter;
                    Outcome::REDRAW
                }
                None => Outcome::NONE,
            },
            (ModeState::BBoxDrawing(_), Key::Char(c)) => {
                let (Some(painter), Some(members)) =
                    (PainterMode::from_key(c), ctx.scene.boxes().selected_members())
                else {
                    return Ok(Outcome::NONE);
                };
                let batch = PaintBatch::uniform(members.iter().copied(), painter);
                debug!("box action {:?} on {} faces", painter, batch.len());
                if batch.is_empty() {
                    return Ok(Outcome::NONE);
                }
                ctx.scene.apply_batch(&batch);
                self.last_batch = Some(batch);
                Outcome::PUBLISH
            }
            (ModeState::BBoxDrawing(_), Key::Delete) => {
                let boxes = ctx.scene.boxes_mut();
                match boxes.selected() {
                    Some(index) => {
                        boxes.remove(index);
                        Outcome::REDRAW
                    }
                    None => Outcome::NONE,
                }
            }
            (ModeState::BBoxDrawing(state), Key::Escape) => {
                state.drag = None;
                state.is_adding_first_corner = true;
                ctx.scene.boxes_mut().select(None);
                Outcome::REDRAW
            }
            _ => Outcome::NONE,
        };
        Ok(outcome)
    }

    /// Handle a key release. No mode binds key releases.
    pub fn key_up(&mut self, _key: Key, _modifiers: Modifiers) -> Outcome {
        Outcome::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditorError;
    use crate::mesh::{FaceId, Mesh};
    use nalgebra::Point3;

    struct Fixture {
        scene: Scene,
        camera: OrbitCamera,
        uv_view: UvView,
        settings: EditorSettings,
    }

    impl Fixture {
        fn new(mesh: Mesh) -> Self {
            Self {
                scene: Scene::new(mesh).unwrap(),
                camera: OrbitCamera::default(),
                uv_view: UvView::default(),
                settings: EditorSettings::default(),
            }
        }

        fn ctx(&mut self) -> EventContext<'_> {
            EventContext {
                scene: &mut self.scene,
                camera: &mut self.camera,
                uv_view: &mut self.uv_view,
                settings: &self.settings,
            }
        }

        /// Pointer over a UV point.
        fn at_uv(&self, uv: Point2<f64>) -> PointerPos {
            let ndc = self.uv_view.uv_to_ndc(&uv);
            PointerPos::uv(ndc.x, ndc.y)
        }

        /// Pointer over the UV centroid of a face.
        fn at_face(&self, f: usize) -> PointerPos {
            let tri = self
                .scene
                .layout()
                .face_positions(self.scene.soup(), FaceId::new(f));
            self.at_uv(Point2::from((tri[0].coords + tri[1].coords + tri[2].coords) / 3.0))
        }

        /// Pointer over the first UV copy of a vertex.
        fn at_vertex(&self, v: usize) -> PointerPos {
            let s = self.scene.soup().copies_of(VertexId::new(v))[0];
            self.at_uv(self.scene.layout().position(s))
        }
    }

    fn ladder() -> Mesh {
        let vertices: Vec<_> = (0..8)
            .map(|i| Point3::new((i % 2) as f64, (i / 2) as f64, 0.0))
            .collect();
        let faces = [[0, 1, 3], [0, 3, 2], [2, 3, 5], [2, 5, 4], [4, 5, 7], [4, 7, 6]];
        Mesh::from_triangles(&vertices, &faces).unwrap()
    }

    fn two_islands() -> Mesh {
        let vertices = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(3.0, 1.0, 0.0),
        ];
        Mesh::from_triangles(&vertices, &[[0, 1, 2], [3, 4, 5]]).unwrap()
    }

    #[test]
    fn test_mode_change_discards_transient_state() {
        let mut fx = Fixture::new(ladder());
        let mut machine = InteractionModeMachine::new();
        machine.set_mode(Mode::Painting, Some(&mut fx.scene));

        let pos = fx.at_face(2);
        machine
            .mouse_down(&mut fx.ctx(), pos, MouseButton::Left, Modifiers::NONE)
            .unwrap();
        let ModeState::Painting(state) = machine.state() else {
            panic!("not painting");
        };
        assert_eq!(state.strokes.len(), 1);

        machine.set_mode(Mode::Move, Some(&mut fx.scene));
        machine.set_mode(Mode::Painting, Some(&mut fx.scene));
        let ModeState::Painting(state) = machine.state() else {
            panic!("not painting");
        };
        assert!(state.strokes.is_empty());
        assert!(!state.painting);
        assert_eq!(fx.scene.constraints().fixed_faces().count(), 0);
    }

    #[test]
    fn test_paint_gesture_commits_batch() {
        let mut fx = Fixture::new(ladder());
        let mut machine = InteractionModeMachine::new();
        machine.set_mode(Mode::Painting, Some(&mut fx.scene));

        let (a, b) = (fx.at_face(0), fx.at_face(3));
        machine
            .mouse_down(&mut fx.ctx(), a, MouseButton::Left, Modifiers::NONE)
            .unwrap();
        machine.mouse_move(&mut fx.ctx(), b).unwrap();
        machine.mouse_move(&mut fx.ctx(), a).unwrap();
        let outcome = machine.mouse_up(&mut fx.ctx(), a, MouseButton::Left).unwrap();

        assert!(outcome.publish);
        let batch = machine.last_paint_batch().unwrap();
        assert_eq!(batch.fixed, [FaceId::new(0), FaceId::new(3)].into());
        assert!(fx.scene.constraints().is_fixed(FaceId::new(3)));
    }

    #[test]
    fn test_click_toggles_edge_fix() {
        let mut fx = Fixture::new(ladder());
        let mut machine = InteractionModeMachine::new();
        machine.set_mode(Mode::EdgeCutting, Some(&mut fx.scene));

        // Midpoint of edge (2, 3) in UV.
        let layout = fx.scene.layout();
        let mid = nalgebra::center(
            &layout.position(2usize.into()),
            &layout.position(3usize.into()),
        );
        let pos = fx.at_uv(mid);
        let edge = MeshEdge::new(VertexId::new(2), VertexId::new(3));

        machine.mouse_move(&mut fx.ctx(), pos).unwrap();
        assert_eq!(fx.scene.tracker().hovered(), Some(edge));

        machine
            .mouse_down(&mut fx.ctx(), pos, MouseButton::Left, Modifiers::NONE)
            .unwrap();
        assert!(fx.scene.tracker().is_fixed(edge));
        machine
            .mouse_down(&mut fx.ctx(), pos, MouseButton::Left, Modifiers::NONE)
            .unwrap();
        assert!(!fx.scene.tracker().is_fixed(edge));

        machine.set_mode(Mode::Move, Some(&mut fx.scene));
        assert_eq!(fx.scene.tracker().hovered(), None);
    }

    #[test]
    fn test_initial_cut_from_two_vertices() {
        let mut fx = Fixture::new(ladder());
        let mut machine = InteractionModeMachine::new();
        machine.set_mode(Mode::EdgeCutting, Some(&mut fx.scene));

        let (a, b) = (fx.at_vertex(2), fx.at_vertex(3));
        let first = machine
            .mouse_down(&mut fx.ctx(), a, MouseButton::Left, Modifiers::CTRL)
            .unwrap();
        assert!(!first.topology_changed);
        let second = machine
            .mouse_down(&mut fx.ctx(), b, MouseButton::Left, Modifiers::CTRL)
            .unwrap();
        assert!(second.topology_changed);
        assert_eq!(fx.scene.soup().copies_of(VertexId::new(2)).len(), 2);
        assert_eq!(fx.scene.soup().copies_of(VertexId::new(3)).len(), 2);
    }

    #[test]
    fn test_disconnected_cut_reports_no_path() {
        let mut fx = Fixture::new(two_islands());
        let mut machine = InteractionModeMachine::new();
        machine.set_mode(Mode::EdgeCutting, Some(&mut fx.scene));

        let (a, b) = (fx.at_vertex(0), fx.at_vertex(4));
        machine
            .mouse_down(&mut fx.ctx(), a, MouseButton::Left, Modifiers::CTRL)
            .unwrap();
        let result = machine.mouse_down(&mut fx.ctx(), b, MouseButton::Left, Modifiers::CTRL);
        assert!(matches!(result, Err(EditorError::NoPath { .. })));
        assert_eq!(machine.mode(), Mode::EdgeCutting);
        let ModeState::EdgeCutting(state) = machine.state() else {
            panic!("left cutting mode");
        };
        assert_eq!(state.first, None);
    }

    #[test]
    fn test_face_drag_commits_active_face() {
        let mut fx = Fixture::new(ladder());
        let mut machine = InteractionModeMachine::new();
        assert_eq!(machine.mode(), Mode::FacePositioning);

        let start = fx.at_face(4);
        let before = fx.scene.layout().face_positions(fx.scene.soup(), FaceId::new(4));
        machine
            .mouse_down(&mut fx.ctx(), start, MouseButton::Left, Modifiers::NONE)
            .unwrap();
        let end = PointerPos::uv(start.ndc.x + 0.18, start.ndc.y);
        machine.mouse_move(&mut fx.ctx(), end).unwrap();
        assert!(machine.is_dragging());
        let outcome = machine.mouse_up(&mut fx.ctx(), end, MouseButton::Left).unwrap();

        assert!(outcome.publish);
        let target = fx.scene.constraints().active_target(FaceId::new(4)).unwrap();
        assert!((target[0].x - before[0].x - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_vertex_click_toggles_pin() {
        let mut fx = Fixture::new(ladder());
        let mut machine = InteractionModeMachine::new();
        machine.set_mode(Mode::VertexClicking, Some(&mut fx.scene));

        let pos = fx.at_vertex(5);
        machine
            .mouse_down(&mut fx.ctx(), pos, MouseButton::Left, Modifiers::NONE)
            .unwrap();
        assert!(fx.scene.constraints().is_pinned(VertexId::new(5)));

        // A miss is a no-op.
        let outcome = machine
            .mouse_down(
                &mut fx.ctx(),
                PointerPos::uv(0.99, 0.99),
                MouseButton::Left,
                Modifiers::NONE,
            )
            .unwrap();
        assert!(!outcome.handled());
    }

    #[test]
    fn test_box_draw_and_fix() {
        let mut fx = Fixture::new(ladder());
        let mut machine = InteractionModeMachine::new();
        machine.set_mode(Mode::BBoxDrawing, Some(&mut fx.scene));

        let (lo, hi) = fx.scene.layout().bounding_box().unwrap();
        let a = fx.at_uv(Point2::new(lo.x - 0.05, lo.y - 0.05));
        let b = fx.at_uv(Point2::new(hi.x + 0.05, hi.y + 0.05));
        machine
            .mouse_down(&mut fx.ctx(), a, MouseButton::Left, Modifiers::NONE)
            .unwrap();
        machine.mouse_move(&mut fx.ctx(), b).unwrap();
        machine.mouse_up(&mut fx.ctx(), b, MouseButton::Left).unwrap();

        assert_eq!(fx.scene.boxes().len(), 1);
        assert_eq!(fx.scene.boxes().selected(), Some(0));
        assert_eq!(fx.scene.boxes().boxes()[0].members.len(), 6);

        let outcome = machine
            .key_down(&mut fx.ctx(), Key::Char('F'), Modifiers::NONE)
            .unwrap();
        assert!(outcome.publish);
        assert_eq!(fx.scene.constraints().fixed_faces().count(), 6);

        machine
            .key_down(&mut fx.ctx(), Key::Delete, Modifiers::NONE)
            .unwrap();
        assert!(fx.scene.boxes().is_empty());
    }

    #[test]
    fn test_click_without_drag_adds_no_box() {
        let mut fx = Fixture::new(ladder());
        let mut machine = InteractionModeMachine::new();
        machine.set_mode(Mode::BBoxDrawing, Some(&mut fx.scene));
        let pos = PointerPos::uv(0.9, 0.9);
        machine
            .mouse_down(&mut fx.ctx(), pos, MouseButton::Left, Modifiers::NONE)
            .unwrap();
        machine.mouse_up(&mut fx.ctx(), pos, MouseButton::Left).unwrap();
        assert!(fx.scene.boxes().is_empty());
    }

    #[test]
    fn test_scroll_zooms_panel_under_pointer() {
        let mut fx = Fixture::new(ladder());
        let mut machine = InteractionModeMachine::new();
        let distance = fx.camera.distance;
        let scale = fx.uv_view.scale;
        machine.mouse_scroll(&mut fx.ctx(), PointerPos::mesh(0.0, 0.0), 1.0);
        assert!(fx.camera.distance < distance);
        assert_eq!(fx.uv_view.scale, scale);
        machine.mouse_scroll(&mut fx.ctx(), PointerPos::uv(0.0, 0.0), 1.0);
        assert!(fx.uv_view.scale > scale);
    }

    #[test]
    fn test_middle_drag_pans_in_any_mode() {
        let mut fx = Fixture::new(ladder());
        let mut machine = InteractionModeMachine::new();
        machine.set_mode(Mode::Painting, Some(&mut fx.scene));
        let center = fx.uv_view.center;
        machine
            .mouse_down(
                &mut fx.ctx(),
                PointerPos::uv(0.0, 0.0),
                MouseButton::Middle,
                Modifiers::NONE,
            )
            .unwrap();
        machine.mouse_move(&mut fx.ctx(), PointerPos::uv(0.2, 0.0)).unwrap();
        machine
            .mouse_up(&mut fx.ctx(), PointerPos::uv(0.2, 0.0), MouseButton::Middle)
            .unwrap();
        assert!(fx.uv_view.center.x < center.x);
        let ModeState::Painting(state) = machine.state() else {
            panic!("not painting");
        };
        assert!(state.strokes.is_empty());
    }
}
