//! The loaded mesh and everything derived from it.

use std::collections::BTreeSet;

use log::{debug, info};
use nalgebra::{Point2, Point3, Vector2, Vector3};

use crate::algo::SeamPath;
use crate::error::{EditorError, Result};
use crate::interaction::{BoundingBoxSelector, Corner, FaceConstraints, PaintBatch};
use crate::mesh::{
    build_soup, AdjacencyIndex, CutMesh, FaceId, Mesh, MeshEdge, QuadMesh, SoupMesh, UvEdge,
    VertexId,
};
use crate::seam::{
    highlight_color, mix_color, HighlightPalette, Rgb, SeamHighlightTracker,
    SeparationWeightTable,
};
use crate::settings::EditorSettings;
use crate::solver::{FaceErrors, SolverConstraints, SolverOptions, SolverProblem, UvLayout};

/// Per-mesh editing state.
///
/// The soup, cut mesh and UV layout are rebuilt together whenever the seam
/// changes; the highlight tracker, constraints and boxes are carried over.
#[derive(Debug, Clone)]
pub struct Scene {
    mesh: Mesh,
    normals: Vec<Vector3<f64>>,
    quads: Option<QuadMesh>,
    adjacency: AdjacencyIndex,
    soup: SoupMesh,
    cut: CutMesh,
    layout: UvLayout,
    tracker: SeamHighlightTracker,
    weights: SeparationWeightTable,
    constraints: FaceConstraints,
    boxes: BoundingBoxSelector,
}

impl Scene {
    /// Build the scene for a mesh with an empty seam and a planar initial
    /// layout.
    pub fn new(mesh: Mesh) -> Result<Self> {
        let adjacency = AdjacencyIndex::build(&mesh);
        let soup = build_soup(&mesh, &adjacency, &BTreeSet::new())?;
        let layout = UvLayout::planar_projection(&soup);
        let cut = soup.to_cut_mesh();
        info!(
            "scene: {} vertices, {} faces, {} boundary edges",
            mesh.num_vertices(),
            mesh.num_faces(),
            adjacency.boundary_edge_count()
        );
        Ok(Self {
            normals: mesh.vertex_normals(),
            mesh,
            quads: None,
            adjacency,
            soup,
            cut,
            layout,
            tracker: SeamHighlightTracker::new(),
            weights: SeparationWeightTable::new(),
            constraints: FaceConstraints::new(),
            boxes: BoundingBoxSelector::new(),
        })
    }

    /// Attach the auxiliary quad mesh used for quad-graph seam paths.
    pub fn attach_quads(&mut self, quads: QuadMesh) -> Result<()> {
        self.adjacency = self.adjacency.clone().with_quads(&quads)?;
        self.quads = Some(quads);
        Ok(())
    }

    /// The 3D mesh.
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Shading normal of every mesh vertex.
    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    /// Replace the shading normals. The length must match the mesh.
    pub fn set_normals(&mut self, normals: Vec<Vector3<f64>>) -> Result<()> {
        if normals.len() != self.mesh.num_vertices() {
            return Err(EditorError::invalid_param(
                "normals",
                normals.len(),
                "length must match the vertex count",
            ));
        }
        self.normals = normals;
        Ok(())
    }

    /// The auxiliary quad mesh.
    pub fn quads(&self) -> Option<&QuadMesh> {
        self.quads.as_ref()
    }

    /// Adjacency of the 3D mesh.
    pub fn adjacency(&self) -> &AdjacencyIndex {
        &self.adjacency
    }

    /// The current soup.
    pub fn soup(&self) -> &SoupMesh {
        &self.soup
    }

    /// The mesh cut along the current seam.
    pub fn cut_mesh(&self) -> &CutMesh {
        &self.cut
    }

    /// The current seam.
    pub fn seam(&self) -> &BTreeSet<MeshEdge> {
        self.soup.seam()
    }

    /// The interactive copy of the UV layout.
    pub fn layout(&self) -> &UvLayout {
        &self.layout
    }

    /// Mutable access to the interactive layout.
    pub fn layout_mut(&mut self) -> &mut UvLayout {
        &mut self.layout
    }

    /// Replace the layout. The length must match the soup.
    pub fn set_layout(&mut self, layout: UvLayout) -> Result<()> {
        if layout.len() != self.soup.num_vertices() {
            return Err(EditorError::invalid_param(
                "layout",
                layout.len(),
                "length must match the soup vertex count",
            ));
        }
        self.layout = layout;
        Ok(())
    }

    /// Seam highlights.
    pub fn tracker(&self) -> &SeamHighlightTracker {
        &self.tracker
    }

    /// Separation weight table.
    pub fn weights(&self) -> &SeparationWeightTable {
        &self.weights
    }

    /// Face and vertex constraints.
    pub fn constraints(&self) -> &FaceConstraints {
        &self.constraints
    }

    /// Mutable access to face and vertex constraints.
    pub fn constraints_mut(&mut self) -> &mut FaceConstraints {
        &mut self.constraints
    }

    /// Selection boxes.
    pub fn boxes(&self) -> &BoundingBoxSelector {
        &self.boxes
    }

    /// Mutable access to selection boxes.
    pub fn boxes_mut(&mut self) -> &mut BoundingBoxSelector {
        &mut self.boxes
    }

    /// Hover a mesh edge. Returns whether the highlight changed.
    pub fn hover_edge(&mut self, edge: MeshEdge) -> bool {
        let uv = self.soup.uv_edges_of(edge, &self.adjacency);
        self.tracker.hover(edge, uv)
    }

    /// Clear the hovered edge.
    pub fn clear_hover(&mut self) -> bool {
        self.tracker.clear_hover()
    }

    /// Toggle the fixed state of a mesh edge and its UV mirrors. Returns the
    /// new fixed state.
    pub fn toggle_edge(&mut self, edge: MeshEdge) -> bool {
        if !self.adjacency.contains_edge(edge) {
            return false;
        }
        let uv = self.soup.uv_edges_of(edge, &self.adjacency);
        let fixed = self.tracker.toggle_fixed(edge, uv, &mut self.weights);
        debug!("edge {:?} fixed: {}", edge, fixed);
        fixed
    }

    /// Fix a mesh edge. Returns whether it was newly fixed.
    pub fn fix_edge(&mut self, edge: MeshEdge) -> bool {
        if !self.adjacency.contains_edge(edge) {
            return false;
        }
        let uv = self.soup.uv_edges_of(edge, &self.adjacency);
        self.tracker.fix(edge, uv, &mut self.weights)
    }

    /// Un-fix a mesh edge. Returns whether it was fixed.
    pub fn unfix_edge(&mut self, edge: MeshEdge) -> bool {
        self.tracker.unfix(edge, &mut self.weights)
    }

    /// Rebuild the soup for a new seam, carrying the layout, highlights,
    /// pins and boxes over.
    pub fn rebuild(&mut self, seam: BTreeSet<MeshEdge>) -> Result<()> {
        let soup = build_soup(&self.mesh, &self.adjacency, &seam)?;
        self.layout = self.layout.remap(&self.soup, &soup);
        self.soup = soup;
        self.cut = self.soup.to_cut_mesh();
        self.tracker
            .remap(&self.soup, &self.adjacency, &mut self.weights);
        self.constraints.repin(&self.soup, &self.layout);
        self.boxes.reclassify(&self.soup, &self.layout);
        info!(
            "rebuilt soup: {} seam edges, {} soup vertices",
            self.soup.seam().len(),
            self.soup.num_vertices()
        );
        Ok(())
    }

    /// Cut along a path: its edges join the seam and become fixed.
    pub fn confirm_cut(&mut self, path: &SeamPath) -> Result<()> {
        let edges = path.edges();
        let mut seam = self.seam().clone();
        seam.extend(edges.iter().copied());
        self.rebuild(seam)?;
        for edge in edges {
            self.fix_edge(edge);
        }
        info!(
            "cut {:?} -> {:?} along {} edges",
            path.start(),
            path.end(),
            path.len()
        );
        Ok(())
    }

    /// Rebuild with every fixed edge added to the seam.
    pub fn apply_fixed_seams(&mut self) -> Result<()> {
        let mut seam = self.seam().clone();
        seam.extend(self.tracker.fixed_edges());
        self.rebuild(seam)
    }

    /// Rebuild with an empty seam. Fixed highlights stay.
    pub fn clear_seam(&mut self) -> Result<()> {
        self.rebuild(BTreeSet::new())
    }

    /// Replace the 3D vertex positions, keeping the seam. Normals are
    /// recomputed.
    pub fn set_positions(&mut self, positions: Vec<Point3<f64>>) -> Result<()> {
        self.mesh.set_positions(positions)?;
        self.normals = self.mesh.vertex_normals();
        let seam = self.seam().clone();
        self.rebuild(seam)
    }

    /// Move the corners of `faces` in the interactive layout.
    pub fn translate_faces(&mut self, faces: &[FaceId], offset: Vector2<f64>) {
        self.layout
            .translate_faces(&self.soup, faces.iter().copied(), offset);
    }

    /// Commit a dragged face as active at its current layout position.
    pub fn commit_face_position(&mut self, face: FaceId) {
        let positions = self.layout.face_positions(&self.soup, face);
        self.constraints.set_active(face, positions);
    }

    /// Add a selection box over the interactive layout. Returns its index.
    pub fn add_box(&mut self, corner1: Point2<f64>, corner2: Point2<f64>) -> usize {
        self.boxes.add(corner1, corner2, &self.soup, &self.layout)
    }

    /// Move a box corner and reclassify the box.
    pub fn move_box_corner(&mut self, index: usize, corner: Corner, p: Point2<f64>) {
        self.boxes
            .move_corner(index, corner, p, &self.soup, &self.layout);
    }

    /// Reclassify every box against the interactive layout.
    pub fn reclassify_boxes(&mut self) {
        self.boxes.reclassify(&self.soup, &self.layout);
    }

    /// Apply a paint or box batch to the face constraints.
    pub fn apply_batch(&mut self, batch: &PaintBatch) {
        self.constraints.apply(batch, &self.soup, &self.layout);
    }

    /// Toggle the pin on a vertex. Returns the new pinned state.
    pub fn toggle_pin(&mut self, v: VertexId) -> bool {
        self.constraints.toggle_pin(v, &self.soup, &self.layout)
    }

    /// Constraints to publish to the solver.
    pub fn solver_constraints(&self, settings: &EditorSettings) -> SolverConstraints {
        let mut constraints = self
            .constraints
            .to_solver_constraints(settings.position_weight);
        constraints.separation = self.weights.separation_pairs(
            &self.soup,
            &self.adjacency,
            settings.separation_weight,
        );
        constraints
    }

    /// Solver input for the current soup, starting from the interactive
    /// layout.
    pub fn solver_problem(&self, options: SolverOptions) -> SolverProblem {
        SolverProblem::new(&self.soup, self.layout.clone(), options)
    }

    /// Separation, distortion and overlap errors of the interactive layout.
    /// Overlaps are only searched for when `settings.show_overlaps` is set.
    pub fn face_errors(&self, settings: &EditorSettings) -> FaceErrors {
        let pairs = self
            .weights
            .separation_pairs(&self.soup, &self.adjacency, 1.0);
        FaceErrors::compute(&self.soup, &self.layout, &pairs, settings.show_overlaps)
    }

    /// Color of each face.
    ///
    /// Constrained faces take their constraint color. Other faces are tinted
    /// by the enabled error measures, saturating at the color clamps.
    /// Overlapping faces take the overlap color when overlaps are shown.
    pub fn face_colors(&self, settings: &EditorSettings, errors: &FaceErrors) -> Vec<Rgb> {
        let palette = &settings.palette;
        self.soup
            .face_ids()
            .map(|f: FaceId| {
                let i = f.index();
                if settings.show_overlaps && errors.overlapping.get(i) == Some(&true) {
                    return palette.overlap;
                }
                if self.constraints.is_fixed(f) {
                    return palette.pinned_face;
                }
                if self.constraints.is_active(f) {
                    return palette.active_face;
                }
                let mut color = palette.face;
                if settings.show_separation_error {
                    let e = errors.separation.get(i).copied().unwrap_or(0.0);
                    color = mix_color(
                        color,
                        palette.separation_error,
                        e / settings.separation_color_clamp,
                    );
                }
                if settings.show_distortion_error {
                    let e = errors.distortion.get(i).copied().unwrap_or(0.0);
                    color = mix_color(
                        color,
                        palette.distortion_error,
                        e / settings.distortion_color_clamp,
                    );
                }
                color
            })
            .collect()
    }

    /// Highlighted edges of both domains with their colors.
    pub fn highlighted_edges(
        &self,
        palette: &HighlightPalette,
    ) -> (Vec<(MeshEdge, Rgb)>, Vec<(UvEdge, Rgb)>) {
        let mut mesh_edges = Vec::new();
        let mut uv_edges = Vec::new();
        for (edge, state) in self.tracker.iter() {
            let Some(color) = highlight_color(state.highlight(), state.merged, palette) else {
                continue;
            };
            mesh_edges.push((edge, color));
            uv_edges.extend(state.uv_edges.iter().map(|&uv| (uv, color)));
        }
        (mesh_edges, uv_edges)
    }
}
