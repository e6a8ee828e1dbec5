//! Builds 3D triangle meshes from 2D polygon loops.
//!
//! Loops are added as active edges, then swept inwards and upwards by
//! [`PolygonMeshBuilder::bevel`] and its shorthands, and finally capped by
//! [`PolygonMeshBuilder::fill`]. Positive-area loops (counter-clockwise with
//! y up) are solid, negative-area loops are holes.

mod bevel;
pub mod edge;
mod fill;
mod validate;

use std::collections::{BTreeSet, HashMap};
use std::f64::consts::FRAC_PI_2;

use crate::error::{InvalidPolygonError, OperationError, Result};
use crate::math::angle::lerp_radians;
use crate::math::polygon_2d::normalize_safe;
use crate::math::{Vector2, Vector3, Vector4, SWEEP_EPSILON, TOLERANCE};

use self::edge::{corner_velocity, Edge, EdgeIndex, VertexPair};

/// A vertex of the generated mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vector3,
    pub normal: Vector3,
    /// U tangent in `xyz`, sign of the V tangent in `w`.
    pub tangent: Vector4,
}

impl Vertex {
    /// A vertex facing straight up.
    #[must_use]
    pub fn flat(position: Vector3) -> Self {
        Self {
            position,
            normal: Vector3::z(),
            tangent: Vector4::new(1.0, 0.0, 0.0, 1.0),
        }
    }

    /// A vertex with the given (not necessarily unit) normal and a tangent
    /// running horizontally across it.
    #[must_use]
    pub fn with_normal(position: Vector3, normal: Vector3) -> Self {
        let normal = normal.try_normalize(TOLERANCE).unwrap_or_else(Vector3::z);
        let tangent = normal
            .cross(&Vector3::z())
            .try_normalize(TOLERANCE)
            .unwrap_or_else(Vector3::x);

        Self {
            position,
            normal,
            tangent: Vector4::new(tangent.x, tangent.y, tangent.z, 1.0),
        }
    }

    /// Reflection across the plane `Z = z`.
    #[must_use]
    pub fn mirrored(&self, z: f64) -> Self {
        Self {
            position: Vector3::new(self.position.x, self.position.y, 2.0 * z - self.position.z),
            normal: Vector3::new(self.normal.x, self.normal.y, -self.normal.z),
            tangent: Vector4::new(
                self.tangent.x,
                self.tangent.y,
                -self.tangent.z,
                self.tangent.w,
            ),
        }
    }
}

/// Shading options of a [`PolygonMeshBuilder`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshOptions {
    /// Corners whose adjacent faces meet at less than this angle (radians)
    /// share one smoothed vertex normal.
    pub max_smooth_angle: f64,
    /// Emit a flat +Z normal and +X tangent for every vertex.
    pub skip_normals: bool,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            max_smooth_angle: 0.0,
            skip_normals: false,
        }
    }
}

/// Progress of the current sweep.
///
/// `prev_*` describe where the last sweep ended, `next_*` where the running
/// one will end.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SweepState {
    pub prev_distance: f64,
    pub next_distance: f64,
    /// Distance of the last event applied by the running sweep.
    pub event_distance: f64,
    pub inv_distance: f64,
    pub prev_height: f64,
    pub next_height: f64,
    pub prev_angle: f64,
    pub next_angle: f64,
    pub min_smooth_normal_dot: f64,
}

/// Reused buffers, cleared between calls.
#[derive(Debug, Default)]
struct Scratch {
    edge_list: Vec<EdgeIndex>,
    cut_list: Vec<(EdgeIndex, EdgeIndex)>,
    start_map: HashMap<usize, usize>,
    vertex_map: Vec<u32>,
    fill: fill::FillScratch,
}

/// Incrementally builds a mesh from 2D loops.
///
/// Every fallible operation leaves the builder in an unspecified state when
/// it fails; call [`clear`](Self::clear) before reusing it.
#[derive(Debug)]
pub struct PolygonMeshBuilder {
    options: MeshOptions,
    edges: Vec<Edge>,
    active: BTreeSet<EdgeIndex>,
    possible_cuts: BTreeSet<(EdgeIndex, EdgeIndex)>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    state: SweepState,
    /// Whether the active boundary passed [`validate`](Self::validate) since
    /// it was last edited.
    validated: bool,
    scratch: Scratch,
}

impl Default for PolygonMeshBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PolygonMeshBuilder {
    /// Creates an empty builder with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(MeshOptions::default())
    }

    /// Creates an empty builder with the given options.
    #[must_use]
    pub fn with_options(options: MeshOptions) -> Self {
        Self {
            options,
            edges: Vec::new(),
            active: BTreeSet::new(),
            possible_cuts: BTreeSet::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
            state: SweepState::default(),
            validated: true,
            scratch: Scratch::default(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &MeshOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut MeshOptions {
        &mut self.options
    }

    /// Generated vertices.
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Generated triangles, three vertex indices each.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn positions(&self) -> impl Iterator<Item = Vector3> + '_ {
        self.vertices.iter().map(|v| v.position)
    }

    pub fn normals(&self) -> impl Iterator<Item = Vector3> + '_ {
        self.vertices.iter().map(|v| v.normal)
    }

    pub fn tangents(&self) -> impl Iterator<Item = Vector4> + '_ {
        self.vertices.iter().map(|v| v.tangent)
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of edges the next bevel or fill will act on.
    #[must_use]
    pub fn active_edge_count(&self) -> usize {
        self.active.len()
    }

    /// Returns `true` when no active edges remain.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.active.is_empty()
    }

    /// The active boundary as point loops, in edge order.
    #[must_use]
    pub fn active_loops(&self) -> Vec<Vec<Vector2>> {
        let mut remaining = self.active.clone();
        let mut loops = Vec::new();

        while let Some(first) = remaining.pop_first() {
            let mut points = vec![self.edges[first].origin];
            let mut index = self.edges[first].next;

            while index != first && remaining.remove(&index) {
                points.push(self.edges[index].origin);
                index = self.edges[index].next;
            }

            loops.push(points);
        }

        loops
    }

    /// Discards all geometry and sweep progress. Buffer capacity is kept.
    pub fn clear(&mut self) -> &mut Self {
        self.edges.clear();
        self.active.clear();
        self.possible_cuts.clear();
        self.vertices.clear();
        self.indices.clear();
        self.state = SweepState::default();
        self.validated = true;
        self
    }

    /// Clears the builder and restores default options.
    pub fn reset(&mut self) -> &mut Self {
        self.options = MeshOptions::default();
        self.clear()
    }

    /// Adds a closed loop of active edges through `points`.
    ///
    /// Solid loops must have positive signed area, holes negative; `reverse`
    /// walks the points backwards, turning one into the other. Holes must lie
    /// inside a solid loop for the mesh to close, which is not checked.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPolygonError::TooFewPoints`] for fewer than 3 points,
    /// leaving the builder untouched.
    pub fn add_edge_loop(&mut self, points: &[Vector2], reverse: bool) -> Result<&mut Self> {
        self.add_edge_loop_transformed(points, Vector2::zeros(), Vector2::new(1.0, 1.0), reverse)
    }

    /// Like [`add_edge_loop`](Self::add_edge_loop), mapping each point to
    /// `position + point * scale` (component-wise).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPolygonError::TooFewPoints`] for fewer than 3 points.
    pub fn add_edge_loop_transformed(
        &mut self,
        points: &[Vector2],
        position: Vector2,
        scale: Vector2,
        reverse: bool,
    ) -> Result<&mut Self> {
        let count = points.len();
        if count < 3 {
            return Err(InvalidPolygonError::TooFewPoints { count }.into());
        }

        let point = |i: usize| {
            let p = if reverse { points[count - 1 - i] } else { points[i] };
            position + p.component_mul(&scale)
        };

        self.validated = false;
        let first = self.edges.len();
        let distance = self.state.prev_distance;

        let mut prev_point = point(count - 1);
        for i in 0..count {
            let next_point = point(i);
            let index = self.push_edge(
                prev_point,
                normalize_safe(next_point - prev_point),
                distance,
                None,
            );
            self.active.insert(index);
            prev_point = next_point;
        }

        for i in 0..count {
            self.link(first + (i + count - 1) % count, first + i);
        }

        Ok(self)
    }

    /// Adds raw edges between `points`, given as `(start, end)` index pairs.
    ///
    /// Each point may start at most one edge, and every end point must start
    /// an edge, so the edges form closed loops.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPolygonError::BadEdgeList`] if the pairs break those
    /// rules or reference missing points. Nothing is added in that case.
    pub fn add_edges(&mut self, points: &[Vector2], edges: &[(usize, usize)]) -> Result<&mut Self> {
        let starts = &mut self.scratch.start_map;
        starts.clear();

        for (k, &(start, end)) in edges.iter().enumerate() {
            if start >= points.len() || end >= points.len() {
                return Err(InvalidPolygonError::BadEdgeList {
                    reason: format!("edge {k} references a point out of range"),
                }
                .into());
            }
            if starts.insert(start, k).is_some() {
                return Err(InvalidPolygonError::BadEdgeList {
                    reason: format!("point {start} starts more than one edge"),
                }
                .into());
            }
        }

        let mut successors = std::mem::take(&mut self.scratch.edge_list);
        successors.clear();

        for &(_, end) in edges {
            match starts.get(&end) {
                Some(&next) => successors.push(next),
                None => {
                    self.scratch.edge_list = successors;
                    return Err(InvalidPolygonError::BadEdgeList {
                        reason: format!("point {end} ends an edge but starts none"),
                    }
                    .into());
                }
            }
        }

        self.validated = false;
        let first = self.edges.len();
        let distance = self.state.prev_distance;

        for &(start, end) in edges {
            let (prev, next) = (points[start], points[end]);
            let index = self.push_edge(prev, normalize_safe(next - prev), distance, None);
            self.active.insert(index);
        }

        for (k, &next) in successors.iter().enumerate() {
            self.link(first + k, first + next);
        }

        self.scratch.edge_list = successors;
        Ok(self)
    }

    /// Raises the active edges straight up by `height`.
    ///
    /// # Errors
    ///
    /// See [`bevel`](Self::bevel).
    pub fn extrude(&mut self, height: f64) -> Result<&mut Self> {
        self.bevel(0.0, height)
    }

    /// Moves the active edges inwards by `width` without changing height.
    ///
    /// # Errors
    ///
    /// See [`bevel`](Self::bevel).
    pub fn inset(&mut self, width: f64) -> Result<&mut Self> {
        self.bevel(width, 0.0)
    }

    /// [`arc`](Self::arc) with equal width and height.
    ///
    /// # Errors
    ///
    /// See [`arc`](Self::arc).
    pub fn arc_radius(
        &mut self,
        radius: f64,
        faces: usize,
        smooth: bool,
        convex: bool,
    ) -> Result<&mut Self> {
        self.arc(radius, radius, faces, smooth, convex)
    }

    /// Bevels in `faces` steps so the profile follows a quarter ellipse
    /// spanning `width` inwards and `height` upwards.
    ///
    /// With `smooth`, vertex normals follow the curve instead of each face.
    /// `convex` arcs bulge outwards, concave ones hollow inwards.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if `faces` is zero, otherwise
    /// whatever the underlying bevels return.
    pub fn arc(
        &mut self,
        width: f64,
        height: f64,
        faces: usize,
        smooth: bool,
        convex: bool,
    ) -> Result<&mut Self> {
        if faces == 0 {
            return Err(OperationError::InvalidInput("arc needs at least one face".into()).into());
        }

        let positive = height >= 0.0;

        let mut prev_width = 0.0;
        let mut prev_height = 0.0;
        let mut prev_theta = 0.0;

        for i in 0..faces {
            #[allow(clippy::cast_precision_loss)]
            let theta = FRAC_PI_2 * (i + 1) as f64 / faces as f64;
            let (sin, cos) = theta.sin_cos();

            let next_width = 1.0 - cos;
            let next_height = sin;

            let (step_width, step_height) = if positive == convex {
                (
                    (next_width - prev_width) * width,
                    (next_height - prev_height) * height,
                )
            } else {
                (
                    (next_height - prev_height) * width,
                    (next_width - prev_width) * height,
                )
            };

            if smooth {
                self.bevel_with_angles(
                    step_width,
                    step_height,
                    arc_angle(prev_theta, convex, positive),
                    arc_angle(theta, convex, positive),
                )?;
            } else {
                self.bevel(step_width, step_height)?;
            }

            prev_width = next_width;
            prev_height = next_height;
            prev_theta = theta;
        }

        Ok(self)
    }

    /// Appends a mirror image of all generated triangles across the plane
    /// `Z = z`.
    ///
    /// Vertices lying on the plane whose normal and tangent are parallel to
    /// it are shared between both halves instead of duplicated.
    pub fn mirror(&mut self, z: f64) -> &mut Self {
        let vertex_count = self.vertices.len();
        let index_count = self.indices.len();

        let mut map = std::mem::take(&mut self.scratch.vertex_map);
        map.clear();

        self.vertices.reserve(vertex_count);
        self.indices.reserve(index_count);

        for i in 0..vertex_count {
            let vertex = self.vertices[i];

            let on_plane = (vertex.position.z - z).abs() <= SWEEP_EPSILON;
            let flat = self.options.skip_normals
                || (vertex.normal.z.abs() <= 1e-4 && vertex.tangent.z.abs() <= 1e-4);

            if on_plane && flat {
                #[allow(clippy::cast_possible_truncation)]
                map.push(i as u32);
            } else {
                map.push(self.next_vertex_index());
                self.vertices.push(vertex.mirrored(z));
            }
        }

        for t in (0..index_count).step_by(3) {
            let a = map[self.indices[t] as usize];
            let b = map[self.indices[t + 1] as usize];
            let c = map[self.indices[t + 2] as usize];
            self.indices.extend_from_slice(&[a, c, b]);
        }

        self.scratch.vertex_map = map;
        self
    }

    #[allow(clippy::cast_possible_truncation)]
    fn next_vertex_index(&self) -> u32 {
        self.vertices.len() as u32
    }

    fn push_edge(
        &mut self,
        origin: Vector2,
        tangent: Vector2,
        distance: f64,
        twin: Option<EdgeIndex>,
    ) -> EdgeIndex {
        let index = self.edges.len();
        self.edges.push(Edge::new(index, origin, tangent, distance, twin));
        index
    }

    /// Links `prev -> next` without touching velocities.
    fn link_simple(&mut self, prev: EdgeIndex, next: EdgeIndex) {
        self.validated = false;
        self.edges[prev].next = next;
        self.edges[next].prev = prev;
    }

    /// Links `prev -> next` and updates the velocity of their shared vertex.
    fn link(&mut self, prev: EdgeIndex, next: EdgeIndex) {
        self.link_simple(prev, next);
        self.edges[next].velocity = corner_velocity(self.edges[prev].normal, self.edges[next].normal);
    }

    fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Returns the output vertices at an edge's origin, creating them on
    /// first use.
    ///
    /// Heights and normal angles are interpolated across the running sweep by
    /// the edge's creation distance; `force_max_distance` places the vertices
    /// at the end of the sweep instead.
    fn add_vertices(&mut self, index: EdgeIndex, force_max_distance: bool) -> VertexPair {
        let edge = self.edges[index];
        if let Some(pair) = edge.vertices {
            return pair;
        }

        let state = self.state;
        let prev_normal = -self.edges[edge.prev].normal;
        let next_normal = -edge.normal;

        let t = if force_max_distance {
            1.0
        } else {
            (edge.distance - state.prev_distance) * state.inv_distance
        };
        let height = state.prev_height + t * (state.next_height - state.prev_height);
        let position = Vector3::new(edge.origin.x, edge.origin.y, height);

        let first = self.next_vertex_index();

        let pair = if self.options.skip_normals
            || (state.next_height - state.prev_height).abs() <= SWEEP_EPSILON
        {
            self.vertices.push(Vertex::flat(position));
            VertexPair::shared(first)
        } else {
            let angle = lerp_radians(state.prev_angle, state.next_angle, t);
            let (sin, cos) = angle.sin_cos();

            if prev_normal.dot(&next_normal) >= state.min_smooth_normal_dot {
                let sum = prev_normal + next_normal;
                let normal = Vector3::new(sum.x * cos, sum.y * cos, sin * 2.0);
                self.vertices.push(Vertex::with_normal(position, normal));
                VertexPair::shared(first)
            } else {
                let normal0 = Vector3::new(prev_normal.x * cos, prev_normal.y * cos, sin);
                let normal1 = Vector3::new(next_normal.x * cos, next_normal.y * cos, sin);
                self.vertices.push(Vertex::with_normal(position, normal0));
                self.vertices.push(Vertex::with_normal(position, normal1));
                VertexPair {
                    prev: first,
                    next: first + 1,
                }
            }
        };

        self.edges[index].vertices = Some(pair);
        pair
    }

    /// Drops cached vertices of active edges if the new sweep starts at a
    /// different normal angle than the last one ended at.
    fn refresh_vertices_for_angle(&mut self, prev_angle: f64) {
        if !self.options.skip_normals && (self.state.prev_angle - prev_angle).abs() >= SWEEP_EPSILON {
            for &index in &self.active {
                self.edges[index].vertices = None;
            }
        }
        self.state.prev_angle = prev_angle;
    }

    /// Ends the running sweep.
    fn finish_sweep(&mut self) {
        self.state.prev_distance = self.state.next_distance;
        self.state.prev_height = self.state.next_height;
        self.state.prev_angle = self.state.next_angle;
    }
}

/// Normal angle at `theta` along an arc.
fn arc_angle(theta: f64, convex: bool, positive: bool) -> f64 {
    let min = if positive { 0.0 } else { FRAC_PI_2 };
    if convex {
        min + theta
    } else {
        min + FRAC_PI_2 - theta
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn square(half: f64) -> Vec<Vector2> {
        vec![
            Vector2::new(-half, -half),
            Vector2::new(half, -half),
            Vector2::new(half, half),
            Vector2::new(-half, half),
        ]
    }

    #[test]
    fn add_edge_loop_links_a_cycle() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(1.0), false).unwrap();

        assert_eq!(builder.active_edge_count(), 4);
        assert!(!builder.is_closed());
        for edge in &builder.edges {
            assert_eq!(builder.edges[edge.next].prev, edge.index);
        }

        // First edge runs from the last point to the first.
        let first = builder.edges[0];
        assert_abs_diff_eq!(first.origin.x, -1.0);
        assert_abs_diff_eq!(first.origin.y, 1.0);
        assert_abs_diff_eq!(first.tangent.y, -1.0);
    }

    #[test]
    fn square_corner_velocity_is_diagonal() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(1.0), false).unwrap();

        // Edge 1 starts at (-1, -1), the bottom left corner.
        let v = builder.edges[1].velocity;
        assert_abs_diff_eq!(v.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn reversed_loop_has_negative_orientation() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(1.0), true).unwrap();

        let loops = builder.active_loops();
        assert_eq!(loops.len(), 1);
        assert!(crate::math::polygon_2d::signed_area_2d(&loops[0]) < 0.0);
    }

    #[test]
    fn too_few_points_leaves_builder_untouched() {
        let mut builder = PolygonMeshBuilder::new();
        let err = builder
            .add_edge_loop(&[Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0)], false)
            .unwrap_err();

        assert!(err.is_invalid_polygon());
        assert_eq!(builder.active_edge_count(), 0);
        assert!(builder.edges.is_empty());
    }

    #[test]
    fn transformed_loop_applies_scale_then_offset() {
        let mut builder = PolygonMeshBuilder::new();
        builder
            .add_edge_loop_transformed(&square(1.0), Vector2::new(10.0, 0.0), Vector2::new(2.0, 3.0), false)
            .unwrap();

        let loops = builder.active_loops();
        let min_x = loops[0].iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_y = loops[0].iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        assert_abs_diff_eq!(min_x, 8.0);
        assert_abs_diff_eq!(max_y, 3.0);
    }

    #[test]
    fn add_edges_builds_loops_from_pairs() {
        let mut builder = PolygonMeshBuilder::new();
        builder
            .add_edges(&square(1.0), &[(2, 3), (0, 1), (3, 0), (1, 2)])
            .unwrap();

        assert_eq!(builder.active_edge_count(), 4);
        assert_eq!(builder.active_loops()[0].len(), 4);
        builder.validate().unwrap();
    }

    #[test]
    fn add_edges_rejects_bad_topology() {
        let mut builder = PolygonMeshBuilder::new();
        let pts = square(1.0);

        let out_of_range = builder.add_edges(&pts, &[(0, 7)]).unwrap_err();
        let duplicate = builder.add_edges(&pts, &[(0, 1), (0, 2)]).unwrap_err();
        let open = builder.add_edges(&pts, &[(0, 1), (1, 2)]).unwrap_err();

        for err in [out_of_range, duplicate, open] {
            assert!(matches!(
                err,
                crate::PolyMeshError::InvalidPolygon(InvalidPolygonError::BadEdgeList { .. })
            ));
        }
        assert_eq!(builder.active_edge_count(), 0);
    }

    #[test]
    fn clear_discards_everything() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(1.0), false).unwrap();
        builder.extrude(1.0).unwrap();
        builder.clear();

        assert!(builder.is_closed());
        assert!(builder.vertices().is_empty());
        assert!(builder.indices().is_empty());
        assert_abs_diff_eq!(builder.state.prev_height, 0.0);
    }

    #[test]
    fn reset_restores_default_options() {
        let mut builder = PolygonMeshBuilder::with_options(MeshOptions {
            max_smooth_angle: 1.0,
            skip_normals: true,
        });
        builder.reset();
        assert_eq!(*builder.options(), MeshOptions::default());
    }

    #[test]
    fn arc_rejects_zero_faces() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(5.0), false).unwrap();
        let err = builder.arc(1.0, 1.0, 0, true, true).unwrap_err();
        assert!(!err.is_invalid_polygon());
    }

    #[test]
    fn arc_reaches_full_width_and_height() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(5.0), false).unwrap();
        builder.arc(1.0, 2.0, 4, true, true).unwrap();

        assert_abs_diff_eq!(builder.state.prev_distance, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(builder.state.prev_height, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(builder.state.prev_angle, FRAC_PI_2, epsilon = 1e-9);
        // Four bevels of an event-free square, two triangles per edge each.
        assert_eq!(builder.triangle_count(), 4 * 4 * 2);
    }

    #[test]
    fn arc_angles() {
        assert_abs_diff_eq!(arc_angle(0.0, true, true), 0.0);
        assert_abs_diff_eq!(arc_angle(FRAC_PI_2, true, true), FRAC_PI_2);
        assert_abs_diff_eq!(arc_angle(0.0, false, true), FRAC_PI_2);
        assert_abs_diff_eq!(arc_angle(0.0, true, false), FRAC_PI_2);
    }

    #[test]
    fn mirror_without_normals_welds_on_plane_vertices() {
        let mut builder = PolygonMeshBuilder::with_options(MeshOptions {
            skip_normals: true,
            ..MeshOptions::default()
        });
        builder.add_edge_loop(&square(1.0), false).unwrap();
        builder.fill().unwrap();

        let vertices = builder.vertices().len();
        let triangles = builder.triangle_count();
        builder.mirror(0.0);

        assert_eq!(builder.vertices().len(), vertices);
        assert_eq!(builder.triangle_count(), triangles * 2);

        let (a, b) = builder.indices().split_at(triangles * 3);
        assert_eq!([a[0], a[2], a[1]], [b[0], b[1], b[2]]);
    }

    #[test]
    fn mirror_duplicates_upward_facing_cap() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(1.0), false).unwrap();
        builder.fill().unwrap();

        let vertices = builder.vertices().len();
        builder.mirror(0.0);

        assert_eq!(builder.vertices().len(), vertices * 2);
        assert_abs_diff_eq!(builder.vertices()[vertices].normal.z, -1.0);
    }

    #[test]
    fn mirror_reflects_extruded_walls() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(1.0), false).unwrap();
        builder.extrude(2.0).unwrap();

        let vertices = builder.vertices().len();
        let top: Vec<Vertex> = builder.vertices()
            .iter()
            .filter(|v| v.position.z > 1.0)
            .copied()
            .collect();
        builder.mirror(0.0);

        // Bottom vertices face sideways on the plane and are shared.
        assert_eq!(builder.vertices().len(), vertices + top.len());
        for (original, mirrored) in top.iter().zip(&builder.vertices()[vertices..]) {
            assert_abs_diff_eq!(mirrored.position.z, -2.0);
            assert_abs_diff_eq!(mirrored.position.x, original.position.x);
            assert_abs_diff_eq!(mirrored.normal.z, -original.normal.z);
        }
    }

    #[test]
    fn vertex_with_normal_normalizes() {
        let v = Vertex::with_normal(Vector3::zeros(), Vector3::new(0.0, -2.0, 0.0));
        assert_abs_diff_eq!(v.normal.y, -1.0);
        assert_abs_diff_eq!(v.tangent.norm_squared(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.tangent.w, 1.0);
    }
}
