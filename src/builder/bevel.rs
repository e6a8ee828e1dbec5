//! Inward/upward sweep of the active edges with close, split and merge
//! events.

use std::f64::consts::PI;

use tracing::{debug, trace};

use super::edge::{Edge, EdgeIndex};
use super::{PolygonMeshBuilder, Vertex};
use crate::error::{InvalidPolygonError, OperationError, PolyMeshError, Result};
use crate::math::polygon_2d::relative_epsilon;
use crate::math::{Vector2, RELATIVE_EPSILON, SWEEP_EPSILON, TOLERANCE, WIDTH_EPSILON};

/// Which end of the cut edge a vertex lands on, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MergeMode {
    None,
    Start,
    End,
}

/// Where and when a vertex reaches another loop segment.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SplitCandidate {
    pub distance: f64,
    pub position: Vector2,
    pub merge: MergeMode,
}

#[derive(Debug, Clone, Copy)]
enum SweepEvent {
    /// `edge` shrinks to a point.
    Close {
        edge: EdgeIndex,
        position: Vector2,
        distance: f64,
    },
    /// The start vertex of `splitting` cuts `split` in two.
    Split {
        splitting: EdgeIndex,
        split: EdgeIndex,
        position: Vector2,
        distance: f64,
    },
    /// The start vertices of `a` and `b` meet.
    Merge {
        a: EdgeIndex,
        b: EdgeIndex,
        position: Vector2,
        distance: f64,
    },
}

impl SweepEvent {
    fn distance(&self) -> f64 {
        match *self {
            Self::Close { distance, .. }
            | Self::Split { distance, .. }
            | Self::Merge { distance, .. } => distance,
        }
    }
}

/// Caps the work one sweep may do before it is considered runaway.
#[derive(Debug, Clone, Copy)]
struct EventBudget {
    max_iterations: usize,
    max_edges: usize,
    iterations: usize,
}

impl EventBudget {
    fn new(active_edges: usize, arena_edges: usize) -> Self {
        Self {
            max_iterations: active_edges * active_edges,
            max_edges: arena_edges + active_edges * 4,
            iterations: 0,
        }
    }

    /// Counts one more event.
    fn spend(&mut self, active_edges: usize) -> Result<()> {
        if self.iterations >= self.max_iterations {
            return Err(self.exploded(active_edges));
        }
        self.iterations += 1;
        Ok(())
    }

    fn check_edges(&self, arena_edges: usize, active_edges: usize) -> Result<()> {
        if arena_edges > self.max_edges {
            return Err(self.exploded(active_edges));
        }
        Ok(())
    }

    fn exploded(&self, active_edges: usize) -> PolyMeshError {
        InvalidPolygonError::Exploded {
            iterations: self.iterations,
            active_edges,
        }
        .into()
    }
}

impl PolygonMeshBuilder {
    /// Sweeps every active edge `width` inwards and `height` upwards, adding
    /// the faces it passes over.
    ///
    /// Vertex normals point `atan2(width, height)` radians up from the
    /// outward plane direction. A wide enough bevel closes the mesh.
    ///
    /// # Errors
    ///
    /// See [`bevel_with_angles`](Self::bevel_with_angles).
    pub fn bevel(&mut self, width: f64, height: f64) -> Result<&mut Self> {
        let angle = width.atan2(height);
        self.bevel_with_angles(width, height, angle, angle)
    }

    /// Sweeps every active edge `width` inwards and `height` upwards, with
    /// vertex normals turning from `prev_angle` at the outer rim to
    /// `next_angle` at the inner one.
    ///
    /// Angles are in radians: 0 points outwards along the plane, `PI / 2`
    /// straight up.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if `width` is negative or NaN
    /// or `height` is not finite, and an [`InvalidPolygonError`] if the
    /// active edges are not simple closed loops or the sweep fails to
    /// converge.
    pub fn bevel_with_angles(
        &mut self,
        width: f64,
        height: f64,
        prev_angle: f64,
        next_angle: f64,
    ) -> Result<&mut Self> {
        if width.is_nan() || width < 0.0 {
            return Err(OperationError::InvalidInput(format!(
                "bevel width must be non-negative, got {width}"
            ))
            .into());
        }
        if !height.is_finite() {
            return Err(OperationError::InvalidInput(format!(
                "bevel height must be finite, got {height}"
            ))
            .into());
        }

        self.validate()?;

        let edges_before = self.active.len();
        let triangles_before = self.triangle_count();

        self.begin_sweep(width, height, prev_angle, next_angle);

        if width > SWEEP_EPSILON {
            self.run_events()?;
        }

        self.carry_forward()?;
        self.finish_sweep();

        debug!(
            width,
            height,
            edges_before,
            edges_after = self.active.len(),
            triangles = self.triangle_count() - triangles_before,
            "bevel"
        );

        Ok(self)
    }

    fn begin_sweep(&mut self, width: f64, height: f64, prev_angle: f64, next_angle: f64) {
        let state = &mut self.state;
        state.next_distance = state.prev_distance + width;
        state.next_height = state.prev_height + height;
        state.next_angle = next_angle;
        state.event_distance = state.prev_distance;
        state.min_smooth_normal_dot = self
            .options
            .max_smooth_angle
            .clamp(0.0, PI * (511.0 / 512.0))
            .cos();
        state.inv_distance = if width <= WIDTH_EPSILON {
            0.0
        } else {
            1.0 / (state.next_distance - state.prev_distance)
        };

        self.refresh_vertices_for_angle(prev_angle);

        self.possible_cuts.clear();

        let mut active = std::mem::take(&mut self.scratch.edge_list);
        active.clear();
        active.extend(self.active.iter().copied());

        for &index in &active {
            self.update_max_distance(index);

            for &other in &active {
                if other != index {
                    self.possible_cuts.insert((index, other));
                }
            }
        }

        self.scratch.edge_list = active;
    }

    fn run_events(&mut self) -> Result<()> {
        let mut budget = EventBudget::new(self.active.len(), self.edges.len());

        while let Some(event) = self.next_event() {
            budget.spend(self.active.len())?;

            self.state.event_distance = event.distance();
            self.apply_event(event);

            budget.check_edges(self.edges.len(), self.active.len())?;
        }

        Ok(())
    }

    /// Finds the earliest event before the end of the sweep.
    ///
    /// Close events are considered before cuts, and both in ascending edge
    /// order; only strictly earlier events replace the current best. No event
    /// happens before the last applied one: anything due earlier happens now.
    fn next_event(&mut self) -> Option<SweepEvent> {
        let floor = self.state.event_distance;
        let mut best_distance = self.state.next_distance;
        let mut best = None;

        for &index in &self.active {
            let edge = &self.edges[index];
            let distance = edge.max_distance.max(floor);
            if distance >= best_distance {
                continue;
            }

            let next = &self.edges[edge.next];

            best_distance = distance;
            best = Some(SweepEvent::Close {
                edge: index,
                position: (edge.project(distance) + next.project(distance)) * 0.5,
                distance,
            });
        }

        let mut cut_list = std::mem::take(&mut self.scratch.cut_list);
        cut_list.clear();
        cut_list.extend(self.possible_cuts.iter().copied());

        for &(index, other_index) in &cut_list {
            if !self.active.contains(&index) || !self.active.contains(&other_index) {
                self.possible_cuts.remove(&(index, other_index));
                continue;
            }

            let edge = &self.edges[index];
            let other = &self.edges[other_index];
            let other_next = &self.edges[other.next];

            let candidate = calculate_split(edge, other, other_next)
                .filter(|c| c.distance - self.state.next_distance <= SWEEP_EPSILON);

            let Some(candidate) = candidate else {
                self.possible_cuts.remove(&(index, other_index));
                continue;
            };

            let distance = candidate.distance.max(floor);
            if distance >= best_distance {
                continue;
            }

            let position = if distance > candidate.distance {
                edge.project(distance)
            } else {
                candidate.position
            };

            best_distance = distance;
            best = Some(match candidate.merge {
                MergeMode::None => SweepEvent::Split {
                    splitting: index,
                    split: other_index,
                    position,
                    distance,
                },
                MergeMode::Start => SweepEvent::Merge {
                    a: index,
                    b: other_index,
                    position,
                    distance,
                },
                MergeMode::End => SweepEvent::Merge {
                    a: index,
                    b: other.next,
                    position,
                    distance,
                },
            });
        }

        self.scratch.cut_list = cut_list;
        best
    }

    fn apply_event(&mut self, event: SweepEvent) {
        trace!(?event, "sweep event");

        match event {
            SweepEvent::Close {
                edge,
                position,
                distance,
            } => self.close_edge(edge, position, distance),
            SweepEvent::Split {
                splitting,
                split,
                position,
                distance,
            } => self.split_edge(splitting, split, position, distance),
            SweepEvent::Merge {
                a,
                b,
                position,
                distance,
            } => self.merge_vertices(a, b, position, distance),
        }
    }

    /// Replaces `b` and its successor with one edge starting where `b`
    /// collapsed.
    fn close_edge(&mut self, b: EdgeIndex, position: Vector2, distance: f64) {
        let a = self.edges[b].prev;
        let c = self.edges[b].next;
        let c_next = self.edges[c].next;

        self.active.remove(&b);
        self.active.remove(&c);

        // Two-edge loop: nothing left.
        if a == c {
            return;
        }

        let d = self.push_edge(position, self.edges[c].tangent, distance, None);
        self.active.insert(d);

        self.link(a, d);
        self.link(d, c_next);

        for index in [a, d, c_next] {
            self.update_max_distance(index);
        }

        let ai = self.add_vertices(a, false);
        let bi = self.add_vertices(b, false);
        let ci = self.add_vertices(c, false);
        let ei = self.add_vertices(c_next, false);
        let di = self.add_vertices(d, false);

        // The collapsed face ends in a vertex of its own so it keeps its
        // normal.
        let fi = self.next_vertex_index();
        let apex = self.vertices[di.prev as usize];
        let face = self.vertices[bi.next as usize];
        self.vertices.push(Vertex {
            position: apex.position,
            normal: face.normal,
            tangent: face.tangent,
        });

        self.add_triangle(ai.next, bi.prev, di.prev);
        self.add_triangle(bi.next, ci.prev, fi);
        self.add_triangle(ci.next, ei.prev, di.next);

        self.add_all_possible_cuts(d);
        self.add_all_possible_cuts(c_next);
    }

    /// Cuts edge `a` in two where the start vertex of `d` reaches it,
    /// splitting one loop into two (or joining two into one).
    fn split_edge(&mut self, d: EdgeIndex, a: EdgeIndex, position: Vector2, distance: f64) {
        let b = self.edges.len();
        let e = b + 1;
        self.push_edge(position, self.edges[a].tangent, distance, Some(e));
        self.push_edge(position, self.edges[d].tangent, distance, Some(b));

        let c = self.edges[d].prev;
        let a_next = self.edges[a].next;
        let d_next = self.edges[d].next;

        let ai = self.add_vertices(a, false).next;
        let fi = self.add_vertices(a_next, false).prev;
        let ci = self.add_vertices(c, false).next;
        let di = self.add_vertices(d, false);
        let gi = self.add_vertices(d_next, false).prev;

        self.active.remove(&d);
        self.active.insert(b);
        self.active.insert(e);

        self.link(a, e);
        self.link(e, d_next);
        self.link(c, b);
        self.link(b, a_next);

        for index in [a, e, d_next, c, b, a_next] {
            self.update_max_distance(index);
        }

        let bi = self.add_vertices(b, false);
        let ei = self.add_vertices(e, false);

        self.add_triangle(ai, fi, bi.next);
        self.add_triangle(ci, di.prev, bi.prev);
        self.add_triangle(di.next, gi, ei.next);

        for index in [b, d_next, e, a_next] {
            self.add_all_possible_cuts(index);
        }
    }

    /// Welds the start vertices of `a` and `b` where they meet.
    fn merge_vertices(&mut self, a: EdgeIndex, b: EdgeIndex, position: Vector2, distance: f64) {
        self.active.remove(&a);
        self.active.remove(&b);

        let (a_prev, a_next) = (self.edges[a].prev, self.edges[a].next);
        let (b_prev, b_next) = (self.edges[b].prev, self.edges[b].next);

        if a_next == b && b_next == a {
            return;
        }

        let a_new = self.edges.len();
        let b_new = a_new + 1;
        self.push_edge(position, self.edges[a].tangent, distance, Some(b_new));
        self.push_edge(position, self.edges[b].tangent, distance, Some(a_new));

        let a_prev_i = self.add_vertices(a_prev, false).next;
        let ai = self.add_vertices(a, false);
        let a_next_i = self.add_vertices(a_next, false).prev;
        let b_prev_i = self.add_vertices(b_prev, false).next;
        let bi = self.add_vertices(b, false);
        let b_next_i = self.add_vertices(b_next, false).prev;

        self.active.insert(a_new);
        self.active.insert(b_new);

        self.link(b_prev, a_new);
        self.link(a_new, a_next);
        self.link(a_prev, b_new);
        self.link(b_new, b_next);

        for index in [b_prev, a_new, a_next, a_prev, b_new, b_next] {
            self.update_max_distance(index);
        }

        let a_new_i = self.add_vertices(a_new, false);
        let b_new_i = self.add_vertices(b_new, false);

        self.add_triangle(a_prev_i, ai.prev, b_new_i.prev);
        self.add_triangle(ai.next, a_next_i, a_new_i.next);
        self.add_triangle(b_prev_i, bi.prev, a_new_i.prev);
        self.add_triangle(bi.next, b_next_i, b_new_i.next);

        for index in [a_new, a_next, b_new, b_next] {
            self.add_all_possible_cuts(index);
        }
    }

    /// Moves every surviving edge to the end of the sweep, adding the side
    /// wall between old and new position.
    fn carry_forward(&mut self) -> Result<()> {
        let end = self.state.next_distance;

        let mut survivors = std::mem::take(&mut self.scratch.edge_list);
        survivors.clear();
        survivors.extend(self.active.iter().copied());
        self.active.clear();

        let first = self.edges.len();
        for &index in &survivors {
            let edge = self.edges[index];
            self.push_edge(edge.project(end), edge.tangent, end, None);
        }

        for (i, &index) in survivors.iter().enumerate() {
            let next = self.edges[index].next;
            let Ok(j) = survivors.binary_search(&next) else {
                self.scratch.edge_list = survivors;
                return Err(InvalidPolygonError::InconsistentLink { edge: index, next }.into());
            };
            self.link(first + i, first + j);
        }

        for (i, &b) in survivors.iter().enumerate() {
            let c = self.edges[b].next;
            let d = first + i;
            let d_next = self.edges[d].next;

            let bi = self.add_vertices(b, false);
            let ci = self.add_vertices(c, false);
            let di = self.add_vertices(d, true);
            let dci = self.add_vertices(d_next, true);

            self.add_triangle(bi.next, ci.prev, dci.prev);
            self.add_triangle(bi.next, dci.prev, di.next);

            self.active.insert(d);
        }

        self.scratch.edge_list = survivors;
        Ok(())
    }

    fn update_max_distance(&mut self, index: EdgeIndex) {
        let edge = &self.edges[index];
        let distance = max_distance(edge, &self.edges[edge.next]);
        self.edges[index].max_distance = distance;
    }

    fn add_all_possible_cuts(&mut self, index: EdgeIndex) {
        for &other in &self.active {
            if other != index {
                self.possible_cuts.insert((index, other));
                self.possible_cuts.insert((other, index));
            }
        }
    }
}

/// Sweep distance at which `edge` shrinks to a point, given its successor.
///
/// Infinite if the edge never shrinks; an edge already of zero length, or
/// one of a two-edge loop, closes immediately.
pub(crate) fn max_distance(edge: &Edge, next: &Edge) -> f64 {
    let base = edge.distance.max(next.distance);

    if edge.next == edge.prev {
        return base;
    }
    let this_origin = edge.project(base);
    let next_origin = next.project(base);

    let length = (next_origin - this_origin).dot(&edge.tangent);

    let prev_speed = edge.velocity.dot(&edge.tangent);
    let next_speed = next.velocity.dot(&edge.tangent);

    if prev_speed - next_speed <= SWEEP_EPSILON {
        // Floor for loops converging on the origin.
        let epsilon = relative_epsilon(&[this_origin, next_origin], SWEEP_EPSILON).max(TOLERANCE);
        if length <= epsilon {
            base
        } else {
            f64::INFINITY
        }
    } else {
        base + (length / (prev_speed - next_speed)).max(0.0)
    }
}

/// Finds when the start vertex of `edge` reaches segment `other`, which ends
/// at the origin of `other_next`.
///
/// Returns `None` if it never does, or only after one of the two edges has
/// closed. Landing on either end of `other` is reported as a merge, unless
/// that end is a neighbor of the vertex.
pub(crate) fn calculate_split(edge: &Edge, other: &Edge, other_next: &Edge) -> Option<SplitCandidate> {
    if other.index == edge.index || edge.twin == Some(other.index) || edge.velocity.norm_squared() <= 0.0 {
        return None;
    }

    let dv0 = (other.velocity - edge.velocity).dot(&other.normal);
    let dv1 = (other_next.velocity - edge.velocity).dot(&other.normal);

    let velocity_epsilon = relative_epsilon(
        &[edge.velocity, other.velocity, other_next.velocity],
        RELATIVE_EPSILON,
    );
    if dv0.min(dv1) <= velocity_epsilon {
        return None;
    }

    let base = edge.distance.max(other.distance).max(other_next.distance);
    let edge_origin = edge.project(base);
    let other_origin = other.project(base);
    let other_next_origin = other_next.project(base);

    let dx0 = (edge_origin - other_origin).dot(&other.normal);
    let dx1 = (edge_origin - other_next_origin).dot(&other.normal);

    let position_epsilon = relative_epsilon(
        &[edge_origin, other_origin, other_next_origin],
        RELATIVE_EPSILON,
    );
    if dx0.min(dx1) <= -position_epsilon {
        return None;
    }

    let t0 = dx0 / dv0;
    let t1 = dx1 / dv1;
    let t = t0.min(t1);

    if t < 0.0 || base + t >= edge.max_distance || base + t >= other.max_distance {
        return None;
    }

    let position = edge_origin + edge.velocity * t;
    let prev_pos = other_origin + other.velocity * t0;
    let next_pos = other_next_origin + other_next.velocity * t1;

    let d_prev = (position - prev_pos).dot(&other.tangent);
    let d_next = (position - next_pos).dot(&other.tangent);

    let epsilon = relative_epsilon(&[prev_pos, next_pos], RELATIVE_EPSILON);

    if d_prev <= -epsilon || d_next >= 0.0 {
        return None;
    }

    let merge = if d_prev <= epsilon {
        if edge.next == other.index || edge.prev == other.index {
            return None;
        }
        MergeMode::Start
    } else if d_next >= -epsilon {
        if edge.next == other_next.index || edge.prev == other_next.index {
            return None;
        }
        MergeMode::End
    } else {
        MergeMode::None
    };

    Some(SplitCandidate {
        distance: base + t,
        position,
        merge,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::math::polygon_2d::signed_area_2d;
    use crate::PolyMeshError;

    fn v(x: f64, y: f64) -> Vector2 {
        Vector2::new(x, y)
    }

    fn square(half: f64) -> Vec<Vector2> {
        vec![v(-half, -half), v(half, -half), v(half, half), v(-half, half)]
    }

    /// Square with a deep notch cut in from the right. Insetting it makes
    /// the notch tip cut the left wall.
    fn notched() -> Vec<Vector2> {
        vec![
            v(0.0, 0.0),
            v(10.0, 0.0),
            v(10.0, 4.0),
            v(2.0, 5.0),
            v(10.0, 6.0),
            v(10.0, 10.0),
            v(0.0, 10.0),
        ]
    }

    /// Regular star with `points` tips, centred on the origin.
    fn star(points: u32, outer: f64, inner: f64) -> Vec<Vector2> {
        (0..points * 2)
            .map(|i| {
                let angle = f64::from(i) * PI / f64::from(points);
                let r = if i % 2 == 0 { outer } else { inner };
                v(angle.cos() * r, angle.sin() * r)
            })
            .collect()
    }

    /// Two notches pinching a square at `x = 5`. Insetting makes the notch
    /// tips meet head on.
    fn hourglass() -> Vec<Vector2> {
        vec![
            v(0.0, 0.0),
            v(4.0, 0.0),
            v(5.0, 3.0),
            v(6.0, 0.0),
            v(10.0, 0.0),
            v(10.0, 10.0),
            v(6.0, 10.0),
            v(5.0, 7.0),
            v(4.0, 10.0),
            v(0.0, 10.0),
        ]
    }

    /// Sum of the signed xy areas of all triangles.
    fn mesh_area(builder: &PolygonMeshBuilder) -> f64 {
        let vertices = builder.vertices();
        builder
            .indices()
            .chunks(3)
            .map(|tri| {
                let points: Vec<Vector2> = tri
                    .iter()
                    .map(|&i| vertices[i as usize].position.xy())
                    .collect();
                signed_area_2d(&points)
            })
            .sum()
    }

    #[test]
    fn negative_or_nan_width_is_rejected() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(1.0), false).unwrap();

        assert!(builder.bevel(-1.0, 0.0).is_err());
        assert!(builder.bevel(f64::NAN, 0.0).is_err());
        assert_eq!(builder.triangle_count(), 0);
    }

    #[test]
    fn non_finite_height_is_rejected() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(1.0), false).unwrap();

        for height in [f64::NAN, f64::INFINITY] {
            let err = builder.bevel(0.5, height).unwrap_err();
            assert!(matches!(err, PolyMeshError::Operation(_)));
        }
        assert_eq!(builder.triangle_count(), 0);
        assert!(builder.vertices().is_empty());

        builder.extrude(1.0).unwrap();
        assert!(builder.positions().all(|p| p.z.is_finite()));
    }

    #[test]
    fn event_free_bevel_adds_two_triangles_per_edge() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(5.0), false).unwrap();
        builder.bevel(1.0, 1.0).unwrap();

        assert_eq!(builder.triangle_count(), 8);
        assert_eq!(builder.active_edge_count(), 4);

        let loops = builder.active_loops();
        let area = signed_area_2d(&loops[0]);
        assert_abs_diff_eq!(area, 64.0, epsilon = 1e-9);
    }

    #[test]
    fn bevel_raises_new_boundary() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(5.0), false).unwrap();
        builder.bevel(1.0, 2.0).unwrap();

        let top = builder
            .vertices()
            .iter()
            .filter(|v| (v.position.z - 2.0).abs() < 1e-9)
            .count();
        assert!(top > 0);
        for p in builder.positions() {
            assert!(p.x.abs() <= 5.0 + 1e-9 && p.y.abs() <= 5.0 + 1e-9);
        }
    }

    #[test]
    fn side_walls_face_outwards() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(5.0), false).unwrap();
        builder.extrude(10.0).unwrap();

        let vertices = builder.vertices();
        for tri in builder.indices().chunks(3) {
            let a = vertices[tri[0] as usize].position;
            let b = vertices[tri[1] as usize].position;
            let c = vertices[tri[2] as usize].position;
            let face = (b - a).cross(&(c - a));
            let center = (a + b + c) / 3.0;
            // Outward means away from the z axis.
            assert!(face.x * center.x + face.y * center.y > 0.0);
        }
    }

    #[test]
    fn inset_past_inradius_closes_square() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(5.0), false).unwrap();
        builder.inset(6.0).unwrap();

        assert!(builder.is_closed());
        assert!(builder.triangle_count() > 0);
    }

    #[test]
    fn inset_past_inradius_closes_rectangle() {
        let mut builder = PolygonMeshBuilder::new();
        builder
            .add_edge_loop(&[v(0.0, 0.0), v(10.0, 0.0), v(10.0, 4.0), v(0.0, 4.0)], false)
            .unwrap();
        builder.inset(3.0).unwrap();

        assert!(builder.is_closed());
    }

    #[test]
    fn symmetric_star_collapses_completely() {
        let points = star(7, 10.0, 4.0);
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&points, false).unwrap();
        builder.inset(5.0).unwrap();

        assert!(builder.is_closed(), "left over: {:?}", builder.active_loops());
        assert_abs_diff_eq!(mesh_area(&builder), signed_area_2d(&points), epsilon = 1e-6);

        builder.fill().unwrap();
        assert!(builder.is_closed());
    }

    #[test]
    fn chained_bevels_keep_events_in_their_own_range() {
        let points = star(7, 10.0, 4.0);
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&points, false).unwrap();
        builder.inset(2.0).unwrap();
        assert_eq!(builder.active_edge_count(), 14);

        builder.bevel(3.0, 0.0).unwrap();
        assert!(builder.state.event_distance >= 2.0);
        assert!(builder.state.event_distance <= 5.0);
        assert!(builder.is_closed());
        assert_abs_diff_eq!(mesh_area(&builder), signed_area_2d(&points), epsilon = 1e-6);
    }

    #[test]
    fn hourglass_tips_merge_into_two_loops() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&hourglass(), false).unwrap();
        builder.inset(1.0).unwrap();

        let loops = builder.active_loops();
        assert_eq!(loops.len(), 2);
        for l in &loops {
            assert!(signed_area_2d(l) > 0.0);
        }
        // One half on each side of the pinch.
        assert!(loops.iter().any(|l| l.iter().all(|p| p.x < 5.0)));
        assert!(loops.iter().any(|l| l.iter().all(|p| p.x > 5.0)));
        builder.validate().unwrap();
    }

    #[test]
    fn hourglass_collapses_past_inradius() {
        let points = hourglass();
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&points, false).unwrap();
        builder.inset(3.0).unwrap();

        assert!(builder.is_closed(), "left over: {:?}", builder.active_loops());
        assert_abs_diff_eq!(mesh_area(&builder), 94.0, epsilon = 1e-6);
        assert_abs_diff_eq!(signed_area_2d(&points), 94.0, epsilon = 1e-9);
    }

    #[test]
    fn event_budget_stops_runaway_sweeps() {
        let mut budget = EventBudget::new(2, 10);
        for _ in 0..4 {
            budget.spend(2).unwrap();
        }

        let err = budget.spend(2).unwrap_err();
        assert!(matches!(
            err,
            PolyMeshError::InvalidPolygon(InvalidPolygonError::Exploded {
                iterations: 4,
                active_edges: 2,
            })
        ));

        // Ten edges already in the arena, four more allowed per active edge.
        budget.check_edges(18, 2).unwrap();
        assert!(budget.check_edges(19, 2).unwrap_err().is_invalid_polygon());
    }

    #[test]
    fn bevel_invalidates_validation() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(5.0), false).unwrap();
        builder.validate().unwrap();
        assert!(builder.validated);

        builder.inset(1.0).unwrap();
        assert!(!builder.validated);

        // Break a link behind the builder's back; the next fill must notice.
        let edge = *builder.active.first().unwrap();
        let next = builder.edges[edge].next;
        builder.edges[next].prev = next;

        let err = builder.fill().unwrap_err();
        assert!(matches!(
            err,
            PolyMeshError::InvalidPolygon(InvalidPolygonError::InconsistentLink { .. })
        ));
    }

    #[test]
    fn notch_splits_loop_in_two() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&notched(), false).unwrap();
        builder.inset(1.5).unwrap();

        let loops = builder.active_loops();
        assert_eq!(loops.len(), 2);
        for l in &loops {
            assert!(signed_area_2d(l) > 0.0);
        }
        builder.validate().unwrap();
    }

    #[test]
    fn hole_shrinks_away_from_material() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(10.0), false).unwrap();
        builder.add_edge_loop(&square(2.0), true).unwrap();
        builder.inset(1.0).unwrap();

        let loops = builder.active_loops();
        assert_eq!(loops.len(), 2);
        let hole = loops
            .iter()
            .find(|l| signed_area_2d(l) < 0.0)
            .unwrap();
        assert_abs_diff_eq!(signed_area_2d(hole), -36.0, epsilon = 1e-9);
    }

    #[test]
    fn hole_breaking_through_wall_joins_loops() {
        let diamond = [v(1.0, 0.0), v(0.0, 1.0), v(-1.0, 0.0), v(0.0, -1.0)];

        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(10.0), false).unwrap();
        builder
            .add_edge_loop_transformed(&diamond, v(7.0, 0.0), v(1.0, 1.0), true)
            .unwrap();
        builder.inset(1.2).unwrap();

        // The diamond tip reaches the right wall first and opens the hole.
        assert_eq!(builder.active_loops().len(), 1);
        builder.validate().unwrap();
    }

    #[test]
    fn consecutive_bevels_continue_distance() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(5.0), false).unwrap();
        builder.bevel(1.0, 1.0).unwrap();
        builder.bevel(1.0, 1.0).unwrap();

        assert_abs_diff_eq!(builder.state.prev_distance, 2.0);
        assert_abs_diff_eq!(builder.state.prev_height, 2.0);
        let area = signed_area_2d(&builder.active_loops()[0]);
        assert_abs_diff_eq!(area, 36.0, epsilon = 1e-9);
    }

    #[test]
    fn max_distance_of_square_edge() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(5.0), false).unwrap();

        let edge = builder.edges[1];
        let next = builder.edges[edge.next];
        assert_abs_diff_eq!(max_distance(&edge, &next), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn parallel_edge_never_closes() {
        let mut builder = PolygonMeshBuilder::new();
        builder
            .add_edge_loop(&[v(0.0, 0.0), v(10.0, 0.0), v(10.0, 4.0), v(0.0, 4.0)], false)
            .unwrap();

        // Both ends sliding along at the same speed.
        let mut edge = builder.edges[1];
        let mut next = builder.edges[edge.next];
        edge.velocity = v(1.0, 1.0);
        next.velocity = v(1.0, 1.0);
        assert!(max_distance(&edge, &next).is_infinite());
    }

    #[test]
    fn split_candidate_for_notch_tip() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&notched(), false).unwrap();
        for &i in &builder.active.clone() {
            builder.update_max_distance(i);
        }

        // Edge 4 starts at the notch tip (2, 5); edge 0 is the left wall.
        let edge = builder.edges[4];
        let wall = builder.edges[0];
        let wall_next = builder.edges[wall.next];
        let candidate = calculate_split(&edge, &wall, &wall_next).unwrap();

        assert_eq!(candidate.merge, MergeMode::None);
        assert!(candidate.distance > 0.0 && candidate.distance < 1.5);
        assert_abs_diff_eq!(candidate.position.y, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn no_split_against_self_or_twin() {
        let mut builder = PolygonMeshBuilder::new();
        builder.add_edge_loop(&square(5.0), false).unwrap();

        let mut edge = builder.edges[1];
        let other = builder.edges[3];
        let other_next = builder.edges[other.next];
        assert!(calculate_split(&edge, &edge, &builder.edges[2]).is_none());

        edge.twin = Some(3);
        assert!(calculate_split(&edge, &other, &other_next).is_none());
    }
}
