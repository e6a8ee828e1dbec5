//! Flat cap over the active loops: sweep-line decomposition into x-monotone
//! pieces, then stack triangulation of each piece.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::f64::consts::FRAC_PI_2;

use tracing::debug;

use super::edge::{Edge, EdgeIndex};
use super::PolygonMeshBuilder;
use crate::error::{InvalidPolygonError, Result};
use crate::math::polygon_2d::{compare_xy, cross_2d, normalize_safe};
use crate::math::Vector2;

/// How a vertex relates to its neighbors in sweep (lexicographic) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VertexKind {
    /// Both neighbors later, material to the right.
    Start,
    /// Both neighbors earlier, material to the left.
    End,
    /// Both neighbors later, reflex: a piece splits off.
    Split,
    /// Both neighbors earlier, reflex: two pieces join.
    Merge,
    /// On the bottom of a piece.
    Lower,
    /// On the top of a piece.
    Upper,
}

fn classify(prev: Vector2, curr: Vector2, next: Vector2) -> VertexKind {
    let prev_after = compare_xy(&prev, &curr) == Ordering::Greater;
    let next_after = compare_xy(&next, &curr) == Ordering::Greater;
    let next_below = normalize_safe(next - curr).y < normalize_safe(prev - curr).y;

    match (prev_after, next_after) {
        (true, true) if next_below => VertexKind::Start,
        (true, true) => VertexKind::Split,
        (false, false) if next_below => VertexKind::Merge,
        (false, false) => VertexKind::End,
        (false, true) => VertexKind::Lower,
        (true, false) => VertexKind::Upper,
    }
}

/// Edge in the sweep status.
#[derive(Debug, Clone, Copy)]
struct SweepEdge {
    index: EdgeIndex,
    origin: Vector2,
    slope: f64,
}

impl SweepEdge {
    fn new(edge: &Edge) -> Self {
        let slope = if edge.tangent.x.abs() <= 1e-4 {
            0.0
        } else {
            edge.tangent.y / edge.tangent.x
        };

        Self {
            index: edge.index,
            origin: edge.origin,
            slope,
        }
    }

    fn y_at(&self, x: f64) -> f64 {
        self.origin.y + self.slope * (x - self.origin.x)
    }
}

#[derive(Debug, Clone, Copy)]
struct Helper {
    vertex: EdgeIndex,
    was_merge: bool,
}

/// Vertex of a monotone piece being triangulated.
#[derive(Debug, Clone, Copy)]
struct ChainVertex {
    position: Vector2,
    /// Offset from the previous vertex on the same chain.
    delta: Vector2,
    vertex: u32,
    is_upper: bool,
}

impl ChainVertex {
    /// Whether the chain turns towards the piece's interior at this vertex
    /// on its way to `next`.
    fn is_convex_towards(&self, next: &ChainVertex) -> bool {
        let turn = cross_2d(self.delta, next.position - self.position);
        if self.is_upper {
            turn < 0.0
        } else {
            turn > 0.0
        }
    }
}

#[derive(Debug, Default)]
pub(super) struct FillScratch {
    sorted: Vec<EdgeIndex>,
    /// Edges with material directly above them, ordered bottom to top at
    /// the current sweep position.
    status: Vec<SweepEdge>,
    helpers: HashMap<EdgeIndex, Helper>,
    chain: Vec<ChainVertex>,
    stack: Vec<ChainVertex>,
}

impl FillScratch {
    fn insert_status(&mut self, edge: &Edge) {
        let entry = SweepEdge::new(edge);
        let x = edge.origin.x;
        let y = entry.y_at(x);
        let at = self.status.partition_point(|s| s.y_at(x) < y);
        self.status.insert(at, entry);
    }

    fn remove_status(&mut self, index: EdgeIndex) {
        if let Some(at) = self.status.iter().position(|s| s.index == index) {
            self.status.remove(at);
        }
    }

    fn replace_status(&mut self, old: EdgeIndex, edge: &Edge) {
        if let Some(entry) = self.status.iter_mut().find(|s| s.index == old) {
            *entry = SweepEdge::new(edge);
        }
    }

    /// The status edge directly below the origin of `edge`, ignoring the
    /// edge itself and its predecessor.
    fn find_below(&self, edge: &Edge) -> Result<EdgeIndex> {
        let origin = edge.origin;

        self.status
            .iter()
            .rev()
            .filter(|s| s.index != edge.prev && s.index != edge.index)
            .find(|s| s.y_at(origin.x) - origin.y <= 0.0)
            .map(|s| s.index)
            .ok_or_else(|| InvalidPolygonError::BrokenSweep { edge: edge.index }.into())
    }

    fn helper(&self, index: EdgeIndex) -> Result<Helper> {
        self.helpers
            .get(&index)
            .copied()
            .ok_or_else(|| InvalidPolygonError::BrokenSweep { edge: index }.into())
    }

    fn set_helper(&mut self, index: EdgeIndex, vertex: EdgeIndex, was_merge: bool) {
        self.helpers.insert(index, Helper { vertex, was_merge });
    }
}

impl PolygonMeshBuilder {
    /// Triangulates the area enclosed by the active loops at the current
    /// height, closing the mesh.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidPolygonError`] if the active edges are not simple
    /// closed loops or the sweep cannot make sense of them (for example a
    /// hole outside of any solid loop).
    pub fn fill(&mut self) -> Result<&mut Self> {
        self.validate()?;

        let edges_before = self.active.len();
        let triangles_before = self.triangle_count();

        self.add_cap_vertices();

        let mut scratch = std::mem::take(&mut self.scratch.fill);
        let result = self
            .split_into_monotone(&mut scratch)
            .and_then(|()| self.triangulate_monotone(&mut scratch));
        self.scratch.fill = scratch;
        result?;

        self.finish_sweep();

        debug!(
            edges_before,
            triangles = self.triangle_count() - triangles_before,
            "fill"
        );

        Ok(self)
    }

    /// Makes sure every active edge has an upward-facing vertex at the end
    /// of the last sweep.
    fn add_cap_vertices(&mut self) {
        self.state.next_angle = FRAC_PI_2;
        self.refresh_vertices_for_angle(FRAC_PI_2);

        let mut active = std::mem::take(&mut self.scratch.edge_list);
        active.clear();
        active.extend(self.active.iter().copied());

        for &index in &active {
            self.add_vertices(index, true);
        }

        self.scratch.edge_list = active;
    }

    /// Adds diagonals until every active loop is x-monotone.
    fn split_into_monotone(&mut self, scratch: &mut FillScratch) -> Result<()> {
        scratch.sorted.clear();
        scratch.sorted.extend(self.active.iter().copied());

        let edges = &self.edges;
        scratch
            .sorted
            .sort_by(|&a, &b| compare_xy(&edges[a].origin, &edges[b].origin));

        scratch.status.clear();
        scratch.helpers.clear();

        for k in 0..scratch.sorted.len() {
            let index = scratch.sorted[k];
            let edge = self.edges[index];
            let prev = edge.prev;

            let kind = classify(
                self.edges[prev].origin,
                edge.origin,
                self.edges[edge.next].origin,
            );

            match kind {
                VertexKind::Start => {
                    scratch.insert_status(&edge);
                    scratch.set_helper(index, index, false);
                }
                VertexKind::End => {
                    self.fix_up(scratch, index, prev)?;
                    scratch.remove_status(prev);
                }
                VertexKind::Split => {
                    let below = scratch.find_below(&edge)?;
                    let helper = scratch.helper(below)?;
                    let fixed = self.connect_two_way(index, helper.vertex);
                    scratch.insert_status(&edge);
                    scratch.set_helper(below, fixed, false);
                    scratch.set_helper(index, index, false);
                }
                VertexKind::Merge => {
                    let below = scratch.find_below(&edge)?;
                    scratch.remove_status(prev);
                    let joined = self.fix_up(scratch, index, below)?;
                    self.fix_up(scratch, joined, prev)?;
                    scratch.set_helper(below, joined, true);
                }
                VertexKind::Lower => {
                    self.fix_up(scratch, index, prev)?;
                    scratch.replace_status(prev, &edge);
                    scratch.set_helper(index, index, false);
                }
                VertexKind::Upper => {
                    let below = scratch.find_below(&edge)?;
                    let fixed = self.fix_up(scratch, index, below)?;
                    scratch.set_helper(below, fixed, false);
                }
            }
        }

        Ok(())
    }

    /// Connects vertex `v` to the helper of `status_edge` if that helper was
    /// a merge vertex. Returns the copy of `v` that continues the loop.
    fn fix_up(
        &mut self,
        scratch: &FillScratch,
        v: EdgeIndex,
        status_edge: EdgeIndex,
    ) -> Result<EdgeIndex> {
        let helper = scratch.helper(status_edge)?;

        if helper.was_merge {
            Ok(self.connect_two_way(v, helper.vertex))
        } else {
            Ok(v)
        }
    }

    /// Splits a loop along the diagonal between the origins of `a` and `b`.
    ///
    /// Returns the new edge starting at `a`'s origin.
    fn connect_two_way(&mut self, a: EdgeIndex, b: EdgeIndex) -> EdgeIndex {
        let edge_a = self.edges[a];
        let edge_b = self.edges[b];

        let a_new = self.push_edge(
            edge_a.origin,
            normalize_safe(edge_b.origin - edge_a.origin),
            edge_a.distance,
            None,
        );
        let b_new = self.push_edge(
            edge_b.origin,
            normalize_safe(edge_a.origin - edge_b.origin),
            edge_b.distance,
            None,
        );

        self.edges[a_new].vertices = edge_a.vertices;
        self.edges[b_new].vertices = edge_b.vertices;

        self.link_simple(edge_a.prev, a_new);
        self.link_simple(a_new, b);
        self.link_simple(edge_b.prev, b_new);
        self.link_simple(b_new, a);

        self.active.insert(a_new);
        self.active.insert(b_new);

        a_new
    }

    /// Triangulates and removes every active loop, assuming each is
    /// x-monotone.
    fn triangulate_monotone(&mut self, scratch: &mut FillScratch) -> Result<()> {
        while let Some(first) = self.active.pop_first() {
            let (min, max) = self.take_loop_extremes(first)?;

            self.collect_chains(&mut scratch.chain, min, max)?;
            scratch
                .chain
                .sort_by(|a, b| compare_xy(&a.position, &b.position));

            if scratch.chain.len() < 3 {
                continue;
            }

            let chain = &scratch.chain;
            let stack = &mut scratch.stack;
            stack.clear();
            stack.push(chain[0]);
            stack.push(chain[1]);

            let last = chain.len() - 1;

            for (i, &next) in chain.iter().enumerate().skip(2) {
                let Some(&top) = stack.last() else {
                    break;
                };

                if top.is_upper != next.is_upper {
                    // Fan the whole stack from the opposite chain.
                    while stack.len() > 1 {
                        let Some(curr) = stack.pop() else { break };
                        let Some(&prev) = stack.last() else { break };

                        if next.is_upper {
                            self.add_triangle(next.vertex, prev.vertex, curr.vertex);
                        } else {
                            self.add_triangle(next.vertex, curr.vertex, prev.vertex);
                        }
                    }

                    stack.clear();
                    stack.push(top);
                    stack.push(ChainVertex {
                        delta: next.position - top.position,
                        ..next
                    });
                    continue;
                }

                let mut top = top;
                while stack.len() > 1 && (i == last || top.is_convex_towards(&next)) {
                    let Some(curr) = stack.pop() else { break };
                    let Some(&prev) = stack.last() else { break };
                    top = prev;

                    if next.is_upper {
                        self.add_triangle(next.vertex, curr.vertex, top.vertex);
                    } else {
                        self.add_triangle(next.vertex, top.vertex, curr.vertex);
                    }
                }

                stack.push(ChainVertex {
                    delta: next.position - top.position,
                    ..next
                });
            }
        }

        Ok(())
    }

    /// Removes the loop through `first` from the active set, returning its
    /// lexicographically smallest and largest edges.
    fn take_loop_extremes(&mut self, first: EdgeIndex) -> Result<(EdgeIndex, EdgeIndex)> {
        let mut min = first;
        let mut max = first;
        let mut index = self.edges[first].next;

        while index != first {
            if !self.active.remove(&index) {
                return Err(InvalidPolygonError::InconsistentLink {
                    edge: self.edges[index].prev,
                    next: index,
                }
                .into());
            }

            let origin = self.edges[index].origin;
            if compare_xy(&origin, &self.edges[min].origin) == Ordering::Less {
                min = index;
            }
            if compare_xy(&origin, &self.edges[max].origin) == Ordering::Greater {
                max = index;
            }

            index = self.edges[index].next;
        }

        Ok((min, max))
    }

    /// Lower chain from `min` towards `max`, then upper chain from `max`
    /// back to `min`.
    fn collect_chains(
        &self,
        chain: &mut Vec<ChainVertex>,
        min: EdgeIndex,
        max: EdgeIndex,
    ) -> Result<()> {
        chain.clear();

        let mut index = min;
        let mut prev_position = self.edges[min].origin;
        loop {
            let edge = &self.edges[index];
            chain.push(ChainVertex {
                position: edge.origin,
                delta: edge.origin - prev_position,
                vertex: self.cap_vertex(index)?,
                is_upper: false,
            });

            prev_position = edge.origin;
            index = edge.next;
            if index == max || index == min {
                break;
            }
        }

        let mut index = max;
        while index != min {
            let edge = &self.edges[index];
            chain.push(ChainVertex {
                position: edge.origin,
                delta: edge.origin - self.edges[edge.next].origin,
                vertex: self.cap_vertex(index)?,
                is_upper: true,
            });
            index = edge.next;
        }

        Ok(())
    }

    fn cap_vertex(&self, index: EdgeIndex) -> Result<u32> {
        self.edges[index]
            .vertices
            .map(|v| v.prev)
            .ok_or_else(|| InvalidPolygonError::BrokenSweep { edge: index }.into())
    }
}
