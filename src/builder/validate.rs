use super::PolygonMeshBuilder;
use crate::error::{InvalidPolygonError, Result};
use crate::math::intersect_2d::{segment_bounds_overlap, segments_cross};

impl PolygonMeshBuilder {
    /// Checks that the active edges form simple closed loops.
    ///
    /// A passing result is remembered until the boundary is next edited,
    /// whether by adding loops or by a bevel or fill rewiring it.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPolygonError`] describing the first broken link or
    /// crossing pair of edges found.
    pub fn validate(&mut self) -> Result<()> {
        if self.validated {
            return Ok(());
        }

        for &index in &self.active {
            let edge = &self.edges[index];

            for neighbor in [edge.next, edge.prev] {
                if !self.active.contains(&neighbor) {
                    return Err(InvalidPolygonError::DanglingNeighbor {
                        edge: index,
                        neighbor,
                    }
                    .into());
                }
            }

            if edge.next == index {
                return Err(InvalidPolygonError::SelfReference { edge: index }.into());
            }

            if self.edges[edge.next].prev != index {
                return Err(InvalidPolygonError::InconsistentLink {
                    edge: index,
                    next: edge.next,
                }
                .into());
            }
        }

        // TODO: sweep-line intersection test for large inputs.
        let mut list = std::mem::take(&mut self.scratch.edge_list);
        list.clear();
        list.extend(self.active.iter().copied());

        let crossing = find_crossing(self, &list);
        self.scratch.edge_list = list;

        if let Some((first, second)) = crossing {
            return Err(InvalidPolygonError::SelfIntersection { first, second }.into());
        }

        self.validated = true;
        Ok(())
    }
}

/// First pair of non-adjacent edges whose segments cross.
fn find_crossing(builder: &PolygonMeshBuilder, list: &[usize]) -> Option<(usize, usize)> {
    for (i, &a) in list.iter().enumerate() {
        let edge_a = &builder.edges[a];
        let a0 = edge_a.origin;
        let a1 = builder.edges[edge_a.next].origin;

        for &b in &list[i + 1..] {
            if edge_a.next == b || edge_a.prev == b {
                continue;
            }

            let edge_b = &builder.edges[b];
            let b0 = edge_b.origin;
            let b1 = builder.edges[edge_b.next].origin;

            if segment_bounds_overlap(a0, a1, b0, b1) && segments_cross(a0, a1, b0, b1) {
                return Some((a, b));
            }
        }
    }

    None
}
