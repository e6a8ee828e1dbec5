use crate::math::polygon_2d::left_normal;
use crate::math::Vector2;

/// Index of an edge in the builder's edge arena.
pub type EdgeIndex = usize;

/// Output vertex indices at an edge's origin.
///
/// `prev` carries the normal of the face swept by the previous edge, `next`
/// the normal of the face swept by this edge. Both are equal when the corner
/// is smooth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexPair {
    pub prev: u32,
    pub next: u32,
}

impl VertexPair {
    /// A single vertex shared by both faces.
    #[must_use]
    pub fn shared(index: u32) -> Self {
        Self {
            prev: index,
            next: index,
        }
    }
}

/// A directed boundary segment from `origin` to the origin of `next`.
///
/// Edges are never removed from the arena; retired edges stay around so the
/// vertices they cached can still be referenced.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub index: EdgeIndex,
    pub origin: Vector2,
    pub tangent: Vector2,
    /// Points into the material (left of `tangent`).
    pub normal: Vector2,
    /// Movement of `origin` per unit of sweep distance.
    pub velocity: Vector2,
    pub prev: EdgeIndex,
    pub next: EdgeIndex,
    /// Sweep distance at which this edge was created.
    pub distance: f64,
    /// Sweep distance at which this edge shrinks to a point.
    pub max_distance: f64,
    pub vertices: Option<VertexPair>,
    /// Partner edge created by the same split or merge event.
    pub twin: Option<EdgeIndex>,
}

impl Edge {
    /// Creates an unlinked edge.
    #[must_use]
    pub fn new(
        index: EdgeIndex,
        origin: Vector2,
        tangent: Vector2,
        distance: f64,
        twin: Option<EdgeIndex>,
    ) -> Self {
        Self {
            index,
            origin,
            tangent,
            normal: left_normal(tangent),
            velocity: Vector2::zeros(),
            prev: index,
            next: index,
            distance,
            max_distance: f64::INFINITY,
            vertices: None,
            twin,
        }
    }

    /// Position of the origin once the sweep has reached `distance`.
    #[must_use]
    pub fn project(&self, distance: f64) -> Vector2 {
        self.origin + self.velocity * (distance - self.distance)
    }
}

/// Velocity of the vertex shared by two consecutive edges: along the
/// bisector of their normals, scaled so that both edges move one unit per
/// unit of sweep distance.
///
/// Zero when the normals are (nearly) opposite.
#[must_use]
pub fn corner_velocity(prev_normal: Vector2, next_normal: Vector2) -> Vector2 {
    let sum = prev_normal + next_normal;
    let sqr_mag = sum.norm_squared();

    if sqr_mag < 0.001 {
        Vector2::zeros()
    } else {
        sum * (2.0 / sqr_mag)
    }
}
