use thiserror::Error;

/// Top-level error type for the polygon mesh builder.
#[derive(Debug, Error)]
pub enum PolyMeshError {
    #[error(transparent)]
    InvalidPolygon(#[from] InvalidPolygonError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Svg(#[from] SvgError),

    #[error(transparent)]
    Dump(#[from] DumpError),
}

impl PolyMeshError {
    /// Returns `true` if the error was caused by bad input geometry, or by a
    /// sweep that could not make sense of it.
    #[must_use]
    pub fn is_invalid_polygon(&self) -> bool {
        matches!(self, Self::InvalidPolygon(_))
    }
}

/// The active boundary is not a set of simple closed loops, or a sweep over it
/// failed to converge.
///
/// Any of these leaves the builder in an unspecified state; call
/// `PolygonMeshBuilder::clear` before reusing it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidPolygonError {
    #[error("edge loop needs at least 3 points, got {count}")]
    TooFewPoints { count: usize },

    #[error("invalid edge list: {reason}")]
    BadEdgeList { reason: String },

    #[error("edge {edge} references inactive neighbor {neighbor}")]
    DanglingNeighbor { edge: usize, neighbor: usize },

    #[error("edge {edge} references itself")]
    SelfReference { edge: usize },

    #[error("edge {edge} links to {next}, which does not link back")]
    InconsistentLink { edge: usize, next: usize },

    #[error("edges {first} and {second} intersect")]
    SelfIntersection { first: usize, second: usize },

    #[error("fill sweep lost track of the boundary at edge {edge}")]
    BrokenSweep { edge: usize },

    #[error("sweep exploded after {iterations} events with {active_edges} active edges")]
    Exploded {
        iterations: usize,
        active_edges: usize,
    },
}

/// Errors related to operation arguments.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors raised while turning SVG paths into edge loops.
#[derive(Debug, Error)]
pub enum SvgError {
    #[error("SVG path element not supported: {0}")]
    UnsupportedCommand(String),

    #[error("malformed path data: {0}")]
    MalformedPathData(#[from] svgtypes::Error),
}

/// Errors raised while reading a debug dump.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("malformed edge loop on line {line}: {reason}")]
    MalformedLoop { line: usize, reason: String },

    #[error("malformed dump: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for results using [`PolyMeshError`].
pub type Result<T> = std::result::Result<T, PolyMeshError>;
