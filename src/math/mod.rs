pub mod angle;
pub mod intersect_2d;
pub mod polygon_2d;

/// 2D vector type, used for loop points and edge directions.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type, used for output positions and normals.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 4D vector type, used for output tangents (direction + handedness sign).
pub type Vector4 = nalgebra::Vector4<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Vectors shorter than this are treated as having no direction.
pub const MIN_DIRECTION_LENGTH: f64 = 1e-5;

/// Distance tolerance of the bevel sweep: events, widths and heights closer
/// than this are treated as coincident.
pub const SWEEP_EPSILON: f64 = 1e-3;

/// Widths at or below this do not interpolate vertex heights or angles.
pub const WIDTH_EPSILON: f64 = 1e-4;

/// Relative tolerance for split and merge tests, scaled by the magnitude of
/// the compared positions or velocities.
pub const RELATIVE_EPSILON: f64 = 1e-4;
