use std::f64::consts::{PI, TAU};

/// Interpolates between two angles (radians) along the shorter way round.
///
/// `t` is clamped to `[0, 1]`.
#[must_use]
pub fn lerp_radians(a: f64, b: f64, t: f64) -> f64 {
    let mut delta = b - a;
    delta -= (delta * (0.5 / PI)).floor() * TAU;

    if delta > PI {
        delta -= TAU;
    }

    a + delta * t.clamp(0.0, 1.0)
}
