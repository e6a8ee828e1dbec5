use super::polygon_2d::cross_2d;
use super::{Vector2, TOLERANCE};

/// Returns `true` if the segments `a0–a1` and `b0–b1` cross at a single
/// point interior to both.
///
/// Touching at an endpoint and collinear overlap do not count as crossing.
#[must_use]
pub fn segments_cross(a0: Vector2, a1: Vector2, b0: Vector2, b1: Vector2) -> bool {
    let da = a1 - a0;
    let db = b1 - b0;

    let scale = a0.amax().max(a1.amax()).max(b0.amax()).max(b1.amax()).max(1.0);
    let tol_a = TOLERANCE * scale * da.norm();
    let tol_b = TOLERANCE * scale * db.norm();

    let s0 = side(cross_2d(db, a0 - b0), tol_b);
    let s1 = side(cross_2d(db, a1 - b0), tol_b);
    let s2 = side(cross_2d(da, b0 - a0), tol_a);
    let s3 = side(cross_2d(da, b1 - a0), tol_a);

    s0 * s1 < 0 && s2 * s3 < 0
}

/// Returns `true` if the axis-aligned bounds of the two segments overlap.
#[must_use]
pub fn segment_bounds_overlap(a0: Vector2, a1: Vector2, b0: Vector2, b1: Vector2) -> bool {
    let min_a = a0.inf(&a1);
    let max_a = a0.sup(&a1);
    let min_b = b0.inf(&b1);
    let max_b = b0.sup(&b1);

    min_a.x <= max_b.x && min_b.x <= max_a.x && min_a.y <= max_b.y && min_b.y <= max_a.y
}

fn side(value: f64, tolerance: f64) -> i8 {
    if value > tolerance {
        1
    } else if value < -tolerance {
        -1
    } else {
        0
    }
}
