use std::cmp::Ordering;

use super::{Vector2, MIN_DIRECTION_LENGTH};

/// Computes the signed area of a closed loop (shoelace formula).
///
/// Positive for counter-clockwise (y up), negative for clockwise. Positive
/// loops are solid material for the mesh builder, negative loops are holes.
#[must_use]
pub fn signed_area_2d(points: &[Vector2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Normalizes `v`, or returns the zero vector if it is too short to have a
/// meaningful direction.
#[must_use]
pub fn normalize_safe(v: Vector2) -> Vector2 {
    let length = v.norm();
    if length > MIN_DIRECTION_LENGTH {
        v / length
    } else {
        Vector2::zeros()
    }
}

/// Returns the left-pointing normal of a direction vector.
///
/// For a loop with positive area this points into the enclosed material.
#[must_use]
pub fn left_normal(dir: Vector2) -> Vector2 {
    Vector2::new(-dir.y, dir.x)
}

/// 2D cross product (z component of the 3D cross product).
#[must_use]
pub fn cross_2d(a: Vector2, b: Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Lexicographic `(x, y)` order used by sweep lines.
#[must_use]
pub fn compare_xy(a: &Vector2, b: &Vector2) -> Ordering {
    a.x.partial_cmp(&b.x)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal))
}

/// Tolerance proportional to the magnitude of the given points.
#[must_use]
pub fn relative_epsilon(points: &[Vector2], fraction: f64) -> f64 {
    points.iter().fold(0.0, |eps: f64, p| eps.max(p.amax())) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::TOLERANCE;

    #[test]
    fn signed_area_ccw_square() {
        let pts = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(0.0, 1.0),
        ];
        assert!((signed_area_2d(&pts) - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_cw_square() {
        let pts = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(0.0, 1.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(1.0, 0.0),
        ];
        assert!((signed_area_2d(&pts) + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_degenerate() {
        assert!(signed_area_2d(&[Vector2::new(0.0, 0.0)]).abs() < TOLERANCE);
        assert!(signed_area_2d(&[]).abs() < TOLERANCE);
    }

    #[test]
    fn normalize_safe_short_vector_is_zero() {
        assert_eq!(normalize_safe(Vector2::new(1e-7, 0.0)), Vector2::zeros());
        let n = normalize_safe(Vector2::new(3.0, 4.0));
        assert!((n.x - 0.6).abs() < TOLERANCE);
        assert!((n.y - 0.8).abs() < TOLERANCE);
    }

    #[test]
    fn left_normal_points_into_ccw_loop() {
        // Bottom edge of a counter-clockwise square runs along +x.
        let n = left_normal(Vector2::new(1.0, 0.0));
        assert!(n.x.abs() < TOLERANCE);
        assert!((n.y - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn compare_xy_breaks_ties_on_y() {
        let a = Vector2::new(1.0, 2.0);
        let b = Vector2::new(1.0, 3.0);
        let c = Vector2::new(0.5, 9.0);
        assert_eq!(compare_xy(&a, &b), Ordering::Less);
        assert_eq!(compare_xy(&b, &a), Ordering::Greater);
        assert_eq!(compare_xy(&c, &a), Ordering::Less);
        assert_eq!(compare_xy(&a, &a), Ordering::Equal);
        assert_eq!(
            compare_xy(&Vector2::new(-0.0, 1.0), &Vector2::new(0.0, 1.0)),
            Ordering::Equal
        );
    }

    #[test]
    fn relative_epsilon_uses_largest_component() {
        let eps = relative_epsilon(&[Vector2::new(1.0, -200.0), Vector2::new(50.0, 3.0)], 0.5);
        assert!((eps - 100.0).abs() < TOLERANCE);
    }
}
