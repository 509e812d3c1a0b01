//! Point geometry used by hit-testing.

use kurbo::Point;

/// Squared Euclidean distance between two points.
///
/// Radius checks compare against a squared threshold instead of taking a
/// square root.
#[inline]
pub fn squared_distance(a: Point, b: Point) -> f64 {
    (a - b).hypot2()
}

/// Whether `a` and `b` are at most `radius` apart.
#[inline]
pub fn within_radius(a: Point, b: Point, radius: f64) -> bool {
    squared_distance(a, b) <= radius * radius
}
