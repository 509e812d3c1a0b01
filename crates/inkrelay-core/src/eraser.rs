//! Server-side stroke erasure.
//!
//! An eraser gesture is a sampled path with a diameter. Every visible stroke
//! that has a sample point close enough to an eraser sample point is
//! tombstoned. This is point sampling only: a fast eraser or a sparsely
//! sampled stroke can pass through a target without touching it.

use std::collections::HashSet;

use kurbo::Point;

use crate::action::{Action, ActionId, DeleteStroke, EraseRequest, PathPoint, Stroke};
use crate::geometry::within_radius;

/// Ids referenced by every tombstone in `history`.
pub fn tombstoned_ids(history: &[Action]) -> HashSet<&ActionId> {
    history
        .iter()
        .filter_map(Action::as_delete_stroke)
        .map(|d| &d.target_id)
        .collect()
}

/// Whether any point of `stroke` lies within `eraser_radius` plus the stroke's
/// half-width of any point of `eraser_path`.
pub fn stroke_hit(stroke: &Stroke, eraser_path: &[Point], eraser_radius: f64) -> bool {
    let threshold = eraser_radius + stroke.half_width();
    stroke
        .path
        .iter()
        .filter_map(PathPoint::position)
        .any(|sp| {
            eraser_path
                .iter()
                .any(|&ep| within_radius(sp, ep, threshold))
        })
}

/// Compute the tombstones an erase request produces against `history`.
///
/// Strokes already tombstoned are never considered again, so resolving the
/// same request twice yields nothing the second time. Each stroke id gets at
/// most one tombstone; results follow history order.
pub fn resolve(request: &EraseRequest, history: &[Action]) -> Vec<DeleteStroke> {
    let eraser_path: Vec<Point> = request.path.iter().filter_map(PathPoint::position).collect();
    if eraser_path.is_empty() {
        return Vec::new();
    }

    let radius = request.radius();
    let deleted = tombstoned_ids(history);
    let mut hit: HashSet<&ActionId> = HashSet::new();
    let mut tombstones = Vec::new();

    for stroke in history.iter().filter_map(Action::as_stroke) {
        if deleted.contains(&stroke.id) || hit.contains(&stroke.id) {
            continue;
        }
        if stroke_hit(stroke, &eraser_path, radius) {
            hit.insert(&stroke.id);
            tombstones.push(DeleteStroke::new(stroke.id.clone()));
        }
    }

    log::debug!(
        "Eraser with {} points (radius {}) hit {} strokes",
        eraser_path.len(),
        radius,
        tombstones.len()
    );
    tombstones
}
