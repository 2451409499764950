// THEORY:
// Pure box geometry shared by the detectors. Nothing here holds state.
//
// `iou` follows the inclusive-pixel convention used by most detection tooling:
// a box spanning x..x+w covers w+1 pixel columns, so intersection sides get a
// "+1" and each area is (w+1)*(h+1). That keeps the denominator at or above 1
// for any non-negative box, so the ratio is always defined, and it is the
// convention the 0.9 trash-reconciliation cutoff was tuned against.

use crate::core_modules::tracking_box::TrackingBox;

/// Euclidean distance between the centers of two boxes.
pub fn distance(a: &TrackingBox, b: &TrackingBox) -> f64 {
    let (ax, ay) = a.center();
    let (bx, by) = b.center();
    ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
}

/// Intersection over union with inclusive pixel coordinates. Result is in [0, 1].
pub fn iou(a: &TrackingBox, b: &TrackingBox) -> f64 {
    let x_inf = a.x.max(b.x);
    let y_inf = a.y.max(b.y);
    let x_sup = (a.x + a.w).min(b.x + b.w);
    let y_sup = (a.y + a.h).min(b.y + b.h);

    let intersection = (x_sup - x_inf + 1.0).max(0.0) * (y_sup - y_inf + 1.0).max(0.0);

    let area_a = (a.w + 1.0) * (a.h + 1.0);
    let area_b = (b.w + 1.0) * (b.h + 1.0);

    intersection / (area_a + area_b - intersection)
}
