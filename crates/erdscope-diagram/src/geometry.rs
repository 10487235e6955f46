//! Diagram geometry helpers

use crate::node::{Rect, Viewport};

/// Zoom limits of the interactive canvas
pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 2.0;

/// Zoom factor applied by a single zoom in / zoom out step
pub const ZOOM_STEP: f64 = 1.2;

/// Bounding box of a set of rectangles. Empty input yields a zero rect.
pub fn rect_of_nodes(rects: impl IntoIterator<Item = Rect>) -> Rect {
    rects
        .into_iter()
        .reduce(|acc, rect| acc.union(&rect))
        .unwrap_or_default()
}

/// Viewport that fits `bounds` centred into a `width` x `height` area.
///
/// `padding` is a fraction of the bounds added around them; the resulting
/// zoom is clamped to `[min_zoom, max_zoom]`.
pub fn transform_for_bounds(
    bounds: Rect,
    width: f64,
    height: f64,
    min_zoom: f64,
    max_zoom: f64,
    padding: f64,
) -> Viewport {
    let x_zoom = width / (bounds.width * (1.0 + padding));
    let y_zoom = height / (bounds.height * (1.0 + padding));
    let zoom = x_zoom.min(y_zoom);
    let zoom = if zoom.is_finite() {
        zoom.clamp(min_zoom, max_zoom)
    } else {
        max_zoom
    };

    let center = bounds.center();
    Viewport {
        x: width / 2.0 - center.x * zoom,
        y: height / 2.0 - center.y * zoom,
        zoom,
    }
}

/// Multiplier that keeps strokes legible when zoomed out
pub fn thickness_multiplier(zoom: f64) -> f64 {
    1.0 / zoom - 0.5 + 0.95
}

/// `"{round(zoom * 100)}%"`
pub fn zoom_label(zoom: f64) -> String {
    format!("{}%", (zoom * 100.0).round() as i64)
}
