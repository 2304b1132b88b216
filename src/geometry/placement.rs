use serde::{Deserialize, Serialize};

use crate::foundation::core::{Point, Rect, Size};
use crate::geometry::dimension::{Axis, Dimension};

/// A point authored per axis, e.g. `{ "x": "left", "y": "90%" }`.
///
/// Missing axes are [`Dimension::Auto`] and resolve to the midpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementSpec {
    /// Horizontal coordinate.
    #[serde(default, skip_serializing_if = "Dimension::is_auto")]
    pub x: Dimension,
    /// Vertical coordinate.
    #[serde(default, skip_serializing_if = "Dimension::is_auto")]
    pub y: Dimension,
}

impl PlacementSpec {
    /// Build from explicit per-axis dimensions.
    pub fn new(x: Dimension, y: Dimension) -> Self {
        Self { x, y }
    }

    /// Resolve to a point relative to the origin of an area of size `extent`.
    pub fn resolve(&self, extent: Size) -> Point {
        Point::new(
            self.x.resolve(Axis::X, extent.width),
            self.y.resolve(Axis::Y, extent.height),
        )
    }
}

/// Rectangle as authored: either origin + size or two corners.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RectSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y2: Option<f64>,
}

/// Normalize a [`RectSpec`] into a rectangle with non-negative size.
///
/// An explicit width/height wins over the matching corner; a corner pair given in
/// reverse order is swapped so the origin is always the min corner.
pub fn resolve_rect(spec: &RectSpec) -> Rect {
    let (x, width) = resolve_span(spec.x.unwrap_or(0.0), spec.width, spec.x2);
    let (y, height) = resolve_span(spec.y.unwrap_or(0.0), spec.height, spec.y2);
    Rect::from_origin_size((x, y), (width, height))
}

fn resolve_span(start: f64, len: Option<f64>, end: Option<f64>) -> (f64, f64) {
    match (len, end) {
        (Some(len), end) => {
            let start = end.map_or(start, |e| start.min(e));
            if len < 0.0 {
                (start + len, -len)
            } else {
                (start, len)
            }
        }
        (None, Some(end)) => (start.min(end), (end - start).abs()),
        (None, None) => (start, 0.0),
    }
}

/// Top-left corner at which a box of size `inner` is drawn inside `outer`.
///
/// `position` picks a point in `outer` (percentages of the outer size) and
/// `anchor` picks the point of the inner box that lands there (percentages of
/// the inner size). Both default to the respective centers.
pub fn place_rect(
    inner: Size,
    outer: Rect,
    position: Option<&PlacementSpec>,
    anchor: Option<&PlacementSpec>,
) -> Point {
    let position = position.copied().unwrap_or_default().resolve(outer.size());
    let anchor = anchor.copied().unwrap_or_default().resolve(inner);
    Point::new(
        outer.x0 + position.x - anchor.x,
        outer.y0 + position.y - anchor.y,
    )
}

/// Resolve a point inside `target`, falling back to `default` when unset.
pub fn resolve_point(target: Rect, spec: Option<&PlacementSpec>, default: PlacementSpec) -> Point {
    let local = spec.copied().unwrap_or(default).resolve(target.size());
    Point::new(target.x0 + local.x, target.y0 + local.y)
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/placement.rs"]
mod tests;
