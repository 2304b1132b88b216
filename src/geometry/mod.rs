//! Mixed-unit coordinates and the placement primitive shared by every layer kind.

pub mod dimension;
pub mod placement;

pub use dimension::{Axis, Dimension, Keyword};
pub use placement::{PlacementSpec, RectSpec, place_rect, resolve_point, resolve_rect};
