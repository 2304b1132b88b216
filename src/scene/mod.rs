//! The layer-stack document: what a render draws.

pub mod lenient;
pub mod model;
pub mod stack;

pub use model::{
    FilterContent, FilterRef, FontSpec, FontValue, ImageContent, ImageSize, Layer, LayerContent,
    ShapeContent, ShapeKind, TextContent, Transform,
};
pub use lenient::Lenient;
pub use stack::{LayerId, MAX_SIDE, Stack};
