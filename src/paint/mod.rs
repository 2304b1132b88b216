pub mod color;
pub mod fill;

pub use color::{Color, ColorParseError};
pub use fill::{ColorStop, FillSpec, GradientSpec, GradientStop, LinearGradient, Paint, resolve_fill};
