use serde::{Deserialize, Serialize};

use crate::foundation::core::{Point, Rect};
use crate::geometry::{Dimension, Keyword, PlacementSpec, resolve_point};
use crate::paint::color::{Color, ColorParseError};

/// A fill as authored: a CSS color string or `{ "gradient": {...} }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillSpec {
    Color(String),
    Gradient { gradient: GradientSpec },
}

impl FillSpec {
    pub fn color(c: impl Into<String>) -> Self {
        Self::Color(c.into())
    }
}

impl From<&str> for FillSpec {
    fn from(c: &str) -> Self {
        Self::Color(c.to_owned())
    }
}

/// Linear gradient as authored. `start`/`end` are points inside the target rect.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GradientSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<PlacementSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<PlacementSpec>,
    #[serde(default)]
    pub colors: Vec<ColorStop>,
}

/// One `colors` entry: a bare color, spread evenly, or `[fraction, color]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorStop {
    Plain(String),
    At(f64, String),
}

/// Resolved gradient stop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Color,
}

/// Linear gradient in the coordinate space of the layer being drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearGradient {
    pub start: Point,
    pub end: Point,
    /// Sorted by offset; equal offsets keep insertion order.
    pub stops: Vec<GradientStop>,
}

impl LinearGradient {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            stops: Vec::new(),
        }
    }

    /// Insert a stop, keeping the list ordered. `offset` is clamped to `0..=1`.
    pub fn add_stop(&mut self, offset: f64, color: Color) {
        let offset = if offset.is_nan() { 0.0 } else { offset.clamp(0.0, 1.0) };
        let at = self.stops.partition_point(|s| s.offset <= offset);
        self.stops.insert(at, GradientStop { offset, color });
    }

    /// Whether start and end coincide; such a gradient paints nothing.
    pub fn is_degenerate(&self) -> bool {
        (self.end - self.start).hypot2() == 0.0
    }
}

/// A drawable paint.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Solid(Color),
    Linear(LinearGradient),
}

impl Paint {
    /// Solid paint from a CSS color string.
    pub fn parse_solid(s: &str) -> Result<Self, ColorParseError> {
        s.parse().map(Self::Solid)
    }
}

/// Resolve `spec` against `target` into a paint.
///
/// Gradient endpoints default to the top center and bottom center of `target`.
/// Plain color entries sit at `i / (n - 1)`, a lone plain entry at 0; explicit
/// `[fraction, color]` entries keep their fraction.
pub fn resolve_fill(target: Rect, spec: &FillSpec) -> Result<Paint, ColorParseError> {
    let gradient = match spec {
        FillSpec::Color(c) => return Paint::parse_solid(c),
        FillSpec::Gradient { gradient } => gradient,
    };

    let top = PlacementSpec::new(Dimension::Auto, Dimension::Keyword(Keyword::Top));
    let bottom = PlacementSpec::new(Dimension::Auto, Dimension::Keyword(Keyword::Bottom));
    let start = resolve_point(target, gradient.start.as_ref(), top);
    let end = resolve_point(target, gradient.end.as_ref(), bottom);

    let mut linear = LinearGradient::new(start, end);
    let n = gradient.colors.len();
    for (i, stop) in gradient.colors.iter().enumerate() {
        match stop {
            ColorStop::Plain(c) => {
                let offset = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
                linear.add_stop(offset, c.parse()?);
            }
            ColorStop::At(offset, c) => linear.add_stop(*offset, c.parse()?),
        }
    }
    Ok(Paint::Linear(linear))
}

#[cfg(test)]
#[path = "../../tests/unit/paint/fill.rs"]
mod tests;
