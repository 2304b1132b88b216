//! The drawing-surface port the compositor renders through.

use serde::{Deserialize, Serialize};

use crate::assets::{ImageHandle, LoadFuture};
use crate::foundation::core::{Point, Rect};
use crate::foundation::error::LaminateResult;
use crate::paint::Paint;
use crate::pixels::PixelBuffer;
use crate::render::composite::BlendMode;

/// Horizontal text anchor, as in the canvas `textAlign` property.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Right,
    #[default]
    Center,
    Start,
    End,
}

/// Vertical text anchor, as in the canvas `textBaseline` property.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextBaseline {
    Top,
    Hanging,
    #[default]
    Middle,
    Alphabetic,
    Ideographic,
    Bottom,
}

/// Stroke corner style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Text drawing state.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// CSS font shorthand: `"{weight} {size} {family}"`.
    pub font: String,
    pub align: TextAlign,
    pub baseline: TextBaseline,
    pub line_width: f64,
    pub line_join: LineJoin,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: "normal 12px sans-serif".to_owned(),
            align: TextAlign::default(),
            baseline: TextBaseline::default(),
            line_width: 1.0,
            line_join: LineJoin::default(),
        }
    }
}

/// A 2D drawing surface with canvas-style state.
///
/// Drawing state (blend mode, global alpha, transform) is pushed by
/// [`save`](Canvas::save) and popped by [`restore`](Canvas::restore); pixels
/// are not part of the saved state.
pub trait Canvas: Send {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Resize the surface. Content is cleared and state reset.
    fn resize(&mut self, width: u32, height: u32);

    /// Set every pixel to transparent black. Drawing state is kept.
    fn clear(&mut self);

    fn save(&mut self);
    fn restore(&mut self);

    fn set_blend_mode(&mut self, mode: BlendMode);
    /// Alpha multiplied into every draw, clamped to `0..=1`.
    fn set_global_alpha(&mut self, alpha: f64);

    fn translate(&mut self, dx: f64, dy: f64);
    /// Rotate the user space by `radians`, clockwise on screen.
    fn rotate(&mut self, radians: f64);

    /// Draw `image` scaled into `dest`.
    fn draw_image(&mut self, image: &ImageHandle, dest: Rect);
    fn fill_rect(&mut self, rect: Rect, paint: &Paint);
    /// Fill the ellipse inscribed in `bounds`.
    fn fill_ellipse(&mut self, bounds: Rect, paint: &Paint);
    fn stroke_rect(&mut self, rect: Rect, paint: &Paint, line_width: f64);
    fn stroke_ellipse(&mut self, bounds: Rect, paint: &Paint, line_width: f64);

    /// Fill `text` anchored at `at`. Fails when no font can render it.
    fn fill_text(&mut self, text: &str, at: Point, paint: &Paint, style: &TextStyle) -> LaminateResult<()>;
    /// Stroke the outline of `text` anchored at `at`.
    fn stroke_text(&mut self, text: &str, at: Point, paint: &Paint, style: &TextStyle) -> LaminateResult<()>;

    /// Straight-alpha copy of the whole surface.
    fn get_pixels(&self) -> PixelBuffer;
    /// Replace the surface pixels, ignoring drawing state. Sizes must match.
    fn put_pixels(&mut self, pixels: &PixelBuffer) -> LaminateResult<()>;

    /// Immutable image of the current content.
    fn snapshot(&self) -> ImageHandle;
}

/// Factory for surfaces plus the image-loading port.
pub trait CanvasEngine: Send + Sync {
    type Surface: Canvas;

    fn create_canvas(&self, width: u32, height: u32) -> Self::Surface;

    /// Load (or reuse) the image at `url`.
    fn load_image(&self, url: &str) -> LoadFuture;
}
