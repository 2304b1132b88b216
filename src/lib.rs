//! Laminate composites a declarative stack of layers into one raster image.
//!
//! A [`Stack`] is plain data (usually JSON): a canvas size and an ordered list of
//! image, shape, text, fill, filter and group layers. The [`Compositor`] walks it
//! through a [`CanvasEngine`]; [`CpuEngine`] is the bundled software engine.
//!
//! ```no_run
//! use laminate::{Compositor, CpuEngine, Stack};
//!
//! # fn main() -> laminate::LaminateResult<()> {
//! let stack = Stack::from_json_str(r##"{"width": 64, "height": 64, "layers": [{"fill": "#336"}]}"##)?;
//! let compositor = Compositor::new(CpuEngine::default());
//! let rendered = pollster::block_on(compositor.render(&stack))?;
//! let png = rendered.surface.to_rgba_image()?;
//! # let _ = png;
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

pub mod assets;
pub mod effects;
pub mod foundation;
pub mod geometry;
pub mod paint;
pub mod pixels;
pub mod render;
pub mod scene;

pub use crate::assets::{
    FileImageSource, ImageHandle, ImageLoader, ImageSource, MemoryImageSource, RasterImage,
};
pub use crate::effects::{Filter, FilterOptions, FilterRegistry};
pub use crate::foundation::core::{Affine, Point, Rect, Size, Vec2};
pub use crate::foundation::error::{AssetError, LaminateError, LaminateResult};
pub use crate::geometry::{Dimension, Keyword, PlacementSpec, place_rect};
pub use crate::paint::{Color, FillSpec, Paint, resolve_fill};
pub use crate::pixels::PixelBuffer;
pub use crate::render::{
    BlendMode, Canvas, CanvasEngine, Compositor, CompositorOpts, CpuCanvas, CpuEngine, CpuEngineOpts,
    RenderWarning, Rendered, WarningKind,
};
pub use crate::scene::{Layer, LayerContent, LayerId, Stack};
