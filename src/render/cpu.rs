//! Software canvas engine.
//!
//! Each draw is rasterized by `vello_cpu` into a scratch pixmap, then merged onto
//! the premultiplied `f32` surface with the current [`BlendMode`].

use std::path::PathBuf;

use vello_cpu::kurbo::Shape as _;
use vello_cpu::peniko::color::PremulRgba8;

use crate::assets::image::{premultiply, unpremultiply};
use crate::assets::{FileImageSource, ImageHandle, ImageLoader, LoadFuture, RasterImage};
use crate::foundation::core::{Affine, Point, Rect};
use crate::foundation::error::{LaminateError, LaminateResult};
use crate::paint::Paint;
use crate::pixels::PixelBuffer;
use crate::render::canvas::{Canvas, CanvasEngine, TextStyle};
use crate::render::composite::BlendMode;
use crate::render::text::{FontBook, GlyphMode, TextRasterizer};

/// Options for [`CpuEngine::new`].
#[derive(Clone, Debug, Default)]
pub struct CpuEngineOpts {
    /// Directory relative image URLs resolve against.
    pub asset_root: Option<PathBuf>,
    /// Font files registered at startup.
    pub fonts: Vec<PathBuf>,
}

impl CpuEngineOpts {
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    pub fn with_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.fonts.push(path.into());
        self
    }
}

/// Canvas engine backed by [`CpuCanvas`] surfaces and a shared [`ImageLoader`].
#[derive(Clone, Debug)]
pub struct CpuEngine {
    loader: ImageLoader,
    fonts: FontBook,
}

impl Default for CpuEngine {
    fn default() -> Self {
        Self::with_loader(ImageLoader::new(FileImageSource::new()))
    }
}

impl CpuEngine {
    /// Build an engine reading images from disk and registering `opts.fonts`.
    pub fn new(opts: CpuEngineOpts) -> LaminateResult<Self> {
        let source = match opts.asset_root {
            Some(root) => FileImageSource::with_root(root),
            None => FileImageSource::new(),
        };
        let mut engine = Self::with_loader(ImageLoader::new(source));
        for path in &opts.fonts {
            let bytes = std::fs::read(path).map_err(|e| {
                LaminateError::validation(format!("read font {}: {e}", path.display()))
            })?;
            engine.register_font(bytes)?;
        }
        Ok(engine)
    }

    pub fn with_loader(loader: ImageLoader) -> Self {
        Self {
            loader,
            fonts: FontBook::new(),
        }
    }

    pub fn loader(&self) -> &ImageLoader {
        &self.loader
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Register a font file for canvases created afterwards.
    pub fn register_font(&mut self, bytes: Vec<u8>) -> LaminateResult<Vec<String>> {
        self.fonts.register(bytes)
    }
}

impl CanvasEngine for CpuEngine {
    type Surface = CpuCanvas;

    fn create_canvas(&self, width: u32, height: u32) -> CpuCanvas {
        CpuCanvas::with_fonts(width, height, self.fonts.clone())
    }

    fn load_image(&self, url: &str) -> LoadFuture {
        self.loader.load(url)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct DrawState {
    transform: Affine,
    mode: BlendMode,
    alpha: f32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            mode: BlendMode::SourceOver,
            alpha: 1.0,
        }
    }
}

/// In-memory raster surface.
pub struct CpuCanvas {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
    state: DrawState,
    saved: Vec<DrawState>,
    text: TextRasterizer,
    ctx: Option<vello_cpu::RenderContext>,
    scratch: vello_cpu::Pixmap,
}

impl CpuCanvas {
    /// Transparent surface without fonts.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_fonts(width, height, FontBook::new())
    }

    pub fn with_fonts(width: u32, height: u32, fonts: FontBook) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; width as usize * height as usize],
            state: DrawState::default(),
            saved: Vec::new(),
            text: TextRasterizer::new(fonts),
            ctx: None,
            scratch: vello_cpu::Pixmap::new(0, 0),
        }
    }

    /// Current blend mode.
    pub fn blend_mode(&self) -> BlendMode {
        self.state.mode
    }

    /// Current user-to-device transform.
    pub fn transform(&self) -> Affine {
        self.state.transform
    }

    /// Encode the surface as a straight-alpha RGBA image.
    pub fn to_rgba_image(&self) -> LaminateResult<::image::RgbaImage> {
        ::image::RgbaImage::from_raw(self.width, self.height, self.get_pixels().into_raw())
            .ok_or_else(|| LaminateError::render("surface buffer size mismatch"))
    }

    /// Rasterize `draw` with `paint`, the current transform and global alpha,
    /// then merge the result onto the surface with the current blend mode.
    ///
    /// `vello_cpu` renders into a fresh buffer, so every draw goes through the
    /// scratch pixmap. Without a paint nothing is drawn, which still clears
    /// under unbounded modes.
    fn rasterize(
        &mut self,
        paint: Option<vello_cpu::PaintType>,
        draw: impl FnOnce(&mut TextRasterizer, &mut vello_cpu::RenderContext) -> LaminateResult<()>,
    ) -> LaminateResult<()> {
        let unbounded = self.state.mode.is_unbounded();
        if paint.is_none() && !unbounded {
            return Ok(());
        }
        let (Ok(width), Ok(height)) = (u16::try_from(self.width), u16::try_from(self.height)) else {
            tracing::warn!(width = self.width, height = self.height, "canvas too large to draw on");
            return Ok(());
        };
        if width == 0 || height == 0 {
            return Ok(());
        }
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        ctx.set_transform(affine_to_cpu(self.state.transform));

        let drawn = match paint {
            Some(paint) => {
                ctx.set_paint(paint);
                let layered = self.state.alpha < 1.0;
                if layered {
                    ctx.push_opacity_layer(self.state.alpha);
                }
                let drawn = draw(&mut self.text, &mut ctx);
                if layered {
                    ctx.pop_layer();
                }
                drawn
            }
            None => Ok(()),
        };
        ctx.flush();

        if self.scratch.width() == width && self.scratch.height() == height {
            self.scratch.data_mut().fill(PremulRgba8::from_u8_array([0; 4]));
        } else {
            self.scratch = vello_cpu::Pixmap::new(width, height);
        }
        ctx.render_to_pixmap(&mut self.scratch);
        self.ctx = Some(ctx);
        drawn?;

        let mode = self.state.mode;
        for (dst, src) in self.pixels.iter_mut().zip(self.scratch.data()) {
            let src = src.to_u8_array();
            if src[3] == 0 && !unbounded {
                continue;
            }
            *dst = mode.apply(src.map(|c| f32::from(c) / 255.0), *dst);
        }
        Ok(())
    }

    fn fill_path(&mut self, path: vello_cpu::kurbo::BezPath, paint: &Paint) {
        self.rasterize_infallible(to_cpu_paint(paint), |ctx| ctx.fill_path(&path));
    }

    fn stroke_path(&mut self, path: vello_cpu::kurbo::BezPath, paint: &Paint, stroke: vello_cpu::kurbo::Stroke) {
        self.rasterize_infallible(to_cpu_paint(paint), |ctx| {
            ctx.set_stroke(stroke);
            ctx.stroke_path(&path);
        });
    }

    /// [`Self::rasterize`] for shape and image draws, which cannot fail.
    fn rasterize_infallible(
        &mut self,
        paint: Option<vello_cpu::PaintType>,
        draw: impl FnOnce(&mut vello_cpu::RenderContext),
    ) {
        let res = self.rasterize(paint, |_, ctx| {
            draw(ctx);
            Ok(())
        });
        debug_assert!(res.is_ok());
    }

    fn draw_text(
        &mut self,
        text: &str,
        at: Point,
        paint: &Paint,
        style: &TextStyle,
        mode: GlyphMode,
    ) -> LaminateResult<()> {
        self.rasterize(to_cpu_paint(paint), |raster, ctx| raster.draw(ctx, text, at, style, mode))
    }
}

impl std::fmt::Debug for CpuCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuCanvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("state", &self.state)
            .field("saved", &self.saved.len())
            .finish_non_exhaustive()
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

/// `vello_cpu` paint for `paint`, or `None` when it paints nothing.
fn to_cpu_paint(paint: &Paint) -> Option<vello_cpu::PaintType> {
    match paint {
        Paint::Solid(c) => Some(c.to_peniko().into()),
        Paint::Linear(g) => match g.stops.as_slice() {
            [] => None,
            _ if g.is_degenerate() => None,
            [only] => Some(only.color.to_peniko().into()),
            stops => {
                let stops: Vec<(f32, vello_cpu::peniko::Color)> = stops
                    .iter()
                    .map(|s| (s.offset as f32, s.color.to_peniko()))
                    .collect();
                let gradient = vello_cpu::peniko::Gradient::new_linear(
                    (g.start.x, g.start.y),
                    (g.end.x, g.end.y),
                )
                .with_stops(stops.as_slice());
                Some(gradient.into())
            }
        },
    }
}

impl Canvas for CpuCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) {
        tracing::trace!(width, height, "resize cpu canvas");
        self.width = width;
        self.height = height;
        self.pixels = vec![[0.0; 4]; width as usize * height as usize];
        self.state = DrawState::default();
        self.saved.clear();
    }

    fn clear(&mut self) {
        self.pixels.fill([0.0; 4]);
    }

    fn save(&mut self) {
        self.saved.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.state.mode = mode;
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        if alpha.is_finite() {
            self.state.alpha = alpha.clamp(0.0, 1.0) as f32;
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.state.transform *= Affine::translate((dx, dy));
    }

    fn rotate(&mut self, radians: f64) {
        self.state.transform *= Affine::rotate(radians);
    }

    fn draw_image(&mut self, image: &ImageHandle, dest: Rect) {
        let dest = dest.abs();
        if dest.width() <= 0.0 || dest.height() <= 0.0 {
            return;
        }
        let Some(texture) = image.paint() else {
            return;
        };
        let (iw, ih) = (f64::from(image.width()), f64::from(image.height()));
        let placement = Affine::translate((dest.x0, dest.y0))
            * Affine::scale_non_uniform(dest.width() / iw, dest.height() / ih);
        let transform = self.state.transform;
        self.state.transform = transform * placement;
        self.rasterize_infallible(Some(texture.into()), |ctx| {
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
        });
        self.state.transform = transform;
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        let rect = rect_to_cpu(rect.abs());
        let paint = to_cpu_paint(paint);
        self.rasterize_infallible(paint, |ctx| ctx.fill_rect(&rect));
    }

    fn fill_ellipse(&mut self, bounds: Rect, paint: &Paint) {
        let ellipse = vello_cpu::kurbo::Ellipse::from_rect(rect_to_cpu(bounds.abs()));
        self.fill_path(ellipse.to_path(0.1), paint);
    }

    fn stroke_rect(&mut self, rect: Rect, paint: &Paint, line_width: f64) {
        if line_width.is_nan() || line_width <= 0.0 {
            return;
        }
        let path = rect_to_cpu(rect.abs()).to_path(0.1);
        let stroke = vello_cpu::kurbo::Stroke::new(line_width).with_join(vello_cpu::kurbo::Join::Miter);
        self.stroke_path(path, paint, stroke);
    }

    fn stroke_ellipse(&mut self, bounds: Rect, paint: &Paint, line_width: f64) {
        if line_width.is_nan() || line_width <= 0.0 {
            return;
        }
        let path = vello_cpu::kurbo::Ellipse::from_rect(rect_to_cpu(bounds.abs())).to_path(0.1);
        self.stroke_path(path, paint, vello_cpu::kurbo::Stroke::new(line_width));
    }

    fn fill_text(&mut self, text: &str, at: Point, paint: &Paint, style: &TextStyle) -> LaminateResult<()> {
        self.draw_text(text, at, paint, style, GlyphMode::Fill)
    }

    fn stroke_text(&mut self, text: &str, at: Point, paint: &Paint, style: &TextStyle) -> LaminateResult<()> {
        self.draw_text(
            text,
            at,
            paint,
            style,
            GlyphMode::Stroke {
                width: style.line_width,
            },
        )
    }

    fn get_pixels(&self) -> PixelBuffer {
        let mut buf = PixelBuffer::new(self.width, self.height);
        for (dst, src) in buf.data_mut().chunks_exact_mut(4).zip(&self.pixels) {
            dst.copy_from_slice(&unpremultiply(*src));
        }
        buf
    }

    fn put_pixels(&mut self, pixels: &PixelBuffer) -> LaminateResult<()> {
        if pixels.width() != self.width || pixels.height() != self.height {
            return Err(LaminateError::render(format!(
                "put_pixels expects {}x{}, got {}x{}",
                self.width,
                self.height,
                pixels.width(),
                pixels.height()
            )));
        }
        for (dst, src) in self.pixels.iter_mut().zip(pixels.data().chunks_exact(4)) {
            *dst = premultiply([src[0], src[1], src[2], src[3]]);
        }
        Ok(())
    }

    fn snapshot(&self) -> ImageHandle {
        std::sync::Arc::new(RasterImage::from_premul(self.width, self.height, &self.pixels))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
