use futures::FutureExt as _;
use futures::future::BoxFuture;

use crate::effects::FilterRegistry;
use crate::foundation::core::{Rect, Size};
use crate::foundation::error::{AssetError, LaminateResult};
use crate::geometry::place_rect;
use crate::paint::{FillSpec, Paint, resolve_fill};
use crate::render::canvas::{Canvas, CanvasEngine, LineJoin, TextStyle};
use crate::scene::{
    FilterContent, FilterRef, ImageContent, ImageSize, Layer, LayerContent, ShapeContent, ShapeKind, Stack,
    TextContent,
};

/// Compositor tuning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositorOpts {
    /// Groups nested deeper than this are skipped with a warning.
    pub max_group_depth: usize,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self { max_group_depth: 32 }
    }
}

impl CompositorOpts {
    /// Defaults overridden by `LAMINATE_MAX_GROUP_DEPTH` when it holds a number.
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        if let Some(depth) = std::env::var("LAMINATE_MAX_GROUP_DEPTH")
            .ok()
            .and_then(|v| v.trim().parse().ok())
        {
            opts.max_group_depth = depth;
        }
        opts
    }

    pub fn with_max_group_depth(mut self, depth: usize) -> Self {
        self.max_group_depth = depth;
        self
    }
}

/// What went wrong with one layer of an otherwise successful render.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum WarningKind {
    #[error("{error}")]
    AssetLoad { url: String, error: AssetError },
    #[error("unknown filter '{name}'")]
    UnknownFilter { name: String },
    #[error("filter failed: {message}")]
    FilterFailed { message: String },
    #[error("invalid paint: {message}")]
    InvalidPaint { message: String },
    #[error("group nesting depth {depth} exceeds the limit")]
    GroupDepthExceeded { depth: usize },
    #[error("text unavailable: {message}")]
    TextUnavailable { message: String },
    /// The layer drew with the field's default instead.
    #[error("invalid {field} {value}, using the default")]
    InvalidValue { field: &'static str, value: String },
}

/// A recovered per-layer failure. The layer was skipped (or partly drawn) and
/// the render carried on.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("layer {}: {kind}", describe_layer(.path, .name))]
pub struct RenderWarning {
    /// Layer indices from the stack root through enclosing groups.
    pub path: Vec<usize>,
    pub name: Option<String>,
    pub kind: WarningKind,
}

fn describe_layer(path: &[usize], name: &Option<String>) -> String {
    let path = path.iter().map(usize::to_string).collect::<Vec<_>>().join("/");
    match name {
        Some(name) => format!("{path} ({name})"),
        None => path,
    }
}

/// A finished surface plus the warnings collected while drawing it.
#[derive(Debug)]
pub struct Rendered<S> {
    pub surface: S,
    pub warnings: Vec<RenderWarning>,
}

/// Walks a [`Stack`] and draws it through a [`CanvasEngine`].
pub struct Compositor<E: CanvasEngine> {
    engine: E,
    filters: FilterRegistry,
    opts: CompositorOpts,
}

struct Scope<'a> {
    path: Vec<usize>,
    depth: usize,
    warnings: &'a mut Vec<RenderWarning>,
}

impl Scope<'_> {
    fn warn(&mut self, layer: &Layer, index: usize, kind: WarningKind) {
        let mut path = self.path.clone();
        path.push(index);
        let warning = RenderWarning {
            path,
            name: layer.name.clone(),
            kind,
        };
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }
}

impl<E: CanvasEngine> Compositor<E> {
    /// Compositor with the built-in filters and default options.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            filters: FilterRegistry::with_builtins(),
            opts: CompositorOpts::default(),
        }
    }

    pub fn with_filters(mut self, filters: FilterRegistry) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_opts(mut self, opts: CompositorOpts) -> Self {
        self.opts = opts;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterRegistry {
        &mut self.filters
    }

    pub fn opts(&self) -> &CompositorOpts {
        &self.opts
    }

    /// Render `stack` onto a fresh surface.
    #[tracing::instrument(skip_all, fields(width = stack.width, height = stack.height))]
    pub async fn render(&self, stack: &Stack) -> LaminateResult<Rendered<E::Surface>> {
        stack.validate()?;
        let mut surface = self.engine.create_canvas(stack.width, stack.height);
        let warnings = self.render_into(stack, &mut surface).await?;
        Ok(Rendered { surface, warnings })
    }

    /// Render `stack` onto an existing surface, resizing it only when its
    /// dimensions differ.
    #[tracing::instrument(skip_all, fields(width = stack.width, height = stack.height))]
    pub async fn render_into(
        &self,
        stack: &Stack,
        surface: &mut E::Surface,
    ) -> LaminateResult<Vec<RenderWarning>> {
        stack.validate()?;
        if surface.width() != stack.width || surface.height() != stack.height {
            tracing::debug!(
                from_w = surface.width(),
                from_h = surface.height(),
                "resizing surface"
            );
            surface.resize(stack.width, stack.height);
        }
        surface.clear();

        let mut warnings = Vec::new();
        let scope = Scope {
            path: Vec::new(),
            depth: 0,
            warnings: &mut warnings,
        };
        self.render_layers(&stack.layers, stack.size(), surface, scope).await;
        Ok(warnings)
    }

    /// Draw `layers` bottom-up (last index first) onto `surface`.
    fn render_layers<'a>(
        &'a self,
        layers: &'a [Layer],
        size: Size,
        surface: &'a mut E::Surface,
        mut scope: Scope<'a>,
    ) -> BoxFuture<'a, ()> {
        async move {
            for (index, layer) in layers.iter().enumerate().rev() {
                if layer.disabled {
                    tracing::trace!(index, "skipping disabled layer");
                    continue;
                }
                tracing::debug!(index, kind = layer.content.kind(), name = ?layer.name, "drawing layer");
                for (field, raw) in layer.invalid_fields() {
                    let value = raw.to_string();
                    scope.warn(layer, index, WarningKind::InvalidValue { field, value });
                }

                surface.save();
                surface.set_blend_mode(layer.blend_mode());
                surface.set_global_alpha(layer.alpha());
                if let Some(t) = layer.transform {
                    surface.translate(t.x, t.y);
                    if t.rotate != 0.0 {
                        let center = size.to_rect().center();
                        surface.translate(center.x, center.y);
                        surface.rotate(t.rotate.to_radians());
                        surface.translate(-center.x, -center.y);
                    }
                }

                match &layer.content {
                    LayerContent::Image(image) => {
                        self.draw_image(image, size, surface, layer, index, &mut scope)
                            .await;
                    }
                    LayerContent::Filter(filter) => {
                        self.apply_filter(filter, surface, layer, index, &mut scope)
                            .await;
                    }
                    LayerContent::Group(children) => {
                        self.draw_group(children, size, surface, layer, index, &mut scope)
                            .await;
                    }
                    LayerContent::Text(text) => {
                        draw_text(text, size, surface, layer, index, &mut scope);
                    }
                    LayerContent::Shape(shape) => {
                        draw_shape(shape, size, surface, layer, index, &mut scope);
                    }
                    LayerContent::Fill(fill) => {
                        let rect = size.to_rect();
                        if let Some(paint) = paint_or_warn(rect, fill, layer, index, &mut scope) {
                            surface.fill_rect(rect, &paint);
                        }
                    }
                    LayerContent::Empty => {}
                }

                surface.restore();
            }
        }
        .boxed()
    }

    async fn draw_image(
        &self,
        image: &ImageContent,
        canvas: Size,
        surface: &mut E::Surface,
        layer: &Layer,
        index: usize,
        scope: &mut Scope<'_>,
    ) {
        let mut handle = None;
        if let Some(url) = &image.url {
            match self.engine.load_image(url).await {
                Ok(h) => handle = Some(h),
                Err(error) => scope.warn(
                    layer,
                    index,
                    WarningKind::AssetLoad {
                        url: url.clone(),
                        error,
                    },
                ),
            }
        }
        let Some(handle) = handle.or_else(|| image.source.clone()) else {
            return;
        };

        let size = ImageSize::resolve(image.size.as_ref(), handle.size(), canvas);
        if !(size.width.is_finite() && size.height.is_finite()) {
            tracing::trace!(index, "degenerate image size");
            return;
        }
        let origin = place_rect(size, canvas.to_rect(), image.position.as_ref(), image.anchor.as_ref());
        surface.draw_image(&handle, Rect::from_origin_size(origin, size));
    }

    async fn apply_filter(
        &self,
        content: &FilterContent,
        surface: &mut E::Surface,
        layer: &Layer,
        index: usize,
        scope: &mut Scope<'_>,
    ) {
        let filter = match &content.filter {
            FilterRef::Named(name) => self.filters.get(name),
            FilterRef::Direct(filter) => Some(filter.clone()),
            FilterRef::Invalid(_) => None,
        };
        let Some(filter) = filter else {
            scope.warn(
                layer,
                index,
                WarningKind::UnknownFilter {
                    name: content.filter.to_string(),
                },
            );
            return;
        };

        let input = surface.get_pixels();
        let (w, h) = (input.width(), input.height());
        let message = match filter.apply(input, &content.options).await {
            Ok(out) if out.width() == w && out.height() == h => match surface.put_pixels(&out) {
                Ok(()) => return,
                Err(e) => e.to_string(),
            },
            Ok(out) => format!(
                "filter returned a {}x{} buffer for a {w}x{h} surface",
                out.width(),
                out.height()
            ),
            Err(e) => e.to_string(),
        };
        scope.warn(layer, index, WarningKind::FilterFailed { message });
    }

    async fn draw_group(
        &self,
        children: &[Layer],
        size: Size,
        surface: &mut E::Surface,
        layer: &Layer,
        index: usize,
        scope: &mut Scope<'_>,
    ) {
        let depth = scope.depth + 1;
        if depth > self.opts.max_group_depth {
            scope.warn(layer, index, WarningKind::GroupDepthExceeded { depth });
            return;
        }

        let mut path = scope.path.clone();
        path.push(index);
        let mut group = self.engine.create_canvas(surface.width(), surface.height());
        let inner = Scope {
            path,
            depth,
            warnings: &mut *scope.warnings,
        };
        self.render_layers(children, size, &mut group, inner).await;
        surface.draw_image(&group.snapshot(), size.to_rect());
    }
}

fn paint_or_warn(
    target: Rect,
    spec: &FillSpec,
    layer: &Layer,
    index: usize,
    scope: &mut Scope<'_>,
) -> Option<Paint> {
    match resolve_fill(target, spec) {
        Ok(paint) => Some(paint),
        Err(e) => {
            scope.warn(
                layer,
                index,
                WarningKind::InvalidPaint {
                    message: e.to_string(),
                },
            );
            None
        }
    }
}

fn draw_text<C: Canvas>(
    text: &TextContent,
    size: Size,
    surface: &mut C,
    layer: &Layer,
    index: usize,
    scope: &mut Scope<'_>,
) {
    let canvas = size.to_rect();
    let Some(fill) = paint_or_warn(canvas, &text.fill_spec(), layer, index, scope) else {
        return;
    };
    let stroke = match &text.stroke {
        Some(spec) => match paint_or_warn(canvas, spec, layer, index, scope) {
            Some(paint) => Some(paint),
            None => return,
        },
        None => None,
    };

    let style = TextStyle {
        font: text.font.css(),
        align: text.text_align(),
        baseline: text.baseline(),
        line_width: text.stroke_width.unwrap_or(1.0),
        line_join: LineJoin::Round,
    };
    let at = place_rect(Size::ZERO, canvas, text.position.as_ref(), None);

    let mut drawn = Ok(());
    if let Some(stroke) = &stroke {
        drawn = surface.stroke_text(&text.text, at, stroke, &style);
    }
    if drawn.is_ok() {
        drawn = surface.fill_text(&text.text, at, &fill, &style);
    }
    if let Err(e) = drawn {
        scope.warn(
            layer,
            index,
            WarningKind::TextUnavailable {
                message: e.to_string(),
            },
        );
    }
}

fn draw_shape<C: Canvas>(
    shape: &ShapeContent,
    canvas: Size,
    surface: &mut C,
    layer: &Layer,
    index: usize,
    scope: &mut Scope<'_>,
) {
    let size = shape.resolve_size(canvas);
    let origin = place_rect(size, canvas.to_rect(), shape.position.as_ref(), shape.anchor.as_ref());
    let rect = Rect::from_origin_size(origin, size);

    let black = FillSpec::color("#000");
    let Some(fill) = paint_or_warn(rect, shape.fill_spec().unwrap_or(&black), layer, index, scope) else {
        return;
    };
    let kind = shape.shape_kind();
    match kind {
        ShapeKind::Rect => surface.fill_rect(rect, &fill),
        ShapeKind::Ellipse => surface.fill_ellipse(rect, &fill),
    }

    let Some(spec) = &shape.stroke else {
        return;
    };
    let Some(stroke) = paint_or_warn(rect, spec, layer, index, scope) else {
        return;
    };
    let width = shape.stroke_width.unwrap_or(1.0);
    match kind {
        ShapeKind::Rect => surface.stroke_rect(rect, &stroke, width),
        ShapeKind::Ellipse => surface.stroke_ellipse(rect, &stroke, width),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
