use std::sync::Arc;

use super::*;
use crate::assets::{ImageHandle, ImageLoader, LoadFuture, MemoryImageSource, RasterImage};
use crate::effects::FilterOptions;
use crate::foundation::core::Point;
use crate::geometry::{Dimension, PlacementSpec};
use crate::pixels::{PixelBuffer, get_pixel};
use crate::render::composite::BlendMode;
use crate::render::cpu::{CpuCanvas, CpuEngine};
use crate::scene::Transform;

/// Surface that logs every call and keeps real pixels in a [`CpuCanvas`].
struct Recorder {
    ops: Vec<String>,
    inner: CpuCanvas,
}

impl Canvas for Recorder {
    fn width(&self) -> u32 {
        self.inner.width()
    }
    fn height(&self) -> u32 {
        self.inner.height()
    }
    fn resize(&mut self, width: u32, height: u32) {
        self.ops.push(format!("resize {width}x{height}"));
        self.inner.resize(width, height);
    }
    fn clear(&mut self) {
        self.ops.push("clear".to_owned());
        self.inner.clear();
    }
    fn save(&mut self) {
        self.ops.push("save".to_owned());
        self.inner.save();
    }
    fn restore(&mut self) {
        self.ops.push("restore".to_owned());
        self.inner.restore();
    }
    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.ops.push(format!("mode {mode}"));
        self.inner.set_blend_mode(mode);
    }
    fn set_global_alpha(&mut self, alpha: f64) {
        self.ops.push(format!("alpha {alpha}"));
        self.inner.set_global_alpha(alpha);
    }
    fn translate(&mut self, dx: f64, dy: f64) {
        self.ops.push(format!("translate {dx} {dy}"));
        self.inner.translate(dx, dy);
    }
    fn rotate(&mut self, radians: f64) {
        self.ops.push(format!("rotate {:.4}", radians));
        self.inner.rotate(radians);
    }
    fn draw_image(&mut self, image: &ImageHandle, dest: Rect) {
        self.ops.push(format!(
            "image {}x{} -> {} {} {} {}",
            image.width(),
            image.height(),
            dest.x0,
            dest.y0,
            dest.width(),
            dest.height()
        ));
        self.inner.draw_image(image, dest);
    }
    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        self.ops.push(format!("fill_rect {} {} {} {}", rect.x0, rect.y0, rect.width(), rect.height()));
        self.inner.fill_rect(rect, paint);
    }
    fn fill_ellipse(&mut self, bounds: Rect, paint: &Paint) {
        self.ops.push(format!(
            "fill_ellipse {} {} {} {}",
            bounds.x0,
            bounds.y0,
            bounds.width(),
            bounds.height()
        ));
        self.inner.fill_ellipse(bounds, paint);
    }
    fn stroke_rect(&mut self, rect: Rect, paint: &Paint, line_width: f64) {
        self.ops.push(format!("stroke_rect {line_width}"));
        self.inner.stroke_rect(rect, paint, line_width);
    }
    fn stroke_ellipse(&mut self, bounds: Rect, paint: &Paint, line_width: f64) {
        self.ops.push(format!("stroke_ellipse {line_width}"));
        self.inner.stroke_ellipse(bounds, paint, line_width);
    }
    fn fill_text(&mut self, text: &str, at: Point, _paint: &Paint, style: &TextStyle) -> LaminateResult<()> {
        self.ops.push(format!(
            "fill_text {text} @{} {} [{}] {:?}/{:?}",
            at.x, at.y, style.font, style.align, style.baseline
        ));
        Ok(())
    }
    fn stroke_text(&mut self, text: &str, at: Point, _paint: &Paint, style: &TextStyle) -> LaminateResult<()> {
        self.ops.push(format!("stroke_text {text} @{} {} w{}", at.x, at.y, style.line_width));
        Ok(())
    }
    fn get_pixels(&self) -> PixelBuffer {
        self.inner.get_pixels()
    }
    fn put_pixels(&mut self, pixels: &PixelBuffer) -> LaminateResult<()> {
        self.ops.push("put_pixels".to_owned());
        self.inner.put_pixels(pixels)
    }
    fn snapshot(&self) -> ImageHandle {
        self.inner.snapshot()
    }
}

struct RecordingEngine {
    loader: ImageLoader,
}

impl RecordingEngine {
    fn new() -> Self {
        let source = MemoryImageSource::new()
            .with_image("wide.png", RasterImage::solid(800, 400, [0, 0, 255, 255]))
            .with_image("dot.png", RasterImage::solid(2, 2, [255, 0, 0, 255]));
        Self {
            loader: ImageLoader::new(source),
        }
    }
}

impl CanvasEngine for RecordingEngine {
    type Surface = Recorder;

    fn create_canvas(&self, width: u32, height: u32) -> Recorder {
        Recorder {
            ops: Vec::new(),
            inner: CpuCanvas::new(width, height),
        }
    }

    fn load_image(&self, url: &str) -> LoadFuture {
        self.loader.load(url)
    }
}

fn record(stack: &Stack) -> (Vec<String>, Vec<RenderWarning>) {
    let compositor = Compositor::new(RecordingEngine::new());
    let out = pollster::block_on(compositor.render(stack)).unwrap();
    (out.surface.ops, out.warnings)
}

fn draws(ops: &[String]) -> Vec<&str> {
    ops.iter()
        .map(String::as_str)
        .filter(|op| {
            !matches!(*op, "save" | "restore" | "clear")
                && !op.starts_with("mode ")
                && !op.starts_with("alpha ")
        })
        .collect()
}

#[test]
fn layers_draw_bottom_up() {
    let stack = Stack::new(10, 10)
        .with_layer(Layer::shape(ShapeContent::rect(Dimension::Absolute(2.0), Dimension::Absolute(2.0))))
        .with_layer(Layer::fill("red"));
    let (ops, warnings) = record(&stack);
    assert!(warnings.is_empty());
    assert_eq!(draws(&ops), vec!["fill_rect 0 0 10 10", "fill_rect 4 4 2 2"]);
    assert_eq!(ops[0], "clear");
}

#[test]
fn state_is_saved_and_restored_per_layer() {
    let stack = Stack::new(4, 4).with_layer(
        Layer::fill("red")
            .with_mode(BlendMode::Screen)
            .with_opacity(0.0)
            .with_transform(Transform::translate(1.0, 2.0)),
    );
    let (ops, _) = record(&stack);
    assert_eq!(
        ops,
        vec![
            "clear",
            "save",
            "mode screen",
            "alpha 0",
            "translate 1 2",
            "fill_rect 0 0 4 4",
            "restore"
        ]
    );
}

#[test]
fn rotation_pivots_on_the_canvas_center() {
    let stack = Stack::new(10, 20).with_layer(Layer::fill("red").with_transform(Transform::rotate(90.0)));
    let (ops, _) = record(&stack);
    assert_eq!(
        draws(&ops),
        vec![
            "translate 0 0",
            "translate 5 10",
            "rotate 1.5708",
            "translate -5 -10",
            "fill_rect 0 0 10 20"
        ]
    );
}

#[test]
fn disabled_layers_emit_nothing() {
    let stack = Stack::new(4, 4).with_layer(Layer::fill("red").with_disabled(true));
    let (ops, _) = record(&stack);
    assert_eq!(ops, vec!["clear"]);
}

#[test]
fn cover_image_overflows_the_short_axis() {
    let stack = Stack::new(400, 400).with_layer(Layer::image(
        crate::scene::ImageContent::url("wide.png").with_size(ImageSize::Cover),
    ));
    let (ops, warnings) = record(&stack);
    assert!(warnings.is_empty());
    assert_eq!(draws(&ops), vec!["image 800x400 -> -200 0 800 400"]);
}

#[test]
fn image_anchor_and_position() {
    let stack = Stack::new(10, 10).with_layer(Layer::image(
        crate::scene::ImageContent::url("dot.png")
            .with_anchor(PlacementSpec::new(Dimension::Percent(0.0), Dimension::Percent(0.0)))
            .with_position(PlacementSpec::new(Dimension::Absolute(1.0), Dimension::Percent(50.0))),
    ));
    let (ops, _) = record(&stack);
    assert_eq!(draws(&ops), vec!["image 2x2 -> 1 5 2 2"]);
}

#[test]
fn failed_loads_warn_and_fall_back_to_source() {
    let fallback: ImageHandle = Arc::new(RasterImage::solid(1, 1, [0, 255, 0, 255]));
    let mut content = crate::scene::ImageContent::url("missing.png");
    content.source = Some(fallback);
    let stack = Stack::new(4, 4)
        .with_layer(Layer::image(content).with_name("logo"))
        .with_layer(Layer::image(crate::scene::ImageContent::url("also-missing.png")));
    let (ops, warnings) = record(&stack);
    assert_eq!(draws(&ops), vec!["image 1x1 -> 1.5 1.5 1 1"]);
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].path, vec![1]);
    assert_eq!(warnings[1].path, vec![0]);
    assert_eq!(warnings[1].name.as_deref(), Some("logo"));
    assert!(matches!(&warnings[1].kind, WarningKind::AssetLoad { url, .. } if url == "missing.png"));
    assert!(warnings[1].to_string().starts_with("layer 0 (logo): "));
}

#[test]
fn text_strokes_before_filling() {
    let mut text = TextContent::new("Hi");
    text.stroke = Some("white".into());
    text.stroke_width = Some(3.0);
    text.font.size = Some(crate::scene::FontValue::Number(20.0));
    text.position = Some(PlacementSpec::new(Dimension::Absolute(5.0), Dimension::Auto));
    let stack = Stack::new(40, 20).with_layer(Layer::text(text));
    let (ops, _) = record(&stack);
    assert_eq!(
        draws(&ops),
        vec!["stroke_text Hi @5 10 w3", "fill_text Hi @5 10 [normal 20px sans-serif] Center/Middle"]
    );
}

#[test]
fn text_without_stroke_only_fills() {
    let stack = Stack::new(40, 20).with_layer(Layer::text(TextContent::new("Hi")));
    let (ops, _) = record(&stack);
    assert_eq!(draws(&ops), vec!["fill_text Hi @20 10 [normal 12px sans-serif] Center/Middle"]);

    let text = TextContent::new("Hi")
        .with_align(crate::render::canvas::TextAlign::Right)
        .with_vertical_align(crate::render::canvas::TextBaseline::Top);
    let (ops, _) = record(&Stack::new(40, 20).with_layer(Layer::text(text)));
    assert_eq!(draws(&ops), vec!["fill_text Hi @20 10 [normal 12px sans-serif] Right/Top"]);
}

#[test]
fn invalid_values_draw_with_defaults_and_warn() {
    let stack = Stack::from_json_str(
        r##"{"width": 4, "height": 4, "layers": [
            {"name": "odd", "mode": "plus-lighter", "opacity": "0.5",
             "shape": {"type": "circle", "width": 2, "color": "#0f0"}},
            {"text": {"text": "Hi", "align": "justify", "verticalAlign": "baseline"}},
            {"fill": "#00f"}
        ]}"##,
    )
    .unwrap();
    let (ops, warnings) = record(&stack);
    assert_eq!(
        draws(&ops),
        vec![
            "fill_rect 0 0 4 4",
            "fill_text Hi @2 2 [normal 12px sans-serif] Center/Middle",
            "fill_rect 1 1 2 2"
        ]
    );
    assert!(ops.ends_with(&[
        "save".to_owned(),
        "mode source-over".to_owned(),
        "alpha 1".to_owned(),
        "fill_rect 1 1 2 2".to_owned(),
        "restore".to_owned(),
    ]));

    let fields: Vec<(&[usize], &str)> = warnings
        .iter()
        .map(|w| match &w.kind {
            WarningKind::InvalidValue { field, .. } => (w.path.as_slice(), *field),
            other => panic!("unexpected warning {other}"),
        })
        .collect();
    assert_eq!(
        fields,
        vec![
            (&[1][..], "align"),
            (&[1][..], "verticalAlign"),
            (&[0][..], "mode"),
            (&[0][..], "opacity"),
            (&[0][..], "type"),
        ]
    );
    assert_eq!(warnings[2].to_string(), "layer 0 (odd): invalid mode \"plus-lighter\", using the default");
}

#[test]
fn invalid_values_inside_groups_report_their_path() {
    let stack = Stack::from_json_str(
        r#"{"width": 2, "height": 2, "layers": [{"group": [{"mode": "glow", "fill": "red"}]}]}"#,
    )
    .unwrap();
    let (_, warnings) = record(&stack);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].path, vec![0, 0]);
}

#[test]
fn shapes_fill_then_stroke() {
    let mut shape = ShapeContent::ellipse(Dimension::Percent(50.0), Dimension::Auto).with_color("#00f");
    shape.stroke = Some("black".into());
    let stack = Stack::new(20, 10).with_layer(Layer::shape(shape));
    let (ops, _) = record(&stack);
    assert_eq!(draws(&ops), vec!["fill_ellipse 5 0 10 10", "stroke_ellipse 1"]);
}

#[test]
fn invalid_paint_is_a_warning() {
    let stack = Stack::new(4, 4).with_layer(Layer::fill("not-a-color"));
    let (ops, warnings) = record(&stack);
    assert_eq!(draws(&ops), Vec::<&str>::new());
    assert!(matches!(warnings[0].kind, WarningKind::InvalidPaint { .. }));
}

#[test]
fn unknown_filters_leave_pixels_alone() {
    let stack = Stack::new(4, 4)
        .with_layer(Layer::filter("sparkle", FilterOptions::default()))
        .with_layer(Layer::fill("red"));
    let compositor = Compositor::new(RecordingEngine::new());
    let out = pollster::block_on(compositor.render(&stack)).unwrap();
    assert!(!out.surface.ops.contains(&"put_pixels".to_owned()));
    assert_eq!(get_pixel(&out.surface.get_pixels(), 2, 2), [255, 0, 0, 255]);
    assert_eq!(
        out.warnings[0].kind,
        WarningKind::UnknownFilter {
            name: "sparkle".to_owned()
        }
    );
}

#[test]
fn filters_with_the_wrong_output_size_are_rejected() {
    let shrink: Arc<dyn crate::effects::Filter> =
        Arc::new(|_: PixelBuffer, _: &FilterOptions| -> LaminateResult<PixelBuffer> {
            Ok(PixelBuffer::new(1, 1))
        });
    let stack = Stack::new(4, 4)
        .with_layer(Layer::filter_direct(shrink, FilterOptions::default()))
        .with_layer(Layer::fill("red"));
    let compositor = Compositor::new(RecordingEngine::new());
    let out = pollster::block_on(compositor.render(&stack)).unwrap();
    assert!(matches!(out.warnings[0].kind, WarningKind::FilterFailed { .. }));
    assert_eq!(get_pixel(&out.surface.get_pixels(), 0, 0), [255, 0, 0, 255]);
}

#[test]
fn registered_filters_rewrite_the_surface() {
    let stack = Stack::new(2, 2)
        .with_layer(Layer::filter("grayscale", FilterOptions::default()))
        .with_layer(Layer::fill("rgb(200, 50, 100)"));
    let compositor = Compositor::new(CpuEngine::default());
    let out = pollster::block_on(compositor.render(&stack)).unwrap();
    assert!(out.warnings.is_empty());
    assert_eq!(get_pixel(&out.surface.get_pixels(), 1, 1), [100, 100, 100, 255]);
}

#[test]
fn groups_render_into_their_own_surface() {
    let stack = Stack::new(4, 4).with_layer(
        Layer::group(vec![Layer::fill("red")]).with_opacity(0.5),
    );
    let (ops, _) = record(&stack);
    assert_eq!(draws(&ops), vec!["image 4x4 -> 0 0 4 4"]);
}

#[test]
fn group_depth_is_bounded() {
    let nested = Layer::group(vec![Layer::group(vec![Layer::fill("red")]).with_name("inner")]);
    let stack = Stack::new(2, 2).with_layer(nested);
    let compositor =
        Compositor::new(RecordingEngine::new()).with_opts(CompositorOpts::default().with_max_group_depth(1));
    let out = pollster::block_on(compositor.render(&stack)).unwrap();
    assert_eq!(out.warnings.len(), 1);
    assert_eq!(out.warnings[0].path, vec![0, 0]);
    assert_eq!(out.warnings[0].kind, WarningKind::GroupDepthExceeded { depth: 2 });
    assert_eq!(get_pixel(&out.surface.get_pixels(), 1, 1), [0, 0, 0, 0]);
}

#[test]
fn render_into_reuses_matching_surfaces() {
    let compositor = Compositor::new(RecordingEngine::new());
    let stack = Stack::new(3, 3).with_layer(Layer::fill("red"));
    let mut surface = compositor.engine().create_canvas(3, 3);
    pollster::block_on(compositor.render_into(&stack, &mut surface)).unwrap();
    assert!(!surface.ops.iter().any(|op| op.starts_with("resize")));

    let stack = Stack::new(5, 2).with_layer(Layer::fill("red"));
    pollster::block_on(compositor.render_into(&stack, &mut surface)).unwrap();
    assert!(surface.ops.contains(&"resize 5x2".to_owned()));
    assert_eq!((surface.width(), surface.height()), (5, 2));
}

#[test]
fn zero_sized_stacks_are_errors() {
    let compositor = Compositor::new(RecordingEngine::new());
    assert!(pollster::block_on(compositor.render(&Stack::new(0, 3))).is_err());
}

#[test]
fn default_group_depth() {
    assert_eq!(CompositorOpts::default().max_group_depth, 32);
    assert_eq!(CompositorOpts::default().with_max_group_depth(3).max_group_depth, 3);
}
