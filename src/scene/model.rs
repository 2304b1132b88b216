//! Layer documents.
//!
//! A [`Layer`] carries exactly one [`LayerContent`], chosen by which content key
//! the JSON object holds. When several are present the first of `image`,
//! `filter`, `group`, `text`, `shape`, `fill` wins; none at all is
//! [`LayerContent::Empty`], which renders as a no-op.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assets::ImageHandle;
use crate::effects::{Filter, FilterOptions};
use crate::foundation::core::Size;
use crate::geometry::dimension::parse_percent;
use crate::geometry::{Dimension, PlacementSpec};
use crate::paint::FillSpec;
use crate::render::canvas::{TextAlign, TextBaseline};
use crate::render::composite::BlendMode;
use crate::scene::lenient::{Lenient, or_default};

fn number<S: serde::Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    crate::geometry::dimension::serialize_number(*v, s)
}

fn opt_number<S: serde::Serializer>(v: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
    match v {
        Some(v) => crate::geometry::dimension::serialize_number(*v, s),
        None => s.serialize_none(),
    }
}

fn opt_lenient_number<S: serde::Serializer>(v: &Option<Lenient<f64>>, s: S) -> Result<S::Ok, S::Error> {
    match v {
        Some(Lenient::Valid(v)) => crate::geometry::dimension::serialize_number(*v, s),
        Some(raw) => raw.serialize(s),
        None => s.serialize_none(),
    }
}

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

/// Per-layer transform: translate by `(x, y)`, then rotate `rotate` degrees
/// about the canvas center.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default, skip_serializing_if = "is_zero", serialize_with = "number")]
    pub x: f64,
    #[serde(default, skip_serializing_if = "is_zero", serialize_with = "number")]
    pub y: f64,
    #[serde(default, skip_serializing_if = "is_zero", serialize_with = "number")]
    pub rotate: f64,
}

impl Transform {
    pub fn translate(x: f64, y: f64) -> Self {
        Self { x, y, rotate: 0.0 }
    }

    pub fn rotate(degrees: f64) -> Self {
        Self {
            rotate: degrees,
            ..Self::default()
        }
    }

    pub fn is_identity(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.rotate == 0.0
    }
}

/// How an image is sized before placement.
///
/// JSON: `{"width"?, "height"?}`, `"cover"`, `"contain"` or `"NN%"`. An
/// unrecognized string keeps the native size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageSize {
    /// Explicit pixels; a missing side follows the source aspect ratio.
    Explicit {
        width: Option<f64>,
        height: Option<f64>,
    },
    /// Fill the canvas, overflowing on one axis.
    Cover,
    /// Fit entirely inside the canvas.
    Contain,
    /// Percentage (as written) of the [`ImageSize::Contain`] size.
    Percent(f64),
}

impl ImageSize {
    /// Drawn size of an image of `native` size on a `canvas`-sized stack.
    ///
    /// `None` keeps the native size.
    pub fn resolve(size: Option<&Self>, native: Size, canvas: Size) -> Size {
        let contain = || {
            let scale = (native.width / canvas.width).max(native.height / canvas.height);
            Size::new(native.width / scale, native.height / scale)
        };
        match size {
            None => native,
            Some(Self::Explicit { width, height }) => match (width, height) {
                (Some(w), Some(h)) => Size::new(*w, *h),
                (Some(w), None) => Size::new(*w, native.height / native.width * w),
                (None, Some(h)) => Size::new(native.width / native.height * h, *h),
                (None, None) => native,
            },
            Some(Self::Cover) => {
                let scale = (native.width / canvas.width).min(native.height / canvas.height);
                Size::new(native.width / scale, native.height / scale)
            }
            Some(Self::Contain) => contain(),
            Some(Self::Percent(p)) => contain() * (p / 100.0),
        }
    }
}

impl Serialize for ImageSize {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Dims {
            #[serde(skip_serializing_if = "Option::is_none", serialize_with = "opt_number")]
            width: Option<f64>,
            #[serde(skip_serializing_if = "Option::is_none", serialize_with = "opt_number")]
            height: Option<f64>,
        }

        match *self {
            Self::Explicit { width, height } => Dims { width, height }.serialize(serializer),
            Self::Cover => serializer.serialize_str("cover"),
            Self::Contain => serializer.serialize_str("contain"),
            Self::Percent(p) => serializer.collect_str(&format_args!("{p}%")),
        }
    }
}

impl<'de> Deserialize<'de> for ImageSize {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Str(String),
            Dims {
                #[serde(default)]
                width: Option<serde_json::Value>,
                #[serde(default)]
                height: Option<serde_json::Value>,
            },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Str(s) => match s.as_str() {
                "cover" => Self::Cover,
                "contain" => Self::Contain,
                other => match parse_percent(other) {
                    Some(p) => Self::Percent(p),
                    None => Self::Explicit {
                        width: None,
                        height: None,
                    },
                },
            },
            Repr::Dims { width, height } => Self::Explicit {
                width: width.as_ref().and_then(serde_json::Value::as_f64),
                height: height.as_ref().and_then(serde_json::Value::as_f64),
            },
        })
    }
}

/// `image` content.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Resolved through the engine's image loader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Pre-resolved image; used when `url` is absent or fails to load.
    #[serde(skip)]
    pub source: Option<ImageHandle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<PlacementSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PlacementSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<ImageSize>,
}

impl ImageContent {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn source(image: ImageHandle) -> Self {
        Self {
            source: Some(image),
            ..Self::default()
        }
    }

    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_anchor(mut self, anchor: PlacementSpec) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_position(mut self, position: PlacementSpec) -> Self {
        self.position = Some(position);
        self
    }
}

/// A filter as referenced by a layer.
#[derive(Clone)]
pub enum FilterRef {
    /// Looked up in the compositor's registry.
    Named(String),
    /// Run-time filter object; cannot be serialized.
    Direct(Arc<dyn Filter>),
    /// Any other JSON value; never resolves.
    Invalid(serde_json::Value),
}

impl fmt::Debug for FilterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Direct(_) => f.write_str("Direct(<filter>)"),
            Self::Invalid(v) => f.debug_tuple("Invalid").field(v).finish(),
        }
    }
}

impl PartialEq for FilterRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Named(a), Self::Named(b)) => a == b,
            (Self::Direct(a), Self::Direct(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            (Self::Invalid(a), Self::Invalid(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for FilterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Direct(_) => f.write_str("<filter>"),
            Self::Invalid(v) => write!(f, "{v}"),
        }
    }
}

/// `filter` content plus its `filterOptions`.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterContent {
    pub filter: FilterRef,
    pub options: FilterOptions,
}

/// `font` of a text layer. Numbers for `size` mean pixels.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<FontValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<FontValue>,
}

/// A CSS font value written as a number or a string.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FontValue {
    Number(f64),
    Text(String),
}

impl Serialize for FontValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(v) => number(v, serializer),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl FontSpec {
    /// Canvas font shorthand `"{weight} {size} {family}"`.
    pub fn css(&self) -> String {
        let weight = match &self.weight {
            Some(FontValue::Number(w)) => w.to_string(),
            Some(FontValue::Text(w)) => w.clone(),
            None => "normal".to_owned(),
        };
        let size = match &self.size {
            Some(FontValue::Number(s)) => format!("{s}px"),
            Some(FontValue::Text(s)) => s.clone(),
            None => "12px".to_owned(),
        };
        let family = self.family.as_deref().unwrap_or("sans-serif");
        format!("{weight} {size} {family}")
    }
}

/// `text` content.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "is_default_font")]
    pub font: FontSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<FillSpec>,
    /// Alias of `color`, consulted when `color` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<FillSpec>,
    /// Outline paint; the outline is drawn only when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<FillSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "opt_number")]
    pub stroke_width: Option<f64>,
    /// Unknown keywords fall back to `center`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Lenient<TextAlign>>,
    /// Unknown keywords fall back to `middle`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_align: Option<Lenient<TextBaseline>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PlacementSpec>,
}

fn is_default_font(f: &FontSpec) -> bool {
    *f == FontSpec::default()
}

impl TextContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = Some(align.into());
        self
    }

    pub fn with_vertical_align(mut self, baseline: TextBaseline) -> Self {
        self.vertical_align = Some(baseline.into());
        self
    }

    /// Fill paint: `color`, else `fill`, else black.
    pub fn fill_spec(&self) -> FillSpec {
        self.color
            .clone()
            .or_else(|| self.fill.clone())
            .unwrap_or_else(|| FillSpec::color("#000"))
    }

    pub fn text_align(&self) -> TextAlign {
        or_default(self.align.as_ref())
    }

    pub fn baseline(&self) -> TextBaseline {
        or_default(self.vertical_align.as_ref())
    }
}

/// Shape primitive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rect,
    Ellipse,
}

/// `shape` content.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeContent {
    /// Unknown shape types draw as `rect`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Lenient<ShapeKind>>,
    #[serde(default, skip_serializing_if = "Dimension::is_auto")]
    pub width: Dimension,
    #[serde(default, skip_serializing_if = "Dimension::is_auto")]
    pub height: Dimension,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<FillSpec>,
    /// Alias of `color`, consulted when `color` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<FillSpec>,
    /// Outline paint; the outline is drawn over the fill when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<FillSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "opt_number")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<PlacementSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PlacementSpec>,
}

impl ShapeContent {
    pub fn rect(width: Dimension, height: Dimension) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn ellipse(width: Dimension, height: Dimension) -> Self {
        Self {
            kind: Some(ShapeKind::Ellipse.into()),
            ..Self::rect(width, height)
        }
    }

    pub fn with_color(mut self, color: impl Into<FillSpec>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn fill_spec(&self) -> Option<&FillSpec> {
        self.color.as_ref().or(self.fill.as_ref())
    }

    pub fn shape_kind(&self) -> ShapeKind {
        or_default(self.kind.as_ref())
    }

    /// Pixel size on a `canvas`-sized stack. Percentages use the matching
    /// canvas side; a single given side makes a square.
    pub fn resolve_size(&self, canvas: Size) -> Size {
        let w = self.width.length(canvas.width);
        let h = self.height.length(canvas.height);
        match (w, h) {
            (Some(w), Some(h)) => Size::new(w, h),
            (Some(w), None) => Size::new(w, w),
            (None, Some(h)) => Size::new(h, h),
            (None, None) => Size::ZERO,
        }
    }
}

/// What a layer draws.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerContent {
    Image(ImageContent),
    Filter(FilterContent),
    Group(Vec<Layer>),
    Text(TextContent),
    Shape(ShapeContent),
    Fill(FillSpec),
    Empty,
}

impl LayerContent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Image(_) => "image",
            Self::Filter(_) => "filter",
            Self::Group(_) => "group",
            Self::Text(_) => "text",
            Self::Shape(_) => "shape",
            Self::Fill(_) => "fill",
            Self::Empty => "empty",
        }
    }
}

/// One entry of a stack.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "LayerDef")]
pub struct Layer {
    pub name: Option<String>,
    /// Skipped entirely when set.
    pub disabled: bool,
    /// Defaults to [`BlendMode::SourceOver`], as do unknown keywords.
    pub mode: Option<Lenient<BlendMode>>,
    /// Defaults to 1, as do non-numbers; clamped to `0..=1` when drawn.
    pub opacity: Option<Lenient<f64>>,
    pub transform: Option<Transform>,
    pub content: LayerContent,
}

impl Layer {
    pub fn new(content: LayerContent) -> Self {
        Self {
            name: None,
            disabled: false,
            mode: None,
            opacity: None,
            transform: None,
            content,
        }
    }

    pub fn image(image: ImageContent) -> Self {
        Self::new(LayerContent::Image(image))
    }

    pub fn fill(fill: impl Into<FillSpec>) -> Self {
        Self::new(LayerContent::Fill(fill.into()))
    }

    /// Filter layer resolved by name through the registry.
    pub fn filter(name: impl Into<String>, options: FilterOptions) -> Self {
        Self::new(LayerContent::Filter(FilterContent {
            filter: FilterRef::Named(name.into()),
            options,
        }))
    }

    /// Filter layer carrying the filter object itself.
    pub fn filter_direct(filter: Arc<dyn Filter>, options: FilterOptions) -> Self {
        Self::new(LayerContent::Filter(FilterContent {
            filter: FilterRef::Direct(filter),
            options,
        }))
    }

    pub fn group(layers: Vec<Layer>) -> Self {
        Self::new(LayerContent::Group(layers))
    }

    pub fn text(text: TextContent) -> Self {
        Self::new(LayerContent::Text(text))
    }

    pub fn shape(shape: ShapeContent) -> Self {
        Self::new(LayerContent::Shape(shape))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn with_mode(mut self, mode: BlendMode) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity.into());
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Effective blend mode.
    pub fn blend_mode(&self) -> BlendMode {
        or_default(self.mode.as_ref())
    }

    /// Effective global alpha: `opacity` clamped to `0..=1`, 1 when unset,
    /// invalid or NaN.
    pub fn alpha(&self) -> f64 {
        match self.opacity.as_ref().and_then(Lenient::valid) {
            Some(o) if !o.is_nan() => o.clamp(0.0, 1.0),
            _ => 1.0,
        }
    }

    /// Document keys of this layer (not its group children) whose values were
    /// not understood, with the raw values.
    pub fn invalid_fields(&self) -> Vec<(&'static str, &serde_json::Value)> {
        fn check<'a, T>(
            out: &mut Vec<(&'static str, &'a serde_json::Value)>,
            key: &'static str,
            field: &'a Option<Lenient<T>>,
        ) {
            if let Some(raw) = field.as_ref().and_then(Lenient::invalid) {
                out.push((key, raw));
            }
        }

        let mut out = Vec::new();
        check(&mut out, "mode", &self.mode);
        check(&mut out, "opacity", &self.opacity);
        match &self.content {
            LayerContent::Text(text) => {
                check(&mut out, "align", &text.align);
                check(&mut out, "verticalAlign", &text.vertical_align);
            }
            LayerContent::Shape(shape) => check(&mut out, "type", &shape.kind),
            _ => {}
        }
        out
    }
}

/// Wire form of [`Layer`] with every content key optional.
#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayerDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<Lenient<BlendMode>>,
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "opt_lenient_number")]
    opacity: Option<Lenient<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transform: Option<Transform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<ImageContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter_options: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group: Option<Vec<Layer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<TextContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shape: Option<ShapeContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fill: Option<FillSpec>,
}

impl From<LayerDef> for Layer {
    fn from(def: LayerDef) -> Self {
        let content = if let Some(image) = def.image {
            LayerContent::Image(image)
        } else if let Some(filter) = def.filter {
            let filter = match filter {
                serde_json::Value::String(name) => FilterRef::Named(name),
                other => FilterRef::Invalid(other),
            };
            let options = FilterOptions::with_params(def.filter_options.unwrap_or_default());
            LayerContent::Filter(FilterContent { filter, options })
        } else if let Some(group) = def.group {
            LayerContent::Group(group)
        } else if let Some(text) = def.text {
            LayerContent::Text(text)
        } else if let Some(shape) = def.shape {
            LayerContent::Shape(shape)
        } else if let Some(fill) = def.fill {
            LayerContent::Fill(fill)
        } else {
            LayerContent::Empty
        };

        Self {
            name: def.name,
            disabled: def.disabled,
            mode: def.mode,
            opacity: def.opacity,
            transform: def.transform,
            content,
        }
    }
}

impl TryFrom<&Layer> for LayerDef {
    type Error = String;

    fn try_from(layer: &Layer) -> Result<Self, Self::Error> {
        let mut def = LayerDef {
            name: layer.name.clone(),
            disabled: layer.disabled,
            mode: layer.mode.clone(),
            opacity: layer.opacity.clone(),
            transform: layer.transform,
            ..LayerDef::default()
        };
        match &layer.content {
            LayerContent::Image(image) => {
                if image.source.is_some() {
                    return Err("image `source` handles are run-time only and cannot be serialized".to_owned());
                }
                def.image = Some(image.clone());
            }
            LayerContent::Filter(FilterContent { filter, options }) => {
                if options.has_callbacks() {
                    return Err("filter option callbacks cannot be serialized".to_owned());
                }
                def.filter = Some(match filter {
                    FilterRef::Named(name) => serde_json::Value::String(name.clone()),
                    FilterRef::Direct(_) => {
                        return Err("direct filter objects cannot be serialized".to_owned());
                    }
                    FilterRef::Invalid(v) => v.clone(),
                });
                if !options.params.is_null() {
                    def.filter_options = Some(options.params.clone());
                }
            }
            LayerContent::Group(layers) => def.group = Some(layers.clone()),
            LayerContent::Text(text) => def.text = Some(text.clone()),
            LayerContent::Shape(shape) => def.shape = Some(shape.clone()),
            LayerContent::Fill(fill) => def.fill = Some(fill.clone()),
            LayerContent::Empty => {}
        }
        Ok(def)
    }
}

impl Serialize for Layer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        LayerDef::try_from(self)
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
