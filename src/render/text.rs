//! Text shaping with `parley`, drawn as `vello_cpu` glyph runs.
//!
//! Fonts are never discovered from the system; they are registered from bytes
//! into a [`FontBook`] that every canvas of an engine shares.

use std::borrow::Cow;

use crate::foundation::core::{Point, Vec2};
use crate::foundation::error::{LaminateError, LaminateResult};
use crate::render::canvas::{TextAlign, TextBaseline, TextStyle};

/// Parsed CSS font shorthand.
#[derive(Clone, Debug, PartialEq)]
pub struct CssFont {
    pub weight: f32,
    pub size_px: f32,
    pub families: Vec<String>,
}

impl CssFont {
    /// Parse `"[style] [weight] <size>[/line-height] <family>[, <family>...]"`.
    ///
    /// Returns `None` without a size, like a canvas ignoring an invalid font.
    pub fn parse(s: &str) -> Option<Self> {
        let mut weight = 400.0;
        let mut tokens = s.split_whitespace();
        let size_px = loop {
            let token = tokens.next()?;
            match token {
                "normal" | "italic" | "oblique" | "small-caps" => {}
                "bold" | "bolder" => weight = 700.0,
                "lighter" => weight = 300.0,
                _ => {
                    if let Ok(w) = token.parse::<f32>() {
                        if (1.0..=1000.0).contains(&w) {
                            weight = w;
                            continue;
                        }
                        return None;
                    }
                    let size = token.split('/').next().unwrap_or(token);
                    break parse_font_size(size)?;
                }
            }
        };
        let rest = tokens.collect::<Vec<_>>().join(" ");
        let families = rest
            .split(',')
            .map(|f| f.trim().trim_matches(['"', '\'']).to_owned())
            .filter(|f| !f.is_empty())
            .collect();
        Some(Self {
            weight,
            size_px,
            families,
        })
    }
}

fn parse_font_size(s: &str) -> Option<f32> {
    let (num, scale) = if let Some(v) = s.strip_suffix("px") {
        (v, 1.0)
    } else if let Some(v) = s.strip_suffix("pt") {
        (v, 4.0 / 3.0)
    } else if let Some(v) = s.strip_suffix("rem").or_else(|| s.strip_suffix("em")) {
        (v, 16.0)
    } else if let Some(v) = s.strip_suffix('%') {
        (v, 0.16)
    } else {
        return None;
    };
    let v = num.parse::<f32>().ok()? * scale;
    (v.is_finite() && v > 0.0).then_some(v)
}

/// One registered font face.
#[derive(Clone)]
struct FontFace {
    family: String,
    blob: parley::fontique::Blob<u8>,
    font: vello_cpu::peniko::FontData,
}

/// Fonts available to text layers.
#[derive(Clone, Default)]
pub struct FontBook {
    faces: Vec<FontFace>,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every face in a font file; returns the family names found.
    pub fn register(&mut self, bytes: Vec<u8>) -> LaminateResult<Vec<String>> {
        let blob = parley::fontique::Blob::from(bytes.clone());
        let mut scratch_ctx = parley::FontContext::default();
        let families = scratch_ctx.collection.register_fonts(blob.clone(), None);
        if families.is_empty() {
            return Err(LaminateError::validation("no font families found in font bytes"));
        }

        let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0);
        let mut names = Vec::new();
        for (id, _) in families {
            let name = scratch_ctx
                .collection
                .family_name(id)
                .ok_or_else(|| LaminateError::validation("registered font family has no name"))?
                .to_owned();
            tracing::debug!(family = %name, "registered font");
            self.faces.push(FontFace {
                family: name.clone(),
                blob: blob.clone(),
                font: font.clone(),
            });
            names.push(name);
        }
        Ok(names)
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Registered family names, in registration order.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.faces.iter().map(|f| f.family.as_str())
    }

    /// First requested family that is registered, else the first registered one.
    fn pick_family(&self, requested: &[String]) -> Option<&str> {
        requested
            .iter()
            .find_map(|r| self.faces.iter().find(|f| f.family.eq_ignore_ascii_case(r)))
            .or_else(|| self.faces.first())
            .map(|f| f.family.as_str())
    }

    fn face_for(&self, blob_id: u64) -> Option<&FontFace> {
        self.faces
            .iter()
            .find(|f| f.blob.id() == blob_id)
            .or_else(|| self.faces.first())
    }
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.families()).finish()
    }
}

/// Whether glyphs are filled or outlined.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum GlyphMode {
    Fill,
    Stroke { width: f64 },
}

/// Per-canvas shaping state over a shared [`FontBook`].
pub(crate) struct TextRasterizer {
    book: FontBook,
    font_ctx: Option<parley::FontContext>,
    layout_ctx: parley::LayoutContext<()>,
}

impl TextRasterizer {
    pub(crate) fn new(book: FontBook) -> Self {
        Self {
            book,
            font_ctx: None,
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Lay out `text` anchored at `at` and draw its glyphs into `ctx` with the
    /// paint and transform already set there.
    pub(crate) fn draw(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        at: Point,
        style: &TextStyle,
        mode: GlyphMode,
    ) -> LaminateResult<()> {
        if self.book.is_empty() {
            return Err(LaminateError::render("no fonts registered"));
        }
        let font = CssFont::parse(&style.font)
            .ok_or_else(|| LaminateError::render(format!("invalid font \"{}\"", style.font)))?;
        let family = self
            .book
            .pick_family(&font.families)
            .map(str::to_owned)
            .ok_or_else(|| LaminateError::render("no fonts registered"))?;

        let book = &self.book;
        let font_ctx = self.font_ctx.get_or_insert_with(|| shaping_context(book));
        let mut builder = self.layout_ctx.ranged_builder(font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(font.size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(font.weight),
        ));
        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);

        let origin = at - anchor_offset(&layout, style.align, style.baseline);
        let (ox, oy) = (origin.x as f32, origin.y as f32);
        if let GlyphMode::Stroke { width } = mode {
            ctx.set_stroke(
                vello_cpu::kurbo::Stroke::new(width).with_join(vello_cpu::kurbo::Join::Round),
            );
        }

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let Some(face) = self.book.face_for(run.run().font().data.id()) else {
                    continue;
                };
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x + ox,
                    y: g.y + oy,
                });
                let builder = ctx.glyph_run(&face.font).font_size(run.run().font_size());
                match mode {
                    GlyphMode::Fill => builder.fill_glyphs(glyphs),
                    GlyphMode::Stroke { .. } => builder.stroke_glyphs(glyphs),
                }
            }
        }
        Ok(())
    }
}

fn shaping_context(book: &FontBook) -> parley::FontContext {
    let mut ctx = parley::FontContext::default();
    let mut seen = Vec::new();
    for face in &book.faces {
        if !seen.contains(&face.blob.id()) {
            seen.push(face.blob.id());
            ctx.collection.register_fonts(face.blob.clone(), None);
        }
    }
    ctx
}

/// Offset from the layout origin to the point that `align`/`baseline` pin.
fn anchor_offset(layout: &parley::Layout<()>, align: TextAlign, baseline: TextBaseline) -> Vec2 {
    let width = f64::from(layout.width());
    let x = match align {
        TextAlign::Left | TextAlign::Start => 0.0,
        TextAlign::Right | TextAlign::End => width,
        TextAlign::Center => width / 2.0,
    };
    let Some(m) = layout.lines().next().map(|l| *l.metrics()) else {
        return Vec2::new(x, 0.0);
    };
    let (base, ascent, descent) = (f64::from(m.baseline), f64::from(m.ascent), f64::from(m.descent));
    let y = match baseline {
        TextBaseline::Top | TextBaseline::Hanging => base - ascent,
        TextBaseline::Middle => base - (ascent - descent) / 2.0,
        TextBaseline::Alphabetic => base,
        TextBaseline::Ideographic | TextBaseline::Bottom => base + descent,
    };
    Vec2::new(x, y)
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
