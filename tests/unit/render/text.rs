use super::*;

const SYSTEM_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

fn system_font() -> Option<Vec<u8>> {
    std::fs::read(SYSTEM_FONT).ok()
}

#[test]
fn css_font_shorthand() {
    let f = CssFont::parse("bold 24px \"Open Sans\", serif").unwrap();
    assert_eq!(f.weight, 700.0);
    assert_eq!(f.size_px, 24.0);
    assert_eq!(f.families, vec!["Open Sans".to_owned(), "serif".to_owned()]);

    let f = CssFont::parse("normal 12px sans-serif").unwrap();
    assert_eq!((f.weight, f.size_px), (400.0, 12.0));

    let f = CssFont::parse("italic 300 12pt/1.5 Mono").unwrap();
    assert_eq!(f.weight, 300.0);
    assert_eq!(f.size_px, 16.0);
}

#[test]
fn css_font_without_size_is_invalid() {
    assert_eq!(CssFont::parse("bold sans-serif"), None);
    assert_eq!(CssFont::parse(""), None);
    assert_eq!(CssFont::parse("normal 12 serif"), None);
}

#[test]
fn empty_book_cannot_render() {
    let mut raster = TextRasterizer::new(FontBook::new());
    let mut ctx = vello_cpu::RenderContext::new(10, 10);
    let err = raster
        .draw(&mut ctx, "hi", Point::new(5.0, 5.0), &TextStyle::default(), GlyphMode::Fill)
        .unwrap_err();
    assert!(err.to_string().contains("no fonts"));
}

#[test]
fn garbage_font_bytes_are_rejected() {
    assert!(FontBook::new().register(b"definitely not a font".to_vec()).is_err());
}

#[test]
fn filled_glyphs_cover_pixels_near_the_anchor() {
    let Some(bytes) = system_font() else {
        eprintln!("skipping: {SYSTEM_FONT} not present");
        return;
    };
    let mut book = FontBook::new();
    let families = book.register(bytes).unwrap();
    assert_eq!(families, vec!["DejaVu Sans".to_owned()]);

    let style = TextStyle {
        font: "bold 32px DejaVu Sans".to_owned(),
        ..TextStyle::default()
    };
    let mut raster = TextRasterizer::new(book);
    let fill = alpha_mask(&mut raster, &style, GlyphMode::Fill);
    assert_eq!(fill.len(), 100 * 50);
    let covered = fill.iter().filter(|a| **a > 128).count();
    assert!(covered > 50, "covered {covered}");
    // Centered on x = 50: nothing near the far edges.
    for y in 0..50 {
        assert_eq!(fill[y * 100], 0);
        assert_eq!(fill[y * 100 + 99], 0);
    }

    let stroke = alpha_mask(&mut raster, &style, GlyphMode::Stroke { width: 2.0 });
    assert_ne!(fill, stroke);
}

fn alpha_mask(raster: &mut TextRasterizer, style: &TextStyle, mode: GlyphMode) -> Vec<u8> {
    let mut ctx = vello_cpu::RenderContext::new(100, 50);
    ctx.set_paint(vello_cpu::peniko::Color::BLACK);
    raster.draw(&mut ctx, "HH", Point::new(50.0, 25.0), style, mode).unwrap();
    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(100, 50);
    ctx.render_to_pixmap(&mut pixmap);
    pixmap.data().iter().map(|p| p.a).collect()
}
