use super::*;

fn parse(s: &str) -> Color {
    s.parse().unwrap()
}

#[test]
fn hex_forms() {
    assert_eq!(parse("#f00"), Color::rgb(255, 0, 0));
    assert_eq!(parse("#0f08"), Color::rgba(0, 255, 0, 136));
    assert_eq!(parse("#336699"), Color::rgb(0x33, 0x66, 0x99));
    assert_eq!(parse("#33669980"), Color::rgba(0x33, 0x66, 0x99, 0x80));
    assert_eq!(parse("#ABCDEF"), Color::rgb(0xab, 0xcd, 0xef));
}

#[test]
fn functional_forms() {
    assert_eq!(parse("rgb(10, 20, 30)"), Color::rgb(10, 20, 30));
    assert_eq!(parse("rgba(10,20,30,0.5)"), Color::rgba(10, 20, 30, 128));
    assert_eq!(parse("rgb(100%, 0%, 0%)"), Color::rgb(255, 0, 0));
    assert_eq!(parse("rgb(300, -5, 0)"), Color::rgb(255, 0, 0));
    assert_eq!(parse("hsl(0, 100%, 50%)"), Color::rgb(255, 0, 0));
    assert_eq!(parse("hsl(120deg, 100%, 25%)"), Color::rgb(0, 128, 0));
    assert_eq!(parse("hsla(240, 100%, 50%, 0)"), Color::rgba(0, 0, 255, 0));
    assert_eq!(parse("hsl(0, 0%, 100%)"), Color::WHITE);
}

#[test]
fn named_colors_ignore_case() {
    assert_eq!(parse("red"), Color::rgb(255, 0, 0));
    assert_eq!(parse("Blue"), Color::rgb(0, 0, 255));
    assert_eq!(parse(" grey "), Color::rgb(128, 128, 128));
    assert_eq!(parse("transparent"), Color::TRANSPARENT);
}

#[test]
fn rejects_garbage() {
    for bad in ["", "#12", "#gggggg", "rgb(1,2)", "rgb(a,b,c)", "hsl(0, 50, 50)", "blurple"] {
        let err = bad.parse::<Color>().unwrap_err();
        assert_eq!(err.input, bad);
    }
}

#[test]
fn display_is_long_hex() {
    assert_eq!(Color::rgba(1, 2, 255, 128).to_string(), "#0102ff80");
}

#[test]
fn converts_for_the_raster_engine() {
    let c = Color::rgba(255, 0, 0, 51).to_peniko();
    assert_eq!(c.to_rgba8().to_u8_array(), [255, 0, 0, 51]);
}
