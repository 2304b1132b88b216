use super::*;

const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
const CLEAR: [f32; 4] = [0.0; 4];

fn close(a: [f32; 4], b: [f32; 4]) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
}

#[test]
fn names_round_trip() {
    for mode in BlendMode::ALL {
        assert_eq!(mode.as_str().parse::<BlendMode>().unwrap(), mode);
        let json = serde_json::to_string(&mode).unwrap();
        assert_eq!(json, format!("\"{mode}\""));
    }
    assert!("sauce-over".parse::<BlendMode>().is_err());
    assert_eq!(BlendMode::default(), BlendMode::SourceOver);
}

#[test]
fn source_over_with_partial_alpha() {
    let half_red = [0.5, 0.0, 0.0, 0.5];
    assert!(close(BlendMode::SourceOver.apply(half_red, BLUE), [0.5, 0.0, 0.5, 1.0]));
    assert!(close(BlendMode::SourceOver.apply(CLEAR, BLUE), BLUE));
}

#[test]
fn porter_duff_operators() {
    assert!(close(BlendMode::SourceIn.apply(RED, CLEAR), CLEAR));
    assert!(close(BlendMode::SourceIn.apply(RED, BLUE), RED));
    assert!(close(BlendMode::SourceOut.apply(RED, BLUE), CLEAR));
    assert!(close(BlendMode::DestinationOver.apply(RED, BLUE), BLUE));
    assert!(close(BlendMode::DestinationIn.apply(CLEAR, BLUE), CLEAR));
    assert!(close(BlendMode::DestinationOut.apply(RED, BLUE), CLEAR));
    assert!(close(BlendMode::Copy.apply(CLEAR, BLUE), CLEAR));
    assert!(close(BlendMode::Xor.apply(RED, BLUE), CLEAR));
    assert!(close(BlendMode::Lighter.apply(RED, BLUE), [1.0, 0.0, 1.0, 1.0]));
}

#[test]
fn unbounded_modes() {
    let unbounded: Vec<_> = BlendMode::ALL.into_iter().filter(|m| m.is_unbounded()).collect();
    assert_eq!(
        unbounded,
        vec![
            BlendMode::SourceIn,
            BlendMode::SourceOut,
            BlendMode::DestinationIn,
            BlendMode::DestinationAtop,
            BlendMode::Copy
        ]
    );
}

#[test]
fn separable_blends_on_opaque_pixels() {
    let gray = [0.5, 0.5, 0.5, 1.0];
    assert!(close(BlendMode::Multiply.apply(gray, gray), [0.25, 0.25, 0.25, 1.0]));
    assert!(close(BlendMode::Screen.apply(gray, gray), [0.75, 0.75, 0.75, 1.0]));
    assert!(close(BlendMode::Difference.apply(RED, RED), [0.0, 0.0, 0.0, 1.0]));
    assert!(close(BlendMode::Darken.apply(RED, BLUE), [0.0, 0.0, 0.0, 1.0]));
    assert!(close(BlendMode::Lighten.apply(RED, BLUE), [1.0, 0.0, 1.0, 1.0]));
}

#[test]
fn blends_over_transparent_are_source_over() {
    for mode in [BlendMode::Multiply, BlendMode::Overlay, BlendMode::Hue, BlendMode::Luminosity] {
        assert!(close(mode.apply(RED, CLEAR), RED), "{mode}");
    }
}

#[test]
fn luminosity_keeps_destination_hue() {
    let white = [1.0, 1.0, 1.0, 1.0];
    let out = BlendMode::Luminosity.apply(white, RED);
    assert!(out[0] > 0.99 && out[3] > 0.99);
    let black = [0.0, 0.0, 0.0, 1.0];
    assert!(close(BlendMode::Color.apply(RED, black), black));
}
