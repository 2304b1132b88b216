pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Straight (non-premultiplied) RGBA color with channels in `0.0..=255.0`.
///
/// Intermediate results of interpolation stay fractional; [`quantize`] rounds
/// and saturates them back to bytes.
pub type Rgba = [f64; 4];

/// Straight RGBA8 pixel.
pub type Rgba8 = [u8; 4];

/// Round and saturate a fractional color to RGBA8.
pub fn quantize(c: Rgba) -> Rgba8 {
    c.map(quantize_channel)
}

/// Round and saturate one channel to `0..=255`. NaN maps to 0.
pub fn quantize_channel(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, 255.0) as u8
}

/// Widen an RGBA8 pixel to fractional channels.
pub fn widen(c: Rgba8) -> Rgba {
    c.map(f64::from)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
