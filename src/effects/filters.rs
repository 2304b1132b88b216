//! Built-in pixel filters.
//!
//! Every filter receives a private copy of the surface pixels. Channel writes
//! truncate toward zero and saturate to `0..=255`.

use std::sync::Arc;

use crate::effects::registry::{FilterOptions, PixelMap};
use crate::foundation::error::{LaminateError, LaminateResult};
use crate::foundation::math::bezier_by_x;
use crate::pixels::{PixelBuffer, sample_pixel, set_pixel};

fn store(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.clamp(0.0, 255.0) as u8
}

/// Luma grayscale: `0.299 R + 0.587 G + 0.114 B` into all color channels.
pub fn grayscale(mut buf: PixelBuffer, _options: &FilterOptions) -> LaminateResult<PixelBuffer> {
    for px in buf.data_mut().chunks_exact_mut(4) {
        let gray = 0.299 * f64::from(px[0]) + 0.587 * f64::from(px[1]) + 0.114 * f64::from(px[2]);
        let gray = store(gray);
        px[0] = gray;
        px[1] = gray;
        px[2] = gray;
    }
    Ok(buf)
}

/// Scale color channels away from (or toward) mid-gray by `amount`.
pub fn contrast(mut buf: PixelBuffer, options: &FilterOptions) -> LaminateResult<PixelBuffer> {
    let amount = options.number("amount")?.unwrap_or(1.0);
    for px in buf.data_mut().chunks_exact_mut(4) {
        for c in &mut px[..3] {
            *c = store((f64::from(*c) - 128.0) * amount + 128.0);
        }
    }
    Ok(buf)
}

/// Control points of a tone curve from `(0,0)` to `(1,1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurvePoints {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl CurvePoints {
    /// The straight line; leaves every level unchanged.
    pub const IDENTITY: Self = Self {
        x1: 0.0,
        y1: 0.0,
        x2: 1.0,
        y2: 1.0,
    };

    /// Symmetric S-curve; positive `amount` boosts contrast.
    pub fn from_amount(amount: f64) -> Self {
        let half = amount / 2.0;
        Self {
            x1: (0.5 + half).clamp(0.0, 1.0),
            y1: (0.5 - half).clamp(0.0, 1.0),
            x2: (0.5 - half).clamp(0.0, 1.0),
            y2: (0.5 + half).clamp(0.0, 1.0),
        }
    }

    /// Read `{amount}` or `{x1, y1, x2, y2}`; `amount` takes precedence.
    pub fn from_options(options: &FilterOptions) -> LaminateResult<Self> {
        if let Some(amount) = options.number("amount")? {
            return Ok(Self::from_amount(amount));
        }
        let id = Self::IDENTITY;
        Ok(Self {
            x1: options.number("x1")?.unwrap_or(id.x1),
            y1: options.number("y1")?.unwrap_or(id.y1),
            x2: options.number("x2")?.unwrap_or(id.x2),
            y2: options.number("y2")?.unwrap_or(id.y2),
        })
    }

    /// Output level for input level `v`, in `0.0..=255.0` for in-range control points.
    pub fn level(&self, v: u8) -> f64 {
        bezier_by_x(self.x1, self.y1, self.x2, self.y2, f64::from(v) / 255.0)[1] * 255.0
    }
}

/// Lazily filled 256-entry lookup table over [`CurvePoints::level`].
struct CurveLut {
    points: CurvePoints,
    memo: [Option<u8>; 256],
}

impl CurveLut {
    fn new(points: CurvePoints) -> Self {
        Self {
            points,
            memo: [None; 256],
        }
    }

    fn get(&mut self, v: u8) -> u8 {
        let points = self.points;
        *self.memo[usize::from(v)].get_or_insert_with(|| store(points.level(v)))
    }
}

/// Apply a Bézier tone curve to the color channels.
pub fn curves(mut buf: PixelBuffer, options: &FilterOptions) -> LaminateResult<PixelBuffer> {
    let mut lut = CurveLut::new(CurvePoints::from_options(options)?);
    for px in buf.data_mut().chunks_exact_mut(4) {
        for c in &mut px[..3] {
            *c = lut.get(*c);
        }
    }
    Ok(buf)
}

/// Move pixels by a per-pixel offset: output `(x, y)` samples input `(x - dx, y - dy)`.
pub fn displacement(buf: PixelBuffer, options: &FilterOptions) -> LaminateResult<PixelBuffer> {
    Ok(match &options.displace {
        Some(displace) => remap(&buf, |x, y| {
            let (dx, dy) = displace(x, y);
            (x - dx, y - dy)
        }),
        None => buf,
    })
}

/// Resample through a coordinate map: output `(x, y)` samples input `project(x, y)`.
///
/// Without a callback, a `spherize` object in the params builds the lens map.
pub fn projection(buf: PixelBuffer, options: &FilterOptions) -> LaminateResult<PixelBuffer> {
    if let Some(project) = &options.project {
        return Ok(remap(&buf, |x, y| project(x, y)));
    }
    match options.params.get("spherize") {
        None | Some(serde_json::Value::Null) => Ok(buf),
        Some(v) => {
            let params: SpherizeParams = serde_json::from_value(v.clone())
                .map_err(|e| LaminateError::filter(format!("invalid spherize options: {e}")))?;
            let map = spherize(params.cx, params.cy, params.radius, params.amount);
            Ok(remap(&buf, |x, y| map(x, y)))
        }
    }
}

fn remap(src: &PixelBuffer, map: impl Fn(f64, f64) -> (f64, f64)) -> PixelBuffer {
    let mut out = src.clone();
    for y in 0..i64::from(src.height()) {
        for x in 0..i64::from(src.width()) {
            let (sx, sy) = map(x as f64, y as f64);
            set_pixel(&mut out, x, y, quantize_truncating(sample_pixel(src, sx, sy)));
        }
    }
    out
}

fn quantize_truncating(c: [f64; 4]) -> [u8; 4] {
    c.map(store)
}

#[derive(serde::Deserialize)]
struct SpherizeParams {
    cx: f64,
    cy: f64,
    radius: f64,
    #[serde(default = "one")]
    amount: f64,
}

fn one() -> f64 {
    1.0
}

/// Lens projection centered on `(cx, cy)`.
///
/// Inside `radius`, a point at distance `d` samples from distance
/// `(d / radius)^amount * radius` on the same ray; outside it samples itself.
pub fn spherize(cx: f64, cy: f64, radius: f64, amount: f64) -> PixelMap {
    Arc::new(move |x, y| {
        let d = (x - cx).hypot(y - cy);
        if d >= radius || radius <= 0.0 {
            return (x, y);
        }
        let a = (y - cy).atan2(x - cx);
        let s = (d / radius).powf(amount) * radius;
        (cx + s * a.cos(), cy + s * a.sin())
    })
}

/// Chain coordinate maps; each receives the previous one's output.
pub fn compose_maps(maps: Vec<PixelMap>) -> PixelMap {
    Arc::new(move |x, y| maps.iter().fold((x, y), |(x, y), m| m(x, y)))
}

#[cfg(test)]
#[path = "../../tests/unit/effects/filters.rs"]
mod tests;
