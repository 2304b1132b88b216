//! Canvas composite operations over premultiplied `[f32; 4]` pixels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Composite operation used when a layer draws onto the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    SourceOver,
    SourceIn,
    SourceOut,
    SourceAtop,
    DestinationOver,
    DestinationIn,
    DestinationOut,
    DestinationAtop,
    Lighter,
    Copy,
    Xor,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    pub const ALL: [Self; 26] = [
        Self::SourceOver,
        Self::SourceIn,
        Self::SourceOut,
        Self::SourceAtop,
        Self::DestinationOver,
        Self::DestinationIn,
        Self::DestinationOut,
        Self::DestinationAtop,
        Self::Lighter,
        Self::Copy,
        Self::Xor,
        Self::Multiply,
        Self::Screen,
        Self::Overlay,
        Self::Darken,
        Self::Lighten,
        Self::ColorDodge,
        Self::ColorBurn,
        Self::HardLight,
        Self::SoftLight,
        Self::Difference,
        Self::Exclusion,
        Self::Hue,
        Self::Saturation,
        Self::Color,
        Self::Luminosity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SourceOver => "source-over",
            Self::SourceIn => "source-in",
            Self::SourceOut => "source-out",
            Self::SourceAtop => "source-atop",
            Self::DestinationOver => "destination-over",
            Self::DestinationIn => "destination-in",
            Self::DestinationOut => "destination-out",
            Self::DestinationAtop => "destination-atop",
            Self::Lighter => "lighter",
            Self::Copy => "copy",
            Self::Xor => "xor",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::Darken => "darken",
            Self::Lighten => "lighten",
            Self::ColorDodge => "color-dodge",
            Self::ColorBurn => "color-burn",
            Self::HardLight => "hard-light",
            Self::SoftLight => "soft-light",
            Self::Difference => "difference",
            Self::Exclusion => "exclusion",
            Self::Hue => "hue",
            Self::Saturation => "saturation",
            Self::Color => "color",
            Self::Luminosity => "luminosity",
        }
    }

    /// Modes that also affect destination pixels the source does not cover.
    ///
    /// Drawing with one of these must visit the whole surface, treating
    /// uncovered pixels as a transparent source.
    pub fn is_unbounded(self) -> bool {
        matches!(
            self,
            Self::SourceIn | Self::SourceOut | Self::DestinationIn | Self::DestinationAtop | Self::Copy
        )
    }

    /// Composite premultiplied `src` onto premultiplied `dst`.
    #[inline]
    pub fn apply(self, src: [f32; 4], dst: [f32; 4]) -> [f32; 4] {
        let (sa, da) = (src[3], dst[3]);
        match self {
            Self::SourceOver => porter_duff(src, dst, 1.0, 1.0 - sa),
            Self::SourceIn => porter_duff(src, dst, da, 0.0),
            Self::SourceOut => porter_duff(src, dst, 1.0 - da, 0.0),
            Self::SourceAtop => porter_duff(src, dst, da, 1.0 - sa),
            Self::DestinationOver => porter_duff(src, dst, 1.0 - da, 1.0),
            Self::DestinationIn => porter_duff(src, dst, 0.0, sa),
            Self::DestinationOut => porter_duff(src, dst, 0.0, 1.0 - sa),
            Self::DestinationAtop => porter_duff(src, dst, 1.0 - da, sa),
            Self::Lighter => porter_duff(src, dst, 1.0, 1.0),
            Self::Copy => src,
            Self::Xor => porter_duff(src, dst, 1.0 - da, 1.0 - sa),
            Self::Multiply => separable(src, dst, |s, d| s * d),
            Self::Screen => separable(src, dst, |s, d| s + d - s * d),
            Self::Overlay => separable(src, dst, |s, d| hard_light(d, s)),
            Self::Darken => separable(src, dst, f32::min),
            Self::Lighten => separable(src, dst, f32::max),
            Self::ColorDodge => separable(src, dst, |s, d| {
                if d <= 0.0 {
                    0.0
                } else if s >= 1.0 {
                    1.0
                } else {
                    (d / (1.0 - s)).min(1.0)
                }
            }),
            Self::ColorBurn => separable(src, dst, |s, d| {
                if d >= 1.0 {
                    1.0
                } else if s <= 0.0 {
                    0.0
                } else {
                    1.0 - ((1.0 - d) / s).min(1.0)
                }
            }),
            Self::HardLight => separable(src, dst, hard_light),
            Self::SoftLight => separable(src, dst, |s, d| {
                if s <= 0.5 {
                    d - (1.0 - 2.0 * s) * d * (1.0 - d)
                } else {
                    let g = if d <= 0.25 {
                        ((16.0 * d - 12.0) * d + 4.0) * d
                    } else {
                        d.sqrt()
                    };
                    d + (2.0 * s - 1.0) * (g - d)
                }
            }),
            Self::Difference => separable(src, dst, |s, d| (d - s).abs()),
            Self::Exclusion => separable(src, dst, |s, d| d + s - 2.0 * d * s),
            Self::Hue => non_separable(src, dst, |s, d| {
                set_lum(set_sat(s, sat(d)), lum(d))
            }),
            Self::Saturation => non_separable(src, dst, |s, d| {
                set_lum(set_sat(d, sat(s)), lum(d))
            }),
            Self::Color => non_separable(src, dst, |s, d| set_lum(s, lum(d))),
            Self::Luminosity => non_separable(src, dst, |s, d| set_lum(d, lum(s))),
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized composite operation name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown blend mode \"{0}\"")]
pub struct UnknownBlendMode(pub String);

impl FromStr for BlendMode {
    type Err = UnknownBlendMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownBlendMode(s.to_owned()))
    }
}

#[inline]
fn porter_duff(src: [f32; 4], dst: [f32; 4], fa: f32, fb: f32) -> [f32; 4] {
    std::array::from_fn(|i| (src[i] * fa + dst[i] * fb).min(1.0))
}

fn hard_light(s: f32, d: f32) -> f32 {
    if s <= 0.5 {
        2.0 * s * d
    } else {
        1.0 - 2.0 * (1.0 - s) * (1.0 - d)
    }
}

fn unpremul(px: [f32; 4]) -> [f32; 3] {
    let a = px[3];
    if a <= 0.0 {
        return [0.0; 3];
    }
    [
        (px[0] / a).clamp(0.0, 1.0),
        (px[1] / a).clamp(0.0, 1.0),
        (px[2] / a).clamp(0.0, 1.0),
    ]
}

/// Source-over with the blended color weighted by the overlap:
/// `out = sp (1 - da) + dp (1 - sa) + B(sc, dc) sa da`.
#[inline]
fn mix(src: [f32; 4], dst: [f32; 4], blended: [f32; 3]) -> [f32; 4] {
    let (sa, da) = (src[3], dst[3]);
    let mut out = [0.0; 4];
    for c in 0..3 {
        out[c] = (src[c] * (1.0 - da) + dst[c] * (1.0 - sa) + blended[c].clamp(0.0, 1.0) * sa * da)
            .clamp(0.0, 1.0);
    }
    out[3] = (sa + da * (1.0 - sa)).clamp(0.0, 1.0);
    out
}

#[inline]
fn separable(src: [f32; 4], dst: [f32; 4], f: impl Fn(f32, f32) -> f32) -> [f32; 4] {
    let (sc, dc) = (unpremul(src), unpremul(dst));
    mix(src, dst, std::array::from_fn(|c| f(sc[c], dc[c])))
}

#[inline]
fn non_separable(
    src: [f32; 4],
    dst: [f32; 4],
    f: impl Fn([f32; 3], [f32; 3]) -> [f32; 3],
) -> [f32; 4] {
    mix(src, dst, f(unpremul(src), unpremul(dst)))
}

fn lum(c: [f32; 3]) -> f32 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

fn clip_color(c: [f32; 3]) -> [f32; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 && l - n > 0.0 {
        out = out.map(|v| l + (v - l) * l / (l - n));
    }
    if x > 1.0 && x - l > 0.0 {
        out = out.map(|v| l + (v - l) * (1.0 - l) / (x - l));
    }
    out
}

fn set_lum(c: [f32; 3], l: f32) -> [f32; 3] {
    let d = l - lum(c);
    clip_color(c.map(|v| v + d))
}

fn sat(c: [f32; 3]) -> f32 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn set_sat(c: [f32; 3], s: f32) -> [f32; 3] {
    let max = c[0].max(c[1]).max(c[2]);
    let min = c[0].min(c[1]).min(c[2]);
    let range = max - min;
    if range <= 0.0 {
        return [0.0; 3];
    }
    c.map(|v| (v - min) * s / range)
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
