use std::fmt;
use std::str::FromStr;

use crate::foundation::core::Rgba8;

/// Straight-alpha RGBA8 color parsed from a CSS color string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub fn to_rgba8(self) -> Rgba8 {
        [self.r, self.g, self.b, self.a]
    }

    /// The same color as `vello_cpu` paints it.
    pub fn to_peniko(self) -> vello_cpu::peniko::Color {
        vello_cpu::peniko::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

/// Error returned for strings that are not a supported CSS color.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color \"{input}\": {reason}")]
pub struct ColorParseError {
    pub input: String,
    pub reason: &'static str,
}

impl FromStr for Color {
    type Err = ColorParseError;

    /// Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()`,
    /// `hsl()`, `hsla()` and named colors (case-insensitive).
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let err = |reason| ColorParseError {
            input: input.to_owned(),
            reason,
        };
        let s = input.trim().to_ascii_lowercase();

        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| err("expected #rgb, #rgba, #rrggbb or #rrggbbaa"));
        }
        if let Some(args) = function_args(&s, &["rgba", "rgb"]) {
            return parse_rgb(args).ok_or_else(|| err("expected rgb(r, g, b[, a])"));
        }
        if let Some(args) = function_args(&s, &["hsla", "hsl"]) {
            return parse_hsl(args).ok_or_else(|| err("expected hsl(h, s%, l%[, a])"));
        }
        named(&s).ok_or_else(|| err("unknown color name"))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r, self.g, self.b, self.a
        )
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Color::rgba(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

fn function_args<'a>(s: &'a str, names: &[&str]) -> Option<Vec<&'a str>> {
    let name = names.iter().find(|n| s.starts_with(**n))?;
    let inner = s[name.len()..].trim().strip_prefix('(')?.strip_suffix(')')?;
    let args: Vec<&str> = inner
        .split([',', ' ', '/'])
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .collect();
    Some(args)
}

fn channel(arg: &str) -> Option<u8> {
    let v = match arg.strip_suffix('%') {
        Some(p) => p.parse::<f64>().ok()? / 100.0 * 255.0,
        None => arg.parse::<f64>().ok()?,
    };
    v.is_finite().then(|| v.round().clamp(0.0, 255.0) as u8)
}

fn alpha(arg: Option<&&str>) -> Option<u8> {
    let Some(arg) = arg else {
        return Some(255);
    };
    let v = match arg.strip_suffix('%') {
        Some(p) => p.parse::<f64>().ok()? / 100.0,
        None => arg.parse::<f64>().ok()?,
    };
    v.is_finite()
        .then(|| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn parse_rgb(args: Vec<&str>) -> Option<Color> {
    if !(3..=4).contains(&args.len()) {
        return None;
    }
    Some(Color::rgba(
        channel(args[0])?,
        channel(args[1])?,
        channel(args[2])?,
        alpha(args.get(3))?,
    ))
}

fn parse_hsl(args: Vec<&str>) -> Option<Color> {
    if !(3..=4).contains(&args.len()) {
        return None;
    }
    let h: f64 = args[0].trim_end_matches("deg").parse().ok()?;
    let s: f64 = args[1].strip_suffix('%')?.parse().ok()?;
    let l: f64 = args[2].strip_suffix('%')?.parse().ok()?;
    let [r, g, b] = hsl_to_rgb(h, s / 100.0, l / 100.0);
    let to_u8 = |x: f64| (x.clamp(0.0, 1.0) * 255.0).round() as u8;
    Some(Color::rgba(to_u8(r), to_u8(g), to_u8(b), alpha(args.get(3))?))
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> [f64; 3] {
    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return [l, l, l];
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;
    [
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    ]
}

fn named(name: &str) -> Option<Color> {
    let rgb = match name {
        "transparent" => return Some(Color::TRANSPARENT),
        "black" => 0x000000,
        "white" => 0xffffff,
        "red" => 0xff0000,
        "lime" => 0x00ff00,
        "green" => 0x008000,
        "blue" => 0x0000ff,
        "yellow" => 0xffff00,
        "cyan" | "aqua" => 0x00ffff,
        "magenta" | "fuchsia" => 0xff00ff,
        "silver" => 0xc0c0c0,
        "gray" | "grey" => 0x808080,
        "darkgray" | "darkgrey" => 0xa9a9a9,
        "lightgray" | "lightgrey" => 0xd3d3d3,
        "dimgray" | "dimgrey" => 0x696969,
        "slategray" | "slategrey" => 0x708090,
        "maroon" => 0x800000,
        "darkred" => 0x8b0000,
        "crimson" => 0xdc143c,
        "firebrick" => 0xb22222,
        "tomato" => 0xff6347,
        "coral" => 0xff7f50,
        "salmon" => 0xfa8072,
        "orangered" => 0xff4500,
        "orange" => 0xffa500,
        "darkorange" => 0xff8c00,
        "gold" => 0xffd700,
        "khaki" => 0xf0e68c,
        "olive" => 0x808000,
        "darkgreen" => 0x006400,
        "forestgreen" => 0x228b22,
        "seagreen" => 0x2e8b57,
        "lightgreen" => 0x90ee90,
        "limegreen" => 0x32cd32,
        "teal" => 0x008080,
        "turquoise" => 0x40e0d0,
        "navy" => 0x000080,
        "darkblue" => 0x00008b,
        "royalblue" => 0x4169e1,
        "steelblue" => 0x4682b4,
        "skyblue" => 0x87ceeb,
        "lightblue" => 0xadd8e6,
        "dodgerblue" => 0x1e90ff,
        "indigo" => 0x4b0082,
        "purple" => 0x800080,
        "rebeccapurple" => 0x663399,
        "violet" => 0xee82ee,
        "orchid" => 0xda70d6,
        "plum" => 0xdda0dd,
        "lavender" => 0xe6e6fa,
        "pink" => 0xffc0cb,
        "hotpink" => 0xff69b4,
        "deeppink" => 0xff1493,
        "brown" => 0xa52a2a,
        "chocolate" => 0xd2691e,
        "sienna" => 0xa0522d,
        "tan" => 0xd2b48c,
        "beige" => 0xf5f5dc,
        "ivory" => 0xfffff0,
        "wheat" => 0xf5deb3,
        _ => return None,
    };
    Some(Color::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8))
}

#[cfg(test)]
#[path = "../../tests/unit/paint/color.rs"]
mod tests;
