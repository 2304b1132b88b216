use std::fmt;

use serde::{Deserialize, Serialize};

/// Which axis a [`Dimension`] is resolved along.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal; accepts `left`, `right`, `center`.
    X,
    /// Vertical; accepts `top`, `bottom`, `center`.
    Y,
}

/// Named position along an axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keyword {
    /// Start of the x axis.
    Left,
    /// End of the x axis.
    Right,
    /// Start of the y axis.
    Top,
    /// End of the y axis.
    Bottom,
    /// Midpoint of either axis.
    Center,
}

impl Keyword {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            "center" => Some(Self::Center),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Center => "center",
        }
    }

    /// Fraction of the extent this keyword denotes on `axis`, or `None` when the
    /// keyword belongs to the other axis.
    fn fraction(self, axis: Axis) -> Option<f64> {
        match (self, axis) {
            (Self::Left, Axis::X) | (Self::Top, Axis::Y) => Some(0.0),
            (Self::Right, Axis::X) | (Self::Bottom, Axis::Y) => Some(1.0),
            (Self::Center, _) => Some(0.5),
            _ => None,
        }
    }
}

/// A mixed-unit coordinate or length as authored in a document.
///
/// JSON forms: a number (`40`), a percent string (`"12.5%"`) or a keyword
/// (`"left"`). Anything else deserializes to [`Dimension::Auto`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Dimension {
    /// Literal pixels.
    Absolute(f64),
    /// Percentage as written, e.g. `12.5` for `"12.5%"`.
    Percent(f64),
    /// Named position.
    Keyword(Keyword),
    /// Unset; resolves to the midpoint.
    #[default]
    Auto,
}

impl Dimension {
    /// Returns `true` for [`Dimension::Auto`].
    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }

    /// Parse the string form. Only `^\d+(\.\d+)?%$` counts as a percentage.
    pub fn parse(s: &str) -> Self {
        if let Some(pct) = parse_percent(s) {
            return Self::Percent(pct);
        }
        Keyword::parse(s).map_or(Self::Auto, Self::Keyword)
    }

    /// Resolve against `extent` along `axis`; `Auto` and wrong-axis keywords yield
    /// the midpoint.
    pub fn resolve(&self, axis: Axis, extent: f64) -> f64 {
        match *self {
            Self::Absolute(v) => v,
            Self::Percent(p) => extent * p / 100.0,
            Self::Keyword(k) => extent * k.fraction(axis).unwrap_or(0.5),
            Self::Auto => extent / 2.0,
        }
    }

    /// Resolve as a length: numbers are literal, percentages scale `extent`,
    /// everything else is `None`.
    pub fn length(&self, extent: f64) -> Option<f64> {
        match *self {
            Self::Absolute(v) => Some(v),
            Self::Percent(p) => Some(extent * p / 100.0),
            Self::Keyword(_) | Self::Auto => None,
        }
    }
}

/// Parse `"NN%"` / `"NN.NN%"` into `NN`.
pub fn parse_percent(s: &str) -> Option<f64> {
    let digits = s.strip_suffix('%')?;
    let (int, frac) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int) || frac.is_some_and(|f| !all_digits(f)) {
        return None;
    }
    digits.parse::<f64>().ok()
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(v) => write!(f, "{v}"),
            Self::Percent(p) => write!(f, "{p}%"),
            Self::Keyword(k) => f.write_str(k.as_str()),
            Self::Auto => f.write_str("auto"),
        }
    }
}

impl Serialize for Dimension {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Absolute(v) => serialize_number(*v, serializer),
            Self::Auto => serializer.serialize_none(),
            other => serializer.collect_str(other),
        }
    }
}

/// Serialize whole numbers as JSON integers so documents round-trip unchanged.
pub(crate) fn serialize_number<S>(v: f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    if v.fract() == 0.0 && v.abs() < 9.0e15 {
        serializer.serialize_i64(v as i64)
    } else {
        serializer.serialize_f64(v)
    }
}

impl<'de> Deserialize<'de> for Dimension {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(f64),
            Str(String),
            Other(serde::de::IgnoredAny),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Num(v) => Self::Absolute(v),
            Repr::Str(s) => Self::parse(&s),
            Repr::Other(_) => Self::Auto,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/dimension.rs"]
mod tests;
