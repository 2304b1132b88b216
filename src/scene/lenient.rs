//! Document values that degrade instead of failing the parse.

use serde::{Deserialize, Serialize};

/// A keyword or number read from a document.
///
/// A value that does not parse as `T` is kept verbatim as
/// [`Lenient::Invalid`]: the layer falls back to the default and the render
/// reports it, while serializing writes back exactly what was read.
#[derive(Clone, Debug, PartialEq)]
pub enum Lenient<T> {
    Valid(T),
    Invalid(serde_json::Value),
}

impl<T> Lenient<T> {
    pub fn valid(&self) -> Option<&T> {
        match self {
            Self::Valid(v) => Some(v),
            Self::Invalid(_) => None,
        }
    }

    /// The raw value when it did not parse.
    pub fn invalid(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(v) => Some(v),
        }
    }
}

impl<T> From<T> for Lenient<T> {
    fn from(v: T) -> Self {
        Self::Valid(v)
    }
}

/// The parsed value of an optional field, or `T::default()` when the field is
/// absent or invalid.
pub fn or_default<T: Clone + Default>(field: Option<&Lenient<T>>) -> T {
    field.and_then(Lenient::valid).cloned().unwrap_or_default()
}

impl<'de, T: serde::de::DeserializeOwned> Deserialize<'de> for Lenient<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(match T::deserialize(&raw) {
            Ok(v) => Self::Valid(v),
            Err(e) => {
                tracing::debug!(value = %raw, error = %e, "keeping unparsed document value");
                Self::Invalid(raw)
            }
        })
    }
}

impl<T: Serialize> Serialize for Lenient<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Valid(v) => v.serialize(serializer),
            Self::Invalid(raw) => raw.serialize(serializer),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/lenient.rs"]
mod tests;
