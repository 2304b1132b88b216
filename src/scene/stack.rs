use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::foundation::core::{Rect, Size};
use crate::foundation::error::{LaminateError, LaminateResult};
use crate::scene::model::{Layer, LayerContent};

/// Largest canvas side a stack may ask for.
pub const MAX_SIDE: u32 = u16::MAX as u32;

/// A canvas size plus an ordered list of layers; index 0 is drawn on top.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<Layer>,
}

/// Addresses a top-level layer by index or by name (first match wins).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerId {
    Index(usize),
    Name(String),
}

impl From<usize> for LayerId {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

impl From<&str> for LayerId {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for LayerId {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl Stack {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layers: Vec::new(),
        }
    }

    /// Append a layer below the existing ones.
    pub fn push(&mut self, layer: Layer) -> &mut Self {
        self.layers.push(layer);
        self
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    fn position(&self, id: &LayerId) -> Option<usize> {
        match id {
            LayerId::Index(i) => (*i < self.layers.len()).then_some(*i),
            LayerId::Name(name) => self
                .layers
                .iter()
                .position(|l| l.name.as_deref() == Some(name.as_str())),
        }
    }

    pub fn layer(&self, id: impl Into<LayerId>) -> Option<&Layer> {
        let i = self.position(&id.into())?;
        self.layers.get(i)
    }

    pub fn layer_mut(&mut self, id: impl Into<LayerId>) -> Option<&mut Layer> {
        let i = self.position(&id.into())?;
        self.layers.get_mut(i)
    }

    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// The canvas rectangle `(0, 0, width, height)`.
    pub fn rect(&self) -> Rect {
        self.size().to_rect()
    }

    /// Structural checks a render would otherwise trip over.
    pub fn validate(&self) -> LaminateResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(LaminateError::validation(format!(
                "stack dimensions must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width > MAX_SIDE || self.height > MAX_SIDE {
            return Err(LaminateError::validation(format!(
                "stack dimensions must be at most {MAX_SIDE}, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Number of layers including those nested in groups.
    pub fn layer_count(&self) -> usize {
        fn count(layers: &[Layer]) -> usize {
            layers
                .iter()
                .map(|l| match &l.content {
                    LayerContent::Group(children) => 1 + count(children),
                    _ => 1,
                })
                .sum()
        }
        count(&self.layers)
    }

    pub fn from_json_str(s: &str) -> LaminateResult<Self> {
        let stack: Self = serde_json::from_str(s)?;
        stack.validate()?;
        Ok(stack)
    }

    pub fn from_path(path: &Path) -> LaminateResult<Self> {
        let s = std::fs::read_to_string(path).map_err(|e| {
            LaminateError::validation(format!("read stack '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&s)
    }

    pub fn to_json(&self) -> LaminateResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> LaminateResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/stack.rs"]
mod tests;
