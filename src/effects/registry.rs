use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use futures::FutureExt as _;
use futures::future::BoxFuture;

use crate::foundation::error::{LaminateError, LaminateResult};
use crate::pixels::PixelBuffer;

/// Per-pixel coordinate map used by the displacement and projection filters.
pub type PixelMap = Arc<dyn Fn(f64, f64) -> (f64, f64) + Send + Sync>;

/// Future returned by [`Filter::apply`].
pub type FilterFuture<'a> = BoxFuture<'a, LaminateResult<PixelBuffer>>;

/// A whole-buffer pixel transform.
///
/// Plain functions `fn(PixelBuffer, &FilterOptions) -> LaminateResult<PixelBuffer>`
/// implement this trait directly; implement it by hand for filters that need to
/// suspend.
pub trait Filter: Send + Sync {
    /// Transform `input`. The result must keep the input dimensions.
    fn apply<'a>(&'a self, input: PixelBuffer, options: &'a FilterOptions) -> FilterFuture<'a>;
}

impl<F> Filter for F
where
    F: Fn(PixelBuffer, &FilterOptions) -> LaminateResult<PixelBuffer> + Send + Sync,
{
    fn apply<'a>(&'a self, input: PixelBuffer, options: &'a FilterOptions) -> FilterFuture<'a> {
        futures::future::ready(self(input, options)).boxed()
    }
}

/// Options forwarded to a filter.
///
/// `params` is the serializable `filterOptions` object from the document; the
/// closures are run-time only.
#[derive(Clone, Default)]
pub struct FilterOptions {
    /// Document-authored options.
    pub params: serde_json::Value,
    /// Displacement callback: returns `(dx, dy)` for an output pixel.
    pub displace: Option<PixelMap>,
    /// Projection callback: returns the source coordinate for an output pixel.
    pub project: Option<PixelMap>,
}

impl FilterOptions {
    /// Options carrying only document params.
    pub fn with_params(params: serde_json::Value) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Attach a displacement callback.
    pub fn displace(mut self, f: impl Fn(f64, f64) -> (f64, f64) + Send + Sync + 'static) -> Self {
        self.displace = Some(Arc::new(f));
        self
    }

    /// Attach a projection callback.
    pub fn project(mut self, f: impl Fn(f64, f64) -> (f64, f64) + Send + Sync + 'static) -> Self {
        self.project = Some(Arc::new(f));
        self
    }

    /// `true` when a run-time callback is attached.
    pub fn has_callbacks(&self) -> bool {
        self.displace.is_some() || self.project.is_some()
    }

    /// Numeric param, `None` when absent or null.
    pub fn number(&self, key: &str) -> LaminateResult<Option<f64>> {
        match self.params.get(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(v) => {
                let n = v.as_f64().ok_or_else(|| {
                    LaminateError::filter(format!("filter option '{key}' must be a number"))
                })?;
                if !n.is_finite() {
                    return Err(LaminateError::filter(format!(
                        "filter option '{key}' must be finite"
                    )));
                }
                Ok(Some(n))
            }
        }
    }
}

impl PartialEq for FilterOptions {
    /// Params compare by value, callbacks by identity.
    fn eq(&self, other: &Self) -> bool {
        fn same(a: &Option<PixelMap>, b: &Option<PixelMap>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
                (None, None) => true,
                _ => false,
            }
        }
        self.params == other.params
            && same(&self.displace, &other.displace)
            && same(&self.project, &other.project)
    }
}

impl fmt::Debug for FilterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterOptions")
            .field("params", &self.params)
            .field("displace", &self.displace.as_ref().map(|_| "<fn>"))
            .field("project", &self.project.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Name → filter table consulted by the compositor.
#[derive(Clone)]
pub struct FilterRegistry {
    filters: BTreeMap<String, Arc<dyn Filter>>,
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl FilterRegistry {
    /// Registry with no filters at all.
    pub fn empty() -> Self {
        Self {
            filters: BTreeMap::new(),
        }
    }

    /// Registry pre-populated with `grayscale`, `contrast`, `curves`,
    /// `displacement` and `projection`.
    pub fn with_builtins() -> Self {
        use crate::effects::filters;

        let mut reg = Self::empty();
        reg.register("grayscale", filters::grayscale);
        reg.register("contrast", filters::contrast);
        reg.register("curves", filters::curves);
        reg.register("displacement", filters::displacement);
        reg.register("projection", filters::projection);
        reg
    }

    /// Add or replace a named filter.
    pub fn register(&mut self, name: impl Into<String>, filter: impl Filter + 'static) -> &mut Self {
        self.filters.insert(name.into(), Arc::new(filter));
        self
    }

    /// Add or replace a named filter that is already shared.
    pub fn register_shared(&mut self, name: impl Into<String>, filter: Arc<dyn Filter>) -> &mut Self {
        self.filters.insert(name.into(), filter);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Filter>> {
        self.filters.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/registry.rs"]
mod tests;
