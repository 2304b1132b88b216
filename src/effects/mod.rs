//! Pixel filters and the registry the compositor resolves filter names through.

pub mod filters;
pub mod registry;

pub use registry::{Filter, FilterFuture, FilterOptions, FilterRegistry, PixelMap};
