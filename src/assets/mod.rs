//! Raster image assets and the cached loading port.

pub mod image;
pub mod loader;

pub use image::{ImageHandle, RasterImage};
pub use loader::{FileImageSource, ImageLoader, ImageSource, LoadFuture, MemoryImageSource};
