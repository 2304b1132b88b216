//! Raw RGBA pixel access shared by the filters and the CPU canvas.

pub mod buffer;

pub use buffer::{PixelBuffer, get_pixel, sample_pixel, set_pixel};
