use crate::foundation::core::{Rgba, Rgba8, widen};
use crate::foundation::error::{LaminateError, LaminateResult};
use crate::foundation::math::clerp;

/// Straight-alpha RGBA8 pixels, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; byte_len(width, height)],
        }
    }

    /// Wrap existing bytes; `data` must hold exactly `width * height * 4` bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> LaminateResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| LaminateError::validation("pixel buffer size overflow"))?;
        if data.len() != expected {
            return Err(LaminateError::validation(format!(
                "pixel buffer expects {expected} bytes for {width}x{height}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Buffer filled with one color.
    pub fn filled(width: u32, height: u32, px: Rgba8) -> Self {
        Self {
            width,
            height,
            data: px.repeat(width as usize * height as usize),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    pub fn same_size(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height
    }

    fn offset(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }
}

fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

/// Pixel at `(x, y)`, or transparent black outside the buffer.
pub fn get_pixel(buf: &PixelBuffer, x: i64, y: i64) -> Rgba8 {
    match buf.offset(x, y) {
        Some(i) => [buf.data[i], buf.data[i + 1], buf.data[i + 2], buf.data[i + 3]],
        None => [0, 0, 0, 0],
    }
}

/// Write the pixel at `(x, y)`. Writes outside the buffer are dropped.
pub fn set_pixel(buf: &mut PixelBuffer, x: i64, y: i64, px: Rgba8) {
    if let Some(i) = buf.offset(x, y) {
        buf.data[i..i + 4].copy_from_slice(&px);
    }
}

/// Bilinear sample at fractional coordinates.
///
/// Neighbors outside the buffer count as transparent black.
pub fn sample_pixel(buf: &PixelBuffer, x: f64, y: f64) -> Rgba {
    let x1 = x.floor() as i64;
    let x2 = x.ceil() as i64;
    let y1 = y.floor() as i64;
    let y2 = y.ceil() as i64;
    let ix = ((x % 1.0) + 1.0) % 1.0;
    let iy = ((y % 1.0) + 1.0) % 1.0;
    let at = |px: i64, py: i64| widen(get_pixel(buf, px, py));
    clerp(
        clerp(at(x1, y1), at(x2, y1), ix),
        clerp(at(x1, y2), at(x2, y2), ix),
        iy,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/pixels/buffer.rs"]
mod tests;
