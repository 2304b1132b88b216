use std::sync::Arc;

use vello_cpu::peniko::color::PremulRgba8;

use crate::foundation::core::Size;
use crate::foundation::error::{LaminateError, LaminateResult};
use crate::pixels::PixelBuffer;

/// Shared, immutable raster image. Drawing never mutates it.
pub type ImageHandle = Arc<RasterImage>;

/// Largest image side the raster engine samples from.
pub const MAX_IMAGE_SIDE: u32 = u16::MAX as u32;

/// Decoded raster image.
///
/// Keeps the straight-alpha pixels it was built from next to the premultiplied
/// `vello_cpu` pixmap that drawing samples.
#[derive(Clone)]
pub struct RasterImage {
    pixels: PixelBuffer,
    pixmap: Arc<vello_cpu::Pixmap>,
}

impl RasterImage {
    /// Build from straight-alpha RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, rgba: &[u8]) -> LaminateResult<Self> {
        if width > MAX_IMAGE_SIDE || height > MAX_IMAGE_SIDE {
            return Err(LaminateError::validation(format!(
                "image {width}x{height} exceeds {MAX_IMAGE_SIDE} pixels per side"
            )));
        }
        Ok(Self::from_pixels(PixelBuffer::from_raw(width, height, rgba.to_vec())?))
    }

    /// Build from a straight-alpha pixel buffer. Buffers wider or taller than
    /// [`MAX_IMAGE_SIDE`] keep their pixels but draw nothing.
    pub fn from_pixels(pixels: PixelBuffer) -> Self {
        let premul = pixels
            .data()
            .chunks_exact(4)
            .map(|px| premultiply_rgba8([px[0], px[1], px[2], px[3]]))
            .collect();
        let pixmap = pixmap_from_premul(premul, pixels.width(), pixels.height());
        Self {
            pixels,
            pixmap: Arc::new(pixmap),
        }
    }

    /// Wrap premultiplied `0.0..=1.0` texels produced by a canvas.
    pub(crate) fn from_premul(width: u32, height: u32, texels: &[[f32; 4]]) -> Self {
        debug_assert_eq!(texels.len(), width as usize * height as usize);
        let mut pixels = PixelBuffer::new(width, height);
        for (dst, src) in pixels.data_mut().chunks_exact_mut(4).zip(texels) {
            dst.copy_from_slice(&unpremultiply(*src));
        }
        let premul = texels
            .iter()
            .map(|t| PremulRgba8::from_u8_array(t.map(unit_to_u8)))
            .collect();
        Self {
            pixels,
            pixmap: Arc::new(pixmap_from_premul(premul, width, height)),
        }
    }

    /// Uniformly colored image, handy for fixtures.
    pub fn solid(width: u16, height: u16, rgba: [u8; 4]) -> Self {
        let premul = vec![premultiply_rgba8(rgba); usize::from(width) * usize::from(height)];
        Self {
            pixels: PixelBuffer::filled(u32::from(width), u32::from(height), rgba),
            pixmap: Arc::new(vello_cpu::Pixmap::from_parts(premul, width, height)),
        }
    }

    /// Decode PNG/JPEG/... bytes with the `image` crate.
    pub fn decode(bytes: &[u8]) -> Result<Self, ::image::ImageError> {
        let mut reader = ::image::ImageReader::new(std::io::Cursor::new(bytes)).with_guessed_format()?;
        let mut limits = ::image::Limits::default();
        limits.max_image_width = Some(MAX_IMAGE_SIDE);
        limits.max_image_height = Some(MAX_IMAGE_SIDE);
        reader.limits(limits);

        let rgba = reader.decode()?.to_rgba8();
        let (width, height) = rgba.dimensions();
        let pixels = PixelBuffer::from_raw(width, height, rgba.into_raw()).map_err(|_| {
            ::image::ImageError::Parameter(::image::error::ParameterError::from_kind(
                ::image::error::ParameterErrorKind::DimensionMismatch,
            ))
        })?;
        Ok(Self::from_pixels(pixels))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width()), f64::from(self.height()))
    }

    /// Straight-alpha pixels, as built.
    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Straight-alpha copy of the image.
    pub fn to_pixels(&self) -> PixelBuffer {
        self.pixels.clone()
    }

    /// `vello_cpu` image paint over the premultiplied pixmap, or `None` when the
    /// image has no drawable texels.
    pub(crate) fn paint(&self) -> Option<vello_cpu::Image> {
        if self.pixmap.width() == 0 || self.pixmap.height() == 0 {
            return None;
        }
        Some(vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(self.pixmap.clone()),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        })
    }
}

impl PartialEq for RasterImage {
    fn eq(&self, other: &Self) -> bool {
        self.pixels == other.pixels
    }
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish_non_exhaustive()
    }
}

fn pixmap_from_premul(premul: Vec<PremulRgba8>, width: u32, height: u32) -> vello_cpu::Pixmap {
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => vello_cpu::Pixmap::from_parts(premul, w, h),
        _ => {
            tracing::warn!(width, height, "image too large to draw");
            vello_cpu::Pixmap::new(0, 0)
        }
    }
}

fn premultiply_rgba8(px: [u8; 4]) -> PremulRgba8 {
    let a = u16::from(px[3]);
    let premul = |c: u8| ((u16::from(c) * a + 127) / 255) as u8;
    PremulRgba8::from_u8_array([premul(px[0]), premul(px[1]), premul(px[2]), px[3]])
}

fn unit_to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

pub(crate) fn premultiply(px: [u8; 4]) -> [f32; 4] {
    let a = f32::from(px[3]) / 255.0;
    [
        f32::from(px[0]) / 255.0 * a,
        f32::from(px[1]) / 255.0 * a,
        f32::from(px[2]) / 255.0 * a,
        a,
    ]
}

pub(crate) fn unpremultiply(px: [f32; 4]) -> [u8; 4] {
    let a = px[3].clamp(0.0, 1.0);
    if a <= 0.0 {
        return [0, 0, 0, 0];
    }
    [
        unit_to_u8(px[0] / a),
        unit_to_u8(px[1] / a),
        unit_to_u8(px[2] / a),
        unit_to_u8(a),
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/assets/image.rs"]
mod tests;
