use image::flat::NormalForm;
use image::{DynamicImage, GenericImageView, ImageBuffer, Pixel, Rgba};

/// Memory shape of a decoded image, decided once per image.
#[derive(Debug, Clone, Copy)]
pub enum PixelLayout<'a> {
    /// 8-bit channels, row-major, no row padding.
    PackedU8 { channels: u8, samples: &'a [u8] },
    /// 16-bit channels, row-major, no row padding.
    PackedU16 { channels: u8, samples: &'a [u16] },
    /// Anything else; read through [`PixelBuffer::sample`].
    Generic,
}

/// Read-only view over one decoded image.
pub struct PixelBuffer<'a> {
    image: &'a DynamicImage,
    layout: PixelLayout<'a>,
}

impl<'a> PixelBuffer<'a> {
    /// Classify by inspecting the sample layout of the decoded buffer.
    pub fn classify(image: &'a DynamicImage) -> Self {
        let layout = match image {
            DynamicImage::ImageLuma8(b) => packed_u8(b),
            DynamicImage::ImageLumaA8(b) => packed_u8(b),
            DynamicImage::ImageRgb8(b) => packed_u8(b),
            DynamicImage::ImageRgba8(b) => packed_u8(b),
            DynamicImage::ImageLuma16(b) => packed_u16(b),
            DynamicImage::ImageLumaA16(b) => packed_u16(b),
            DynamicImage::ImageRgb16(b) => packed_u16(b),
            DynamicImage::ImageRgba16(b) => packed_u16(b),
            _ => PixelLayout::Generic,
        };
        Self { image, layout }
    }

    pub fn layout(&self) -> PixelLayout<'a> {
        self.layout
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// RGBA sample at `(x, y)` widened to the full 16-bit range.
    ///
    /// 8-bit values are replicated into both bytes (`v * 257`), gray is
    /// copied into all three colour channels, images without alpha are
    /// opaque and float channels are clamped to `[0, 1]` before scaling.
    pub fn sample(&self, x: u32, y: u32) -> [u16; 4] {
        match self.image {
            DynamicImage::ImageLuma8(b) => widen(b.get_pixel(x, y)),
            DynamicImage::ImageLumaA8(b) => widen(b.get_pixel(x, y)),
            DynamicImage::ImageRgb8(b) => widen(b.get_pixel(x, y)),
            DynamicImage::ImageRgba8(b) => widen(b.get_pixel(x, y)),
            DynamicImage::ImageLuma16(b) => widen(b.get_pixel(x, y)),
            DynamicImage::ImageLumaA16(b) => widen(b.get_pixel(x, y)),
            DynamicImage::ImageRgb16(b) => widen(b.get_pixel(x, y)),
            DynamicImage::ImageRgba16(b) => widen(b.get_pixel(x, y)),
            DynamicImage::ImageRgb32F(b) => widen(b.get_pixel(x, y)),
            DynamicImage::ImageRgba32F(b) => widen(b.get_pixel(x, y)),
            other => widen(&other.get_pixel(x, y)),
        }
    }
}

fn packed_u8<P>(buf: &ImageBuffer<P, Vec<u8>>) -> PixelLayout<'_>
where
    P: Pixel<Subpixel = u8>,
{
    match packed_samples(buf) {
        Some((channels, samples)) => PixelLayout::PackedU8 { channels, samples },
        None => PixelLayout::Generic,
    }
}

fn packed_u16<P>(buf: &ImageBuffer<P, Vec<u16>>) -> PixelLayout<'_>
where
    P: Pixel<Subpixel = u16>,
{
    match packed_samples(buf) {
        Some((channels, samples)) => PixelLayout::PackedU16 { channels, samples },
        None => PixelLayout::Generic,
    }
}

/// Channel count and exactly `width * height * channels` samples, or `None`
/// when rows or channels are not tightly packed.
fn packed_samples<P>(buf: &ImageBuffer<P, Vec<P::Subpixel>>) -> Option<(u8, &[P::Subpixel])>
where
    P: Pixel,
{
    let flat = buf.as_flat_samples();
    let layout = &flat.layout;
    if !layout.is_normal(NormalForm::RowMajorPacked) {
        return None;
    }
    let len = layout.width as usize * layout.height as usize * layout.channels as usize;
    flat.samples.get(..len).map(|s| (layout.channels, s))
}

trait Widen: Copy {
    fn widen(self) -> u16;
}

impl Widen for u8 {
    fn widen(self) -> u16 {
        u16::from(self) * 257
    }
}

impl Widen for u16 {
    fn widen(self) -> u16 {
        self
    }
}

impl Widen for f32 {
    fn widen(self) -> u16 {
        (self.clamp(0.0, 1.0) * 65535.0).round() as u16
    }
}

fn widen<P>(pixel: &P) -> [u16; 4]
where
    P: Pixel,
    P::Subpixel: Widen,
{
    let Rgba(channels) = pixel.to_rgba();
    channels.map(Widen::widen)
}
