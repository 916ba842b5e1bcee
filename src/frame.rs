use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb8,
    Rgba8,
    Bgra8,
    Gray8,
    /// Biplanar 4:2:0 YUV as delivered by most camera sensors. Not convertible.
    Nv12,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> Option<usize> {
        match self {
            PixelFormat::Rgb8 => Some(3),
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => Some(4),
            PixelFormat::Gray8 => Some(1),
            PixelFormat::Nv12 => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    #[error("pixel format {0:?} cannot be converted to an image")]
    UnsupportedFormat(PixelFormat),
    #[error("frame is empty ({width}x{height})")]
    Empty { width: u32, height: u32 },
    #[error("expected {expected} bytes for a {width}x{height} {format:?} frame, got {actual}")]
    BufferSize {
        format: PixelFormat,
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// One captured camera image. Pixel data is shared so a frame can be handed to the
/// classifier and the display without copying.
#[derive(Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub orientation: Orientation,
    pub data: Arc<Vec<u8>>,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("orientation", &self.orientation)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl Frame {
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        orientation: Orientation,
        data: Vec<u8>,
    ) -> Self {
        Self {
            width,
            height,
            format,
            orientation,
            data: Arc::new(data),
        }
    }

    pub fn solid_color(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self::new(width, height, PixelFormat::Rgb8, Orientation::Portrait, data)
    }

    pub fn from_image(image: &DynamicImage, orientation: Orientation) -> Self {
        let rgb = image.to_rgb8();
        Self::new(
            rgb.width(),
            rgb.height(),
            PixelFormat::Rgb8,
            orientation,
            rgb.into_raw(),
        )
    }

    /// Decodes the pixel buffer into an upright image.
    pub fn to_image(&self) -> Result<DynamicImage, ConversionError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConversionError::Empty {
                width: self.width,
                height: self.height,
            });
        }

        let bytes_per_pixel = self
            .format
            .bytes_per_pixel()
            .ok_or(ConversionError::UnsupportedFormat(self.format))?;

        let expected = self.width as usize * self.height as usize * bytes_per_pixel;
        if self.data.len() != expected {
            return Err(self.buffer_size_error(expected));
        }

        let raw = self.data.as_ref().clone();
        let image = match self.format {
            PixelFormat::Rgb8 => RgbImage::from_raw(self.width, self.height, raw)
                .map(DynamicImage::ImageRgb8),
            PixelFormat::Rgba8 => RgbaImage::from_raw(self.width, self.height, raw)
                .map(DynamicImage::ImageRgba8),
            PixelFormat::Bgra8 => {
                let swapped = raw
                    .chunks_exact(4)
                    .flat_map(|p| [p[2], p[1], p[0], p[3]])
                    .collect();
                RgbaImage::from_raw(self.width, self.height, swapped)
                    .map(DynamicImage::ImageRgba8)
            }
            PixelFormat::Gray8 => GrayImage::from_raw(self.width, self.height, raw)
                .map(DynamicImage::ImageLuma8),
            PixelFormat::Nv12 => None,
        }
        .ok_or_else(|| self.buffer_size_error(expected))?;

        Ok(match self.orientation {
            Orientation::Portrait => image,
            Orientation::PortraitUpsideDown => image.rotate180(),
            Orientation::LandscapeLeft => image.rotate270(),
            Orientation::LandscapeRight => image.rotate90(),
        })
    }

    fn buffer_size_error(&self, expected: usize) -> ConversionError {
        ConversionError::BufferSize {
            format: self.format,
            width: self.width,
            height: self.height,
            expected,
            actual: self.data.len(),
        }
    }
}
