//! Decoded pixel buffers and their display counterpart.
//!
//! A [`Bitmap`] always holds pixels in blue-green-red order, the order the
//! detector and the annotator work in. The only way to get a red-green-blue
//! image out of it is [`Bitmap::into_display`], which consumes the bitmap, so
//! the conversion for display happens exactly once and only after annotation.

use std::io::Cursor;

use anyhow::{Context, Result};
use base64::Engine;
use exif::{In, Reader as ExifReader, Tag};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, RgbImage};

use super::DecodeError;

/// Three-channel buffer whose slots hold blue, green, red (in that order).
pub(crate) type BgrBuffer = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// A decoded image in blue-green-red channel order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    buffer: BgrBuffer,
}

impl Bitmap {
    /// Decodes an encoded image (PNG or JPEG, sniffed from the bytes).
    ///
    /// An EXIF orientation tag, when present, is applied so the bitmap is
    /// upright.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the bytes are empty, in an unknown format,
    /// or malformed.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let decoded = image::load_from_memory(bytes).map_err(|e| match e {
            image::ImageError::Unsupported(u) => DecodeError::Unsupported(u.to_string()),
            other => DecodeError::Malformed(other.to_string()),
        })?;

        let rgb = apply_orientation(decoded, exif_orientation(bytes)).to_rgb8();
        if rgb.width() == 0 || rgb.height() == 0 {
            return Err(DecodeError::ZeroDimensions);
        }

        Ok(Self::from_rgb(rgb))
    }

    /// Builds a bitmap from a red-green-blue image, swapping into detector order.
    #[must_use]
    pub fn from_rgb(rgb: RgbImage) -> Self {
        let mut buffer = rgb;
        swap_red_blue(&mut buffer);
        Self { buffer }
    }

    /// Builds a bitmap of the given size with every pixel set to `bgr`.
    #[must_use]
    pub fn filled(width: u32, height: u32, bgr: [u8; 3]) -> Self {
        Self {
            buffer: ImageBuffer::from_pixel(width, height, Rgb(bgr)),
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// `(width, height)` in pixels.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// Returns the `[blue, green, red]` value at `(x, y)`, or `None` if out of bounds.
    #[must_use]
    pub fn bgr_at(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        self.buffer.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Copies the pixels into a red-green-blue image without consuming the bitmap.
    ///
    /// Meant for detector backends that need the other channel order as
    /// model input; the bitmap itself stays in detector order.
    #[must_use]
    pub fn to_rgb_image(&self) -> RgbImage {
        let mut rgb = self.buffer.clone();
        swap_red_blue(&mut rgb);
        rgb
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut BgrBuffer {
        &mut self.buffer
    }

    /// Converts to display channel order and attaches a caption.
    #[must_use]
    pub fn into_display(self, caption: impl Into<String>) -> GalleryImage {
        let mut image = self.buffer;
        swap_red_blue(&mut image);
        GalleryImage {
            caption: caption.into(),
            image,
        }
    }
}

/// An annotated image in red-green-blue order, ready for the display sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryImage {
    caption: String,
    image: RgbImage,
}

impl GalleryImage {
    /// Caption shown under the image.
    #[must_use]
    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// The display-order pixels.
    #[must_use]
    pub const fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Encodes the image as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder fails.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .with_context(|| format!("Failed to encode PNG for '{}'", self.caption))?;
        Ok(bytes)
    }

    /// Encodes the image as a `data:image/png;base64,...` URI.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn to_data_uri(&self) -> Result<String> {
        let png = self.encode_png()?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(png);
        Ok(format!("data:image/png;base64,{encoded}"))
    }
}

/// EXIF orientation of the primary image, `1` (upright) when absent.
fn exif_orientation(bytes: &[u8]) -> u32 {
    ExifReader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .unwrap_or(1)
}

fn apply_orientation(image: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

fn swap_red_blue(buffer: &mut BgrBuffer) {
    for pixel in buffer.pixels_mut() {
        pixel.0.swap(0, 2);
    }
}
