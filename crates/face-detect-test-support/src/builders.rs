//! Synthetic uploads and bitmaps for testing.

use std::io::Cursor;

use face_detect_core::{Bitmap, UploadedBlob};
use image::{ImageFormat, Rgb, RgbImage};

/// Builder for creating synthetic test uploads.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    // === Valid uploads ===

    /// A PNG upload of a uniformly colored image.
    #[must_use]
    pub fn png(name: &str, width: u32, height: u32, rgb: [u8; 3]) -> UploadedBlob {
        UploadedBlob::new(name, encode(&RgbImage::from_pixel(width, height, Rgb(rgb)), ImageFormat::Png))
    }

    /// An all-black PNG upload.
    #[must_use]
    pub fn black_png(name: &str, width: u32, height: u32) -> UploadedBlob {
        Self::png(name, width, height, [0, 0, 0])
    }

    /// A JPEG upload of a uniformly colored image.
    #[must_use]
    pub fn jpeg(name: &str, width: u32, height: u32, rgb: [u8; 3]) -> UploadedBlob {
        UploadedBlob::new(name, encode(&RgbImage::from_pixel(width, height, Rgb(rgb)), ImageFormat::Jpeg))
    }

    /// A PNG upload with a light square "face" on a dark background.
    #[must_use]
    pub fn face_like_png(name: &str, width: u32, height: u32, face: [u32; 4]) -> UploadedBlob {
        let [fx, fy, fw, fh] = face;
        let img = RgbImage::from_fn(width, height, |x, y| {
            if (fx..fx + fw).contains(&x) && (fy..fy + fh).contains(&y) {
                Rgb([224, 172, 105])
            } else {
                Rgb([0, 0, 0])
            }
        });
        UploadedBlob::new(name, encode(&img, ImageFormat::Png))
    }

    // === Broken uploads ===

    /// A PNG cut in half: valid signature and header, truncated pixel data.
    #[must_use]
    pub fn truncated_png(name: &str) -> UploadedBlob {
        let full = Self::png(name, 32, 32, [40, 80, 120]).bytes;
        UploadedBlob::new(name, full[..full.len() / 2].to_vec())
    }

    /// Bytes that are not an image at all.
    #[must_use]
    pub fn garbage(name: &str) -> UploadedBlob {
        UploadedBlob::new(name, b"this is not an image".to_vec())
    }

    /// A zero-byte upload.
    #[must_use]
    pub fn empty(name: &str) -> UploadedBlob {
        UploadedBlob::new(name, Vec::new())
    }

    // === Bitmaps ===

    /// A decoded bitmap of one color, given in red-green-blue order.
    #[must_use]
    pub fn bitmap(width: u32, height: u32, rgb: [u8; 3]) -> Bitmap {
        Bitmap::from_rgb(RgbImage::from_pixel(width, height, Rgb(rgb)))
    }
}

#[allow(clippy::expect_used)]
fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format)
        .expect("in-memory encode");
    bytes
}
