//! Core domain types for the face detection pipeline.

mod bitmap;
mod error;
mod face;
mod notice;
mod page;
mod upload;

pub use bitmap::{Bitmap, GalleryImage};
pub use error::DecodeError;
pub use face::{Detection, FaceBox};
pub use notice::{Notice, Severity};
pub use page::{DisplayedImage, ImageReport, Page, Stage};
pub use upload::UploadedBlob;
