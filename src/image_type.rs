//! Output image type.
//!
//! Every optimized image is lossy WebP; this module pairs that format with
//! its media type so the response header is derived from one place.
use image::ImageFormat;
use mediatype::{names, MediaType};

const IMAGE_WEBP: MediaType = MediaType::new(names::IMAGE, names::WEBP);

/// Pair of [`MediaType`] and [`ImageFormat`].
#[derive(Debug, Clone)]
pub struct OutputImageType {
    /// Media type, such as "image/webp".
    pub media_type: MediaType<'static>,

    /// Image format, such as "WebP".
    pub image_format: ImageFormat,
}

impl OutputImageType {
    const fn new(media_type: MediaType<'static>, image_format: ImageFormat) -> Self {
        Self {
            media_type,
            image_format,
        }
    }

    /// `Content-Type` header value for this type.
    pub fn content_type(&self) -> String {
        self.media_type.to_string()
    }
}

/// WebP, the format every response is encoded in.
pub const WEBP: OutputImageType = OutputImageType::new(IMAGE_WEBP, ImageFormat::WebP);
