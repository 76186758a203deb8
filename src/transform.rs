//! Decode, resize and re-encode source images.
use std::io::Cursor;

use image::{imageops::FilterType, DynamicImage, ImageReader};
use tracing::instrument;

use crate::{
    error::TransformError,
    image_type::{OutputImageType, WEBP},
    params::{Height, Quality, Width},
};

/// libwebp `method`, trading encode speed for size (0 fastest, 6 slowest).
const WEBP_METHOD: i32 = 4;

/// Largest width or height a WebP image can have.
pub const WEBP_MAX_DIMENSION: u32 = 16383;

/// Image produced by [`transform_image`].
#[derive(Debug)]
pub struct EncodedImage {
    /// Encoded bytes.
    pub bytes: Vec<u8>,
    /// Width of the encoded image.
    pub width: u32,
    /// Height of the encoded image.
    pub height: u32,
    /// Output type of `bytes`.
    pub image_type: OutputImageType,
}

/// Uniform scale factor that maps a `original_width`×`original_height`
/// image onto the requested bounds.
///
/// A zero bound leaves that axis unconstrained; when both are set the image
/// is contained within the box.
///
/// # Example
///
/// ```rust
/// use lambda_image_xform::transform::scale_factor;
///
/// assert_eq!(scale_factor(1600, 1200, 800, 0), 0.5);
/// assert_eq!(scale_factor(1600, 1200, 800, 300), 0.25);
/// assert_eq!(scale_factor(1600, 1200, 0, 0), 1.0);
/// ```
pub fn scale_factor(
    original_width: u32,
    original_height: u32,
    width: Width,
    height: Height,
) -> f64 {
    let scale_w = f64::from(width) / f64::from(original_width);
    let scale_h = f64::from(height) / f64::from(original_height);

    match (width > 0, height > 0) {
        (true, false) => scale_w,
        (false, true) => scale_h,
        (true, true) => scale_w.min(scale_h),
        (false, false) => 1.0,
    }
}

/// Dimensions of a `original_width`×`original_height` image after
/// applying [`scale_factor`]. Neither axis drops below one pixel.
pub fn target_dimensions(
    original_width: u32,
    original_height: u32,
    width: Width,
    height: Height,
) -> (u32, u32) {
    let scale = scale_factor(original_width, original_height, width, height);
    let scaled = |dimension: u32| ((f64::from(dimension) * scale).round() as u32).max(1);

    (scaled(original_width), scaled(original_height))
}

/// Decode `image_bytes`, resize to the requested bounds and encode as lossy
/// WebP at `quality`.
#[instrument(skip(image_bytes), fields(image_len = image_bytes.len()), err)]
pub fn transform_image(
    image_bytes: &[u8],
    width: Width,
    height: Height,
    quality: Quality,
) -> Result<EncodedImage, TransformError> {
    let image_reader = ImageReader::new(Cursor::new(image_bytes))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?;

    let mut image = image_reader.decode()?;

    let (original_width, original_height) = (image.width(), image.height());
    let (target_width, target_height) =
        target_dimensions(original_width, original_height, width, height);

    // Checked before resizing allocates the output buffer.
    if target_width > WEBP_MAX_DIMENSION || target_height > WEBP_MAX_DIMENSION {
        return Err(TransformError::TooLarge {
            width: target_width,
            height: target_height,
            max: WEBP_MAX_DIMENSION,
        });
    }

    if (target_width, target_height) != (original_width, original_height) {
        tracing::debug!(
            original_width,
            original_height,
            target_width,
            target_height,
            "resizing image"
        );
        image = image.resize_exact(target_width, target_height, FilterType::Lanczos3);
    }

    let bytes = encode_webp(&image, quality)?;

    Ok(EncodedImage {
        bytes,
        width: image.width(),
        height: image.height(),
        image_type: WEBP,
    })
}

fn encode_webp(image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, TransformError> {
    let (width, height) = (image.width(), image.height());

    // libwebp only takes 8-bit RGB or RGBA buffers.
    let pixels;
    let encoder = if image.color().has_alpha() {
        pixels = image.to_rgba8().into_raw();
        webp::Encoder::from_rgba(&pixels, width, height)
    } else {
        pixels = image.to_rgb8().into_raw();
        webp::Encoder::from_rgb(&pixels, width, height)
    };

    let mut config = webp::WebPConfig::new()
        .map_err(|()| TransformError::Encode("invalid encoder configuration".into()))?;
    config.lossless = 0;
    config.quality = f32::from(quality);
    config.method = WEBP_METHOD;
    config.use_sharp_yuv = 1;

    let encoded = encoder
        .encode_advanced(&config)
        .map_err(|err| TransformError::Encode(format!("{err:?}")))?;

    Ok(encoded.to_vec())
}
