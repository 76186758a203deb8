//! Content sniffing for fetched payloads.
//!
//! A payload is only handed to the decoder if its `Content-Type` claims an
//! image and its leading bytes match a known container signature.

/// Number of leading bytes needed to recognise every known signature.
pub const PEEK_LEN: usize = 12;

/// Container formats recognised by [`sniff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSignature {
    /// `FF D8 FF`.
    Jpeg,
    /// `89 50 4E 47`.
    Png,
    /// `GIF8`.
    Gif,
    /// `RIFF` followed by `WEBP` at offset 8.
    WebP,
    /// `BM`.
    Bmp,
    /// `II*\0` or `MM\0*`.
    Tiff,
    /// ISO-BMFF `ftyp` box with a `heic`, `heif` or `mif1` brand.
    Heif,
}

/// Identify the container format from the leading bytes of a payload.
///
/// Fewer than four bytes never match.
///
/// # Example
///
/// ```rust
/// use lambda_image_xform::signature::{sniff, ImageSignature};
///
/// assert_eq!(sniff(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A]), Some(ImageSignature::Png));
/// assert_eq!(sniff(b"<!DOCTYPE html>"), None);
/// ```
pub fn sniff(data: &[u8]) -> Option<ImageSignature> {
    if data.len() < 4 {
        return None;
    }

    match data {
        [0xFF, 0xD8, 0xFF, ..] => Some(ImageSignature::Jpeg),
        [0x89, b'P', b'N', b'G', ..] => Some(ImageSignature::Png),
        [b'G', b'I', b'F', b'8', ..] => Some(ImageSignature::Gif),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => {
            Some(ImageSignature::WebP)
        }
        [b'B', b'M', ..] => Some(ImageSignature::Bmp),
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => Some(ImageSignature::Tiff),
        [_, _, _, _, b'f', b't', b'y', b'p', brand @ ..] if is_heif_brand(brand) => {
            Some(ImageSignature::Heif)
        }
        _ => None,
    }
}

fn is_heif_brand(rest: &[u8]) -> bool {
    let Some(brand) = rest.get(..4) else {
        return false;
    };
    [b"heic", b"heif", b"mif1"]
        .iter()
        .any(|known| brand == known.as_slice())
}

/// Returns `true` if `content_type` names an `image/*` media type.
///
/// Comparison is case-insensitive and ignores parameters such as `charset`.
pub fn is_image_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence.starts_with("image/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_every_signature() {
        let cases: &[(&[u8], ImageSignature)] = &[
            (&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10], ImageSignature::Jpeg),
            (
                &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
                ImageSignature::Png,
            ),
            (b"GIF89a", ImageSignature::Gif),
            (b"GIF87a", ImageSignature::Gif),
            (b"RIFF\x24\x00\x00\x00WEBPVP8 ", ImageSignature::WebP),
            (b"BM\x36\x00\x00\x00", ImageSignature::Bmp),
            (&[0x49, 0x49, 0x2A, 0x00, 0x08], ImageSignature::Tiff),
            (&[0x4D, 0x4D, 0x00, 0x2A, 0x00], ImageSignature::Tiff),
            (b"\x00\x00\x00\x18ftypheic", ImageSignature::Heif),
            (b"\x00\x00\x00\x18ftypheif", ImageSignature::Heif),
            (b"\x00\x00\x00\x18ftypmif1", ImageSignature::Heif),
        ];

        for (data, expected) in cases {
            assert_eq!(sniff(data), Some(*expected), "{data:?}");
        }
    }

    #[test]
    fn rejects_non_images() {
        let cases: &[&[u8]] = &[
            b"<!DOCTYPE html><html>",
            b"<html>",
            b"{\"error\":1}",
            b"%PDF-1.7",
            b"RIFF\x24\x00\x00\x00WAVEfmt ",
            b"\x00\x00\x00\x18ftypmp42",
            b"\x00\x00\x00\x18ftyp",
        ];

        for data in cases {
            assert_eq!(sniff(data), None, "{data:?}");
        }
    }

    #[test]
    fn short_payloads_never_match() {
        assert_eq!(sniff(&[]), None);
        assert_eq!(sniff(&[0xFF, 0xD8, 0xFF]), None);
        assert_eq!(sniff(b"BM"), None);
    }

    #[test]
    fn content_type_checks() {
        assert!(is_image_content_type("image/jpeg"));
        assert!(is_image_content_type("IMAGE/PNG"));
        assert!(is_image_content_type(" image/webp ; charset=utf-8"));
        assert!(!is_image_content_type(""));
        assert!(!is_image_content_type("text/html"));
        assert!(!is_image_content_type("application/octet-stream"));
        assert!(!is_image_content_type("text/html; x=image/png"));
    }
}
