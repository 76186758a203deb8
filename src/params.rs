use std::num::{IntErrorKind, ParseIntError};

use aws_lambda_events::query_map::QueryMap;
use url::Url;

use crate::{config::Config, error::ParamError};

/// Width in pixels.
pub type Width = u32;
/// Height in pixels.
pub type Height = u32;
/// Encoder quality.
pub type Quality = u8;

/// Quality used when `q` is absent.
pub const DEFAULT_QUALITY: Quality = 80;

/// Validated parameters of a single optimization request.
///
/// A width or height of zero leaves that axis unconstrained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizeParams {
    /// Source image URL.
    pub url: Url,
    /// Requested width in pixels.
    pub width: Width,
    /// Requested height in pixels.
    pub height: Height,
    /// WebP quality, 1 to 100.
    pub quality: Quality,
}

impl OptimizeParams {
    /// Parse and validate `url`, `w`, `h` and `q` from the query string.
    pub fn from_query(query: &QueryMap, config: &Config) -> Result<Self, ParamError> {
        let url = parse_url(query.first("url"))?;
        let width = parse_width(query.first("w"), config.max_width())?;
        let height = parse_height(query.first("h"), config.max_height())?;
        let quality = parse_quality(query.first("q"))?;

        Ok(Self {
            url,
            width,
            height,
            quality,
        })
    }
}

/// Parse the required source URL. Only absolute `http` and `https` URLs
/// with a host are accepted.
pub fn parse_url(value: Option<&str>) -> Result<Url, ParamError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ParamError::Missing("url"))?;

    let url = Url::parse(value)?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(ParamError::UnsupportedScheme(other.to_owned())),
    }
    if url.host_str().is_none() {
        return Err(ParamError::MissingHost);
    }

    Ok(url)
}

/// Parse the optional width, `0` when absent.
pub fn parse_width(value: Option<&str>, max: Width) -> Result<Width, ParamError> {
    parse_bounded(value, "w", "width", 0, max).map(|width| width.unwrap_or(0))
}

/// Parse the optional height, `0` when absent.
pub fn parse_height(value: Option<&str>, max: Height) -> Result<Height, ParamError> {
    parse_bounded(value, "h", "height", 0, max).map(|height| height.unwrap_or(0))
}

/// Parse the optional quality, [`DEFAULT_QUALITY`] when absent.
pub fn parse_quality(value: Option<&str>) -> Result<Quality, ParamError> {
    let quality = parse_bounded(value, "q", "quality", 1, 100)?;
    // Bounded to 100 above.
    Ok(quality.map_or(DEFAULT_QUALITY, |q| q as Quality))
}

fn parse_bounded(
    value: Option<&str>,
    key: &'static str,
    field: &'static str,
    min: u32,
    max: u32,
) -> Result<Option<u32>, ParamError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    let parsed: i64 = value.parse().map_err(|err: ParseIntError| match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            ParamError::OutOfRange { field, min, max }
        }
        _ => ParamError::NotAnInteger(key),
    })?;
    if parsed < i64::from(min) || parsed > i64::from(max) {
        return Err(ParamError::OutOfRange { field, min, max });
    }

    Ok(Some(parsed as u32))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn query(pairs: &[(&str, &str)]) -> QueryMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>()
            .into()
    }

    #[test]
    fn applies_defaults() {
        let params = OptimizeParams::from_query(
            &query(&[("url", "https://example.com/a.jpg")]),
            &Config::default(),
        )
        .unwrap();

        assert_eq!(params.url.as_str(), "https://example.com/a.jpg");
        assert_eq!(params.width, 0);
        assert_eq!(params.height, 0);
        assert_eq!(params.quality, DEFAULT_QUALITY);
    }

    #[test]
    fn parses_every_field() {
        let params = OptimizeParams::from_query(
            &query(&[
                ("url", "https://example.com/a.jpg?v=2"),
                ("w", "800"),
                ("h", "600"),
                ("q", "90"),
            ]),
            &Config::default(),
        )
        .unwrap();

        assert_eq!(params.width, 800);
        assert_eq!(params.height, 600);
        assert_eq!(params.quality, 90);
        assert_eq!(params.url.query(), Some("v=2"));
    }

    #[test]
    fn url_is_required() {
        let err = OptimizeParams::from_query(&query(&[]), &Config::default()).unwrap_err();
        assert!(matches!(err, ParamError::Missing("url")));

        let err = parse_url(Some("  ")).unwrap_err();
        assert!(matches!(err, ParamError::Missing("url")));
    }

    #[test]
    fn url_must_be_absolute_http() {
        assert!(matches!(
            parse_url(Some("not-a-valid-url")),
            Err(ParamError::InvalidUrl(_))
        ));
        assert!(matches!(
            parse_url(Some("ftp://example.com/a.jpg")),
            Err(ParamError::UnsupportedScheme(scheme)) if scheme == "ftp"
        ));
        assert!(matches!(
            parse_url(Some("file:///etc/passwd")),
            Err(ParamError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn zero_dimensions_are_unconstrained() {
        assert_eq!(parse_width(Some("0"), 1800).unwrap(), 0);
        assert_eq!(parse_height(None, 1800).unwrap(), 0);
        assert_eq!(parse_width(Some(""), 1800).unwrap(), 0);
    }

    #[test]
    fn dimensions_are_bounded() {
        assert_eq!(parse_width(Some("1800"), 1800).unwrap(), 1800);

        let err = parse_width(Some("1801"), 1800).unwrap_err();
        assert_eq!(err.to_string(), "width must be between 0 and 1800");

        let err = parse_height(Some("-1"), 1200).unwrap_err();
        assert_eq!(err.to_string(), "height must be between 0 and 1200");
    }

    #[test]
    fn overflowing_integers_are_out_of_range() {
        let err = parse_width(Some("99999999999999999999"), 1800).unwrap_err();
        assert_eq!(err.to_string(), "width must be between 0 and 1800");

        let err = parse_height(Some("-99999999999999999999"), 1800).unwrap_err();
        assert_eq!(err.to_string(), "height must be between 0 and 1800");

        let err = parse_quality(Some("340282366920938463463374607431768211456")).unwrap_err();
        assert_eq!(err.to_string(), "quality must be between 1 and 100");
    }

    #[test]
    fn non_integers_are_rejected() {
        let err = parse_width(Some("wide"), 1800).unwrap_err();
        assert_eq!(err.to_string(), "invalid integer value for 'w' parameter");

        let err = parse_quality(Some("8.5")).unwrap_err();
        assert_eq!(err.to_string(), "invalid integer value for 'q' parameter");
    }

    #[test]
    fn quality_is_bounded() {
        assert_eq!(parse_quality(Some("1")).unwrap(), 1);
        assert_eq!(parse_quality(Some("100")).unwrap(), 100);

        for value in ["0", "101", "-20"] {
            let err = parse_quality(Some(value)).unwrap_err();
            assert_eq!(err.to_string(), "quality must be between 1 and 100");
        }
    }

    #[test]
    fn respects_configured_bounds() {
        let config = Config::default().set_max_dimensions(100, 50);
        let err = OptimizeParams::from_query(
            &query(&[("url", "https://example.com/a.jpg"), ("h", "51")]),
            &config,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ParamError::OutOfRange {
                field: "height",
                min: 0,
                max: 50
            }
        ));
    }
}
