//! Errors raised while serving an optimization request.
//!
//! Each concern has its own error type; [`OptimizeError`] composes them and
//! decides the status code and cache policy of the resulting response.
use http::StatusCode;

/// Cache policy applied to forbidden responses.
pub(crate) const FORBIDDEN_CACHE_CONTROL: &str = "public, max-age=60, s-maxage=60";

/// Cache policy applied to every other failure.
pub(crate) const ERROR_CACHE_CONTROL: &str = "public, max-age=259200, s-maxage=259200";

/// Errors produced while parsing query parameters.
#[derive(Debug, thiserror::Error)]
pub enum ParamError {
    /// A required parameter is absent or empty.
    #[error("missing '{0}' parameter")]
    Missing(&'static str),

    /// A numeric parameter could not be parsed as an integer.
    #[error("invalid integer value for '{0}' parameter")]
    NotAnInteger(&'static str),

    /// A numeric parameter is outside of its valid range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        /// Name of the field, e.g. `width`.
        field: &'static str,
        /// Smallest accepted value.
        min: u32,
        /// Largest accepted value.
        max: u32,
    },

    /// The `url` parameter is not a valid absolute URL.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The `url` parameter uses a scheme other than `http` or `https`.
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    /// The `url` parameter has no host.
    #[error("url has no host")]
    MissingHost,
}

/// Errors produced while retrieving the source image.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request did not complete within the configured timeout.
    #[error("timed out fetching image")]
    Timeout,

    /// The request could not be sent or the connection failed.
    #[error("failed to fetch image: {0}")]
    Request(#[source] reqwest::Error),

    /// The origin answered with something other than `200 OK`.
    #[error("origin responded with status {0}")]
    Status(StatusCode),

    /// The body could not be read to completion.
    #[error("failed to read image body: {0}")]
    Body(#[source] reqwest::Error),

    /// The body is larger than the configured limit.
    #[error("image exceeds the maximum of {limit} bytes")]
    TooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },
}

impl FetchError {
    pub(crate) fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err)
        }
    }

    pub(crate) fn from_body(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Body(err)
        }
    }
}

/// Errors produced when a fetched payload does not look like an image.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// The `Content-Type` header is missing or not `image/*`.
    #[error("invalid content type: {0}")]
    ContentType(String),

    /// The leading bytes match no known image signature.
    #[error("invalid image file signature")]
    Signature,
}

/// Errors produced by the decode, resize and encode pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The image library could not decode the source.
    #[error(transparent)]
    Decode(#[from] image::ImageError),

    /// The requested output is larger than WebP can represent.
    #[error("target size {width}x{height} exceeds the webp limit of {max} pixels per side")]
    TooLarge {
        /// Target width.
        width: u32,
        /// Target height.
        height: u32,
        /// Largest width or height WebP supports.
        max: u32,
    },

    /// The WebP encoder rejected the image.
    #[error("failed to encode webp: {0}")]
    Encode(String),
}

/// Top-level error of a single optimization request.
#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    /// The shared secret header is missing or wrong.
    #[error("forbidden")]
    Forbidden,

    /// The source origin is not on the allow-list.
    #[error("origin not allowed: {0}")]
    OriginNotAllowed(String),

    /// A query parameter is missing or invalid.
    #[error(transparent)]
    Params(#[from] ParamError),

    /// The source image could not be retrieved.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The retrieved payload is not an image.
    #[error(transparent)]
    Content(#[from] ContentError),

    /// Decoding or encoding failed.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// The blocking transform task panicked or was cancelled.
    #[error("failed to transform image")]
    Task(#[from] tokio::task::JoinError),
}

impl OptimizeError {
    /// Status code of the response describing this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Forbidden | Self::OriginNotAllowed(_) => StatusCode::FORBIDDEN,
            Self::Params(_) => StatusCode::BAD_REQUEST,
            Self::Fetch(_) | Self::Content(_) | Self::Transform(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `Cache-Control` value of the response describing this error.
    pub fn cache_control(&self) -> &'static str {
        if self.status_code() == StatusCode::FORBIDDEN {
            FORBIDDEN_CACHE_CONTROL
        } else {
            ERROR_CACHE_CONTROL
        }
    }
}
