//! Allow-list of image origins.
//!
//! The optimizer only fetches from origins on this list, which keeps it from
//! being used as an open proxy. Matching is exact: there is no wildcard or
//! suffix matching.
use url::Url;

/// Origin that is always allowed unless the list is built with
/// [`AllowList::empty`].
pub const DEFAULT_ALLOWED_ORIGIN: &str = "lh3.googleusercontent.com";

/// Immutable set of origins images may be fetched from.
///
/// An origin is the host of a URL, followed by `:port` when the URL carries
/// an explicit non-default port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    origins: Vec<String>,
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new()
    }
}

impl AllowList {
    /// Create an [`AllowList`] holding only [`DEFAULT_ALLOWED_ORIGIN`].
    pub fn new() -> Self {
        Self::empty().with_origin(DEFAULT_ALLOWED_ORIGIN)
    }

    /// Create an [`AllowList`] that permits nothing.
    pub const fn empty() -> Self {
        Self {
            origins: Vec::new(),
        }
    }

    /// Create an [`AllowList`] from the value of the `ALLOWED_ORIGINS`
    /// variable: the default origin followed by every comma-separated entry.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lambda_image_xform::AllowList;
    ///
    /// let allow_list = AllowList::from_env_value(" cdn.example.com, ,CDN.example.com,img.example.com");
    /// assert_eq!(
    ///     allow_list.origins(),
    ///     ["lh3.googleusercontent.com", "cdn.example.com", "img.example.com"]
    /// );
    /// ```
    pub fn from_env_value(value: &str) -> Self {
        value
            .split(',')
            .fold(Self::new(), |allow_list, origin| allow_list.with_origin(origin))
    }

    /// Add an origin. Whitespace is trimmed and the origin is lowercased;
    /// empty and duplicate entries are skipped.
    pub fn with_origin(mut self, origin: &str) -> Self {
        let origin = origin.trim().to_ascii_lowercase();
        if !origin.is_empty() && !self.origins.contains(&origin) {
            self.origins.push(origin);
        }
        self
    }

    /// Replace the contents with the given origins.
    pub fn with_origins<I, S>(self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        origins
            .into_iter()
            .fold(Self::empty(), |allow_list, origin| {
                allow_list.with_origin(origin.as_ref())
            })
    }

    /// Returns a copy of the allowed origins, in insertion order.
    pub fn origins(&self) -> Vec<String> {
        self.origins.clone()
    }

    /// Returns `true` if the origin of `url` is on the list.
    pub fn permits(&self, url: &Url) -> bool {
        origin_of(url).is_some_and(|origin| self.origins.contains(&origin))
    }
}

/// The `host[:port]` authority of `url`, lowercased.
pub(crate) fn origin_of(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    })
}
