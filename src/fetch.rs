use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::{stream, Stream, StreamExt, TryStreamExt};
use http::{header, StatusCode};
use tracing::instrument;
use url::Url;

use crate::{
    error::{ContentError, FetchError, OptimizeError},
    signature::{is_image_content_type, sniff, ImageSignature, PEEK_LEN},
};

/// Source image retrieved from an allowed origin.
#[derive(Debug)]
pub struct SourceImage {
    /// Complete response body.
    pub bytes: Bytes,
    /// Container format recognised from the leading bytes.
    pub signature: ImageSignature,
}

/// Fetch `url` and check that the response is an image.
///
/// Non-`200` statuses, transport errors and timeouts are [`FetchError`]s; a
/// payload that is not an image is a [`ContentError`]. Nothing is retried.
#[instrument(skip(client, url), fields(url = %url), err)]
pub async fn fetch_image(
    client: &reqwest::Client,
    url: &Url,
    timeout: Duration,
    max_bytes: usize,
) -> Result<SourceImage, OptimizeError> {
    let response = client
        .get(url.clone())
        .timeout(timeout)
        .send()
        .await
        .map_err(FetchError::from_request)?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::Status(status).into());
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    if !is_image_content_type(&content_type) {
        return Err(ContentError::ContentType(content_type).into());
    }

    let body = Box::pin(response.bytes_stream().map_err(FetchError::from_body));
    let (signature, body) = peek_signature(body).await?;
    let bytes = collect_body(body, max_bytes).await?;

    Ok(SourceImage { bytes, signature })
}

/// Read up to [`PEEK_LEN`] bytes and identify the image signature.
///
/// The returned stream yields the peeked bytes again, followed by the rest
/// of `body`.
pub(crate) async fn peek_signature<S>(
    mut body: S,
) -> Result<(ImageSignature, impl Stream<Item = Result<Bytes, FetchError>>), OptimizeError>
where
    S: Stream<Item = Result<Bytes, FetchError>> + Unpin,
{
    let mut head = BytesMut::new();
    while head.len() < PEEK_LEN {
        match body.next().await {
            Some(chunk) => head.extend_from_slice(&chunk?),
            None => break,
        }
    }

    let peeked = &head[..head.len().min(PEEK_LEN)];
    let Some(signature) = sniff(peeked) else {
        return Err(ContentError::Signature.into());
    };

    let head = head.freeze();
    Ok((signature, stream::iter([Ok(head)]).chain(body)))
}

/// Concatenate `body`, failing once it grows beyond `max_bytes`.
pub(crate) async fn collect_body<S>(body: S, max_bytes: usize) -> Result<Bytes, FetchError>
where
    S: Stream<Item = Result<Bytes, FetchError>>,
{
    body.try_fold(BytesMut::new(), |mut acc, chunk| async move {
        if acc.len() + chunk.len() > max_bytes {
            return Err(FetchError::TooLarge { limit: max_bytes });
        }
        acc.extend_from_slice(&chunk);
        Ok(acc)
    })
    .await
    .map(BytesMut::freeze)
}
