//! Mapping of results onto the API Gateway proxy response.
use aws_lambda_events::{apigw::ApiGatewayProxyResponse, encodings::Body};
use base64::{engine::general_purpose::STANDARD, Engine};
use http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::Serialize;

use crate::{error::OptimizeError, transform::EncodedImage};

/// Cache policy of successful responses.
pub(crate) const SUCCESS_CACHE_CONTROL: &str = "public, max-age=31536000";

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Response carrying `image` as a base64 body.
pub fn success(image: &EncodedImage) -> ApiGatewayProxyResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&image.image_type.content_type())
            .unwrap_or_else(|_| HeaderValue::from_static("image/webp")),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(SUCCESS_CACHE_CONTROL),
    );

    let mut res = ApiGatewayProxyResponse::default();
    res.status_code = i64::from(StatusCode::OK.as_u16());
    res.headers = headers;
    res.body = Some(Body::Text(STANDARD.encode(&image.bytes)));
    res.is_base64_encoded = true;
    res
}

/// Response describing `err` as `{"error": "..."}`.
pub fn failure(err: &OptimizeError) -> ApiGatewayProxyResponse {
    let message = err.to_string();
    let body = serde_json::to_string(&ErrorBody { error: &message })
        .unwrap_or_else(|_| "{}".to_owned());

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(err.cache_control()),
    );

    let mut res = ApiGatewayProxyResponse::default();
    res.status_code = i64::from(err.status_code().as_u16());
    res.headers = headers;
    res.body = Some(Body::Text(body));
    res.is_base64_encoded = false;
    res
}
