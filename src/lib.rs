//! # Overview
//!
//! This crate fetches a remote image, resizes it and re-encodes it as lossy
//! WebP, answering API Gateway proxy requests from an AWS Lambda function.
//!
//! Requests carry the source `url` and optional `w`, `h` and `q` query
//! parameters. The source origin must be on the configured [`AllowList`],
//! and the fetched payload must both claim and look like an image before it
//! is decoded.
//!
//! # Usage with the Lambda runtime
//!
//! ```rust,no_run
//! use lambda_image_xform::{Config, ImageOptimizerBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), lambda_runtime::Error> {
//!     let config = Config::from_env()?;
//!     let optimizer = ImageOptimizerBuilder::new(config).build()?;
//!
//!     lambda_runtime::run(optimizer).await
//! }
//! ```
#![warn(
    clippy::all,
    nonstandard_style,
    future_incompatible,
    missing_docs,
    missing_debug_implementations
)]
#![forbid(unsafe_code)]

mod allow_list;
mod config;
mod error;
mod fetch;
pub mod image_type;
mod key;
mod params;
mod response;
mod service;
pub mod signature;
pub mod transform;

pub use allow_list::{AllowList, DEFAULT_ALLOWED_ORIGIN};
pub use config::{Config, ConfigError};
pub use error::{ContentError, FetchError, OptimizeError, ParamError, TransformError};
pub use fetch::{fetch_image, SourceImage};
pub use key::SecretKey;
pub use params::{
    parse_height, parse_quality, parse_url, parse_width, OptimizeParams, DEFAULT_QUALITY,
};
pub use service::{ImageOptimizer, ImageOptimizerBuilder, SECRET_KEY_HEADER};
