use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use lambda_runtime::LambdaEvent;
use reqwest::redirect::Policy;
use tokio::task;
use tower_service::Service;
use tracing::instrument;

use crate::{
    allow_list::{origin_of, AllowList},
    config::Config,
    error::OptimizeError,
    fetch::fetch_image,
    params::OptimizeParams,
    response,
    transform::{transform_image, EncodedImage},
};

/// Header callers use to present the shared secret.
pub const SECRET_KEY_HEADER: &str = "x-secret-key";

const MAX_REDIRECTS: usize = 10;

/// Fetches, resizes and re-encodes images on behalf of API Gateway.
///
/// Use [`ImageOptimizer::optimize`] directly, or run the optimizer as a
/// [`Service`] over Lambda events.
#[derive(Debug, Clone)]
pub struct ImageOptimizer {
    client: reqwest::Client,
    config: Arc<Config>,
}

/// Builder for [`ImageOptimizer`].
#[derive(Debug)]
pub struct ImageOptimizerBuilder {
    client: Option<reqwest::Client>,
    config: Config,
}

impl ImageOptimizerBuilder {
    /// Create a new [`ImageOptimizerBuilder`] with the provided [`Config`].
    pub fn new(config: Config) -> Self {
        Self {
            client: None,
            config,
        }
    }

    /// Configure the `client`.
    ///
    /// A custom client follows redirects according to its own policy, so it
    /// should not follow them outside the allow-list. By default the
    /// optimizer builds a client that only follows redirects to allowed
    /// origins.
    pub fn set_client(self, client: reqwest::Client) -> Self {
        Self {
            client: Some(client),
            ..self
        }
    }

    /// Build the [`ImageOptimizer`].
    ///
    /// # Errors
    ///
    /// Fails when the default HTTP client cannot be initialized.
    pub fn build(self) -> Result<ImageOptimizer, reqwest::Error> {
        let client = match self.client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .redirect(redirect_policy(self.config.allowed_origins().clone()))
                .build()?,
        };

        Ok(ImageOptimizer {
            client,
            config: Arc::new(self.config),
        })
    }
}

/// Follow at most [`MAX_REDIRECTS`] hops, and only to allowed origins.
///
/// A redirect elsewhere is not followed; its `3xx` response is returned to
/// the caller as-is.
fn redirect_policy(allowed_origins: AllowList) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if allowed_origins.permits(attempt.url()) {
            attempt.follow()
        } else {
            tracing::warn!(location = %attempt.url(), "refusing redirect outside the allow-list");
            attempt.stop()
        }
    })
}

impl ImageOptimizer {
    /// Configuration this optimizer was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Serve one API Gateway request.
    ///
    /// Failures never escape: they are logged and turned into a JSON error
    /// response.
    pub async fn optimize(&self, request: &ApiGatewayProxyRequest) -> ApiGatewayProxyResponse {
        match self.try_optimize(request).await {
            Ok(image) => response::success(&image),
            Err(err) => {
                let status = err.status_code();
                if status.is_server_error() {
                    tracing::error!(err = %err, %status, "failed to optimize image");
                } else {
                    tracing::warn!(err = %err, %status, "rejected image request");
                }
                response::failure(&err)
            }
        }
    }

    #[instrument(skip_all, err)]
    async fn try_optimize(
        &self,
        request: &ApiGatewayProxyRequest,
    ) -> Result<EncodedImage, OptimizeError> {
        self.authorize(request)?;

        let params = OptimizeParams::from_query(&request.query_string_parameters, &self.config)?;
        tracing::info!(
            url = %params.url,
            width = params.width,
            height = params.height,
            quality = params.quality,
            "optimizing image"
        );

        // The allow-list is checked before any network access.
        if !self.config.allowed_origins().permits(&params.url) {
            let origin = origin_of(&params.url).unwrap_or_default();
            return Err(OptimizeError::OriginNotAllowed(origin));
        }

        let source = fetch_image(
            &self.client,
            &params.url,
            self.config.fetch_timeout(),
            self.config.max_source_bytes(),
        )
        .await?;
        tracing::debug!(
            signature = ?source.signature,
            len = source.bytes.len(),
            "fetched source image"
        );

        let OptimizeParams {
            width,
            height,
            quality,
            ..
        } = params;
        let image = task::spawn_blocking(move || {
            transform_image(&source.bytes, width, height, quality)
        })
        .await??;

        Ok(image)
    }

    fn authorize(&self, request: &ApiGatewayProxyRequest) -> Result<(), OptimizeError> {
        let Some(secret_key) = self.config.secret_key() else {
            return Ok(());
        };

        let presented = request
            .headers
            .get(SECRET_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if secret_key.verify(presented) {
            Ok(())
        } else {
            Err(OptimizeError::Forbidden)
        }
    }
}

impl Service<LambdaEvent<ApiGatewayProxyRequest>> for ImageOptimizer {
    type Response = ApiGatewayProxyResponse;
    type Error = lambda_runtime::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: LambdaEvent<ApiGatewayProxyRequest>) -> Self::Future {
        let optimizer = self.clone();

        Box::pin(async move {
            let request_id = event.context.request_id;
            let res = optimizer.optimize(&event.payload).await;
            tracing::info!(%request_id, status = res.status_code, "request complete");
            Ok(res)
        })
    }
}
