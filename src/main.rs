use lambda_image_xform::{Config, ImageOptimizerBuilder};
use lambda_runtime::Error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .with_target(false)
        // CloudWatch adds timestamps.
        .without_time()
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        allowed_origins = ?config.allowed_origins().origins(),
        max_width = config.max_width(),
        max_height = config.max_height(),
        fetch_timeout = ?config.fetch_timeout(),
        "configuration loaded"
    );

    let optimizer = ImageOptimizerBuilder::new(config).build()?;
    lambda_runtime::run(optimizer).await
}
