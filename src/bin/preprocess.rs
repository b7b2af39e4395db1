//! Preprocess stage entrypoint: raw dataset -> training artifacts.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sentiment_cloud::config::Config;
use sentiment_cloud::platform::S3Store;
use sentiment_cloud::preprocess;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentiment_cloud=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let aws = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()))
        .load()
        .await;
    let store = S3Store::new(&aws);

    preprocess::run(&store, &config).await?;
    Ok(())
}
