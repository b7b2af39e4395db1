//! Train stage entrypoint: managed training job + model registration.

use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sentiment_cloud::config::Config;
use sentiment_cloud::lifecycle::WaitPolicy;
use sentiment_cloud::platform::SageMakerPlatform;
use sentiment_cloud::train;

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
    let platform = SageMakerPlatform::new(&aws);

    let wait = WaitPolicy {
        interval: Duration::from_secs(30),
        timeout: Duration::from_secs(30 * 60),
    };

    train::run(&platform, &config, wait).await?;
    Ok(())
}
