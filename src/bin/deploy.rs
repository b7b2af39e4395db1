//! Deploy stage entrypoint: idempotently (re)create the hosting
//! configuration and endpoint for the registered model.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sentiment_cloud::config::Config;
use sentiment_cloud::layout;
use sentiment_cloud::lifecycle::{EndpointLifecycle, WaitPolicy, CONFIG_SUFFIX};
use sentiment_cloud::platform::{ModelBinding, SageMakerPlatform};

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

    let lifecycle = EndpointLifecycle::new(
        Arc::new(SageMakerPlatform::new(&aws)),
        WaitPolicy {
            interval: Duration::from_secs(15),
            timeout: Duration::from_secs(15 * 60),
        },
    );

    let config_name = format!("{}{}", layout::MODEL_NAME, CONFIG_SUFFIX);
    let binding = ModelBinding {
        model_name: layout::MODEL_NAME.to_string(),
        instance_type: layout::INSTANCE_TYPE.to_string(),
        initial_instance_count: 1,
    };

    let endpoint = lifecycle.deploy(&config_name, &binding).await?;
    tracing::info!("Endpoint '{}' is ready to use", endpoint);
    Ok(())
}
