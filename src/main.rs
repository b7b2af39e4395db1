//! Sentiment analysis API server
//!
//! Loads the fitted vectorizer from the object store once at startup,
//! then serves two routes: a liveness probe and the predict endpoint that
//! forwards transformed text to the hosted model.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sentiment_cloud::config::Config;
use sentiment_cloud::handlers;
use sentiment_cloud::layout;
use sentiment_cloud::lifecycle;
use sentiment_cloud::platform::{S3Store, SageMakerInvoker};
use sentiment_cloud::state::AppState;
use sentiment_cloud::vectorizer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentiment_cloud=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Sentiment API server starting...");
    tracing::info!("Region: {}, bucket: {}", config.region, config.bucket_name);

    let aws = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()))
        .load()
        .await;

    // Fatal if the artifact cannot be fetched or deserialized; the server
    // must not come up without the vectorizer that produced the model's
    // training data.
    let store = S3Store::new(&aws);
    let vectorizer =
        vectorizer::load_from_store(&store, &config.bucket_name, layout::VECTORIZER_KEY).await?;

    let endpoint_name = lifecycle::derive_endpoint_name(&format!(
        "{}{}",
        layout::MODEL_NAME,
        lifecycle::CONFIG_SUFFIX
    ))?;

    let state = AppState {
        vectorizer: Arc::new(vectorizer),
        invoker: Arc::new(SageMakerInvoker::new(&aws)),
        endpoint_name,
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::check))
        .route("/v1/predict", post(handlers::predict::predict))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
