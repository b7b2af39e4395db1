//! Sentiment analysis service backed by a managed ML platform.
//!
//! The crate is a thin orchestration layer: the dataset preparer fits a
//! TF-IDF vectorizer and uploads training artifacts to the object store,
//! the training orchestrator runs a managed linear-learner job and
//! registers the resulting model, the lifecycle manager deploys it behind
//! a hosted endpoint, and the HTTP server forwards user text to that
//! endpoint and maps the prediction to a sentiment label.

pub mod config;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod platform;
pub mod preprocess;
pub mod state;
pub mod train;
pub mod vectorizer;

pub use error::{AppError, AppResult};

/// Object-store layout shared by the pipeline stages and the server.
pub mod layout {
    /// Prefix under which all pipeline artifacts live.
    pub const ASSET_PREFIX: &str = "linear-learner-asset";

    /// Training partition (label first column, dense features after).
    pub const TRAIN_KEY: &str = "linear-learner-asset/train/train.csv";

    /// Validation partition, same shape as the training one.
    pub const TEST_KEY: &str = "linear-learner-asset/test/test.csv";

    /// Fitted vectorizer artifact, loaded once at server startup.
    pub const VECTORIZER_KEY: &str = "linear-learner-asset/artifact/tfidf_vectorizer.json";

    /// Prefix the training job writes its model artifact under.
    pub const MODEL_OUTPUT_PREFIX: &str = "linear-learner-asset/model/output";

    /// Prefix the raw labeled dataset is read from.
    pub const DATASET_PREFIX: &str = "dataset";

    /// Well-known name the trained model is registered under.
    pub const MODEL_NAME: &str = "linear-learner-sentiment-model";

    /// Instance sizing used for both training and hosting.
    pub const INSTANCE_TYPE: &str = "ml.m4.xlarge";
}
