//! Configuration module

use std::env;

use crate::error::AppError;

/// Application configuration, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Platform region identifier
    pub region: String,

    /// Object-store bucket holding the dataset and pipeline artifacts
    pub bucket_name: String,

    /// Raw dataset object name (preprocess stage only)
    pub dataset_name: Option<String>,

    /// Execution role the managed platform assumes (train/deploy stages)
    pub role_arn: Option<String>,

    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `AWS_REGION` and `AWS_BUCKET_NAME` are required everywhere and
    /// missing values are a fatal startup error. Stage-specific settings
    /// are checked by their accessors so each binary only demands what it
    /// actually uses.
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            region: require("AWS_REGION")?,
            bucket_name: require("AWS_BUCKET_NAME")?,
            dataset_name: env::var("DATASET_NAME").ok(),
            role_arn: env::var("AWS_SAGEMAKER_ROLE_ARN").ok(),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
        })
    }

    /// Dataset object name, required by the preprocess stage.
    pub fn dataset_name(&self) -> Result<&str, AppError> {
        self.dataset_name
            .as_deref()
            .ok_or_else(|| AppError::Config("DATASET_NAME must be set".to_string()))
    }

    /// Execution role, required by the train and deploy stages.
    pub fn role_arn(&self) -> Result<&str, AppError> {
        self.role_arn
            .as_deref()
            .ok_or_else(|| AppError::Config("AWS_SAGEMAKER_ROLE_ARN must be set".to_string()))
    }
}

fn require(name: &str) -> Result<String, AppError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("{} must be set", name)))
}
