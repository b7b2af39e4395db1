//! Training orchestrator
//!
//! Submits a managed training job over the persisted train/validation
//! artifacts, blocks until it finishes (bounded by the caller's wait
//! policy), and registers the produced model artifact under the
//! well-known model name. A failed job is fatal; nothing is retried.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{sleep, Instant};

use crate::config::Config;
use crate::error::AppError;
use crate::layout;
use crate::lifecycle::WaitPolicy;
use crate::platform::{images, HostingPlatform, TrainingSpec, TrainingStatus};

/// Fixed hyperparameters for the binary sentiment classifier.
fn hyperparameters() -> HashMap<String, String> {
    HashMap::from([
        ("predictor_type".to_string(), "binary_classifier".to_string()),
        ("optimizer".to_string(), "auto".to_string()),
        ("mini_batch_size".to_string(), "16".to_string()),
    ])
}

/// Run the training stage end to end: submit, wait, register.
pub async fn run(
    platform: &dyn HostingPlatform,
    config: &Config,
    wait: WaitPolicy,
) -> Result<(), AppError> {
    let role_arn = config.role_arn()?.to_string();
    let image = images::linear_learner_image(&config.region)?;

    // Job names must be unique per submission.
    let job_name = format!(
        "{}-{}",
        layout::MODEL_NAME,
        Utc::now().format("%Y%m%d-%H%M%S")
    );

    let spec = TrainingSpec {
        job_name: job_name.clone(),
        image: image.clone(),
        role_arn: role_arn.clone(),
        train_uri: format!("s3://{}/{}", config.bucket_name, layout::TRAIN_KEY),
        validation_uri: format!("s3://{}/{}", config.bucket_name, layout::TEST_KEY),
        output_uri: format!(
            "s3://{}/{}",
            config.bucket_name,
            layout::MODEL_OUTPUT_PREFIX
        ),
        instance_type: layout::INSTANCE_TYPE.to_string(),
        instance_count: 1,
        hyperparameters: hyperparameters(),
        max_runtime: Duration::from_secs(3600),
    };

    platform.create_training_job(&spec).await?;
    let model_artifacts = wait_for_completion(platform, &job_name, wait).await?;

    tracing::info!("Training complete, registering model");
    platform
        .create_model(layout::MODEL_NAME, &role_arn, &image, &model_artifacts)
        .await?;

    Ok(())
}

async fn wait_for_completion(
    platform: &dyn HostingPlatform,
    job_name: &str,
    wait: WaitPolicy,
) -> Result<String, AppError> {
    let deadline = Instant::now() + wait.timeout;
    loop {
        match platform.describe_training_job(job_name).await? {
            TrainingStatus::Completed { model_artifacts } => {
                tracing::info!("Training job '{}' completed", job_name);
                return Ok(model_artifacts);
            }
            TrainingStatus::Failed { reason } => {
                return Err(AppError::Platform(format!(
                    "training job '{}' failed: {}",
                    job_name, reason
                )));
            }
            TrainingStatus::InProgress => {
                tracing::debug!("Training job '{}' still in progress", job_name);
            }
        }
        if Instant::now() >= deadline {
            return Err(AppError::Platform(format!(
                "timed out after {:?} waiting for training job '{}'",
                wait.timeout, job_name
            )));
        }
        sleep(wait.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{
        EndpointStatus, ModelBinding, PlatformError, ResourceState,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockTrainer {
        statuses: Mutex<Vec<TrainingStatus>>,
        submitted: Mutex<Vec<TrainingSpec>>,
        registered: Mutex<Vec<(String, String, String, String)>>,
    }

    impl MockTrainer {
        fn with_statuses(statuses: Vec<TrainingStatus>) -> Self {
            Self {
                statuses: Mutex::new(statuses),
                submitted: Mutex::new(Vec::new()),
                registered: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HostingPlatform for MockTrainer {
        async fn describe_endpoint_config(
            &self,
            _name: &str,
        ) -> Result<ResourceState, PlatformError> {
            unimplemented!("not exercised by training tests")
        }

        async fn create_endpoint_config(
            &self,
            _name: &str,
            _binding: &ModelBinding,
        ) -> Result<(), PlatformError> {
            unimplemented!("not exercised by training tests")
        }

        async fn delete_endpoint_config(&self, _name: &str) -> Result<(), PlatformError> {
            unimplemented!("not exercised by training tests")
        }

        async fn describe_endpoint(
            &self,
            _name: &str,
        ) -> Result<Option<EndpointStatus>, PlatformError> {
            unimplemented!("not exercised by training tests")
        }

        async fn create_endpoint(
            &self,
            _name: &str,
            _config_name: &str,
        ) -> Result<(), PlatformError> {
            unimplemented!("not exercised by training tests")
        }

        async fn delete_endpoint(&self, _name: &str) -> Result<(), PlatformError> {
            unimplemented!("not exercised by training tests")
        }

        async fn create_training_job(&self, spec: &TrainingSpec) -> Result<(), PlatformError> {
            self.submitted.lock().unwrap().push(spec.clone());
            Ok(())
        }

        async fn describe_training_job(
            &self,
            _name: &str,
        ) -> Result<TrainingStatus, PlatformError> {
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.len() > 1 {
                Ok(statuses.remove(0))
            } else {
                Ok(statuses[0].clone())
            }
        }

        async fn create_model(
            &self,
            name: &str,
            role_arn: &str,
            image: &str,
            model_data_url: &str,
        ) -> Result<(), PlatformError> {
            self.registered.lock().unwrap().push((
                name.to_string(),
                role_arn.to_string(),
                image.to_string(),
                model_data_url.to_string(),
            ));
            Ok(())
        }
    }

    fn config() -> Config {
        Config {
            region: "ap-southeast-1".to_string(),
            bucket_name: "sentiment-assets".to_string(),
            dataset_name: None,
            role_arn: Some("arn:aws:iam::123:role/sm".to_string()),
            port: 8080,
        }
    }

    fn fast_wait() -> WaitPolicy {
        WaitPolicy {
            interval: Duration::from_millis(1),
            timeout: Duration::from_secs(2),
        }
    }

    #[tokio::test]
    async fn completed_job_registers_the_model() {
        let platform = MockTrainer::with_statuses(vec![
            TrainingStatus::InProgress,
            TrainingStatus::Completed {
                model_artifacts: "s3://sentiment-assets/linear-learner-asset/model/output/x/model.tar.gz"
                    .to_string(),
            },
        ]);

        run(&platform, &config(), fast_wait()).await.unwrap();

        let submitted = platform.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        let spec = &submitted[0];
        assert!(spec.job_name.starts_with("linear-learner-sentiment-model-"));
        assert_eq!(
            spec.train_uri,
            "s3://sentiment-assets/linear-learner-asset/train/train.csv"
        );
        assert_eq!(
            spec.hyperparameters.get("predictor_type").unwrap(),
            "binary_classifier"
        );
        assert_eq!(spec.hyperparameters.get("mini_batch_size").unwrap(), "16");

        let registered = platform.registered.lock().unwrap();
        assert_eq!(registered.len(), 1);
        let (name, role, image, artifacts) = &registered[0];
        assert_eq!(name, "linear-learner-sentiment-model");
        assert_eq!(role, "arn:aws:iam::123:role/sm");
        assert!(image.contains("linear-learner"));
        assert!(artifacts.ends_with("model.tar.gz"));
    }

    #[tokio::test]
    async fn failed_job_is_fatal_and_registers_nothing() {
        let platform = MockTrainer::with_statuses(vec![TrainingStatus::Failed {
            reason: "ClientError: no data found in channel train".to_string(),
        }]);

        let err = run(&platform, &config(), fast_wait()).await.unwrap_err();
        assert!(err.to_string().contains("no data found in channel train"));
        assert!(platform.registered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_role_is_a_config_error() {
        let mut config = config();
        config.role_arn = None;
        let platform = MockTrainer::with_statuses(vec![TrainingStatus::InProgress]);

        let err = run(&platform, &config, fast_wait()).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(platform.submitted.lock().unwrap().is_empty());
    }
}
