//! Managed training/hosting platform client
//!
//! Control-plane operations the orchestration stages consume: training-job
//! submission, model registration, and endpoint-config/endpoint
//! create/delete/describe. The platform reports missing resources through
//! a generic client error whose message starts with "Could not find"; the
//! probe operations fold exactly that case into [`ResourceState::Absent`]
//! and propagate everything else unmodified.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_sagemaker::error::ProvideErrorMetadata;
use aws_sdk_sagemaker::types::{
    AlgorithmSpecification, Channel, ContainerDefinition, DataSource, OutputDataConfig,
    ProductionVariant, ProductionVariantInstanceType, ResourceConfig, S3DataSource, S3DataType,
    StoppingCondition, TrainingInputMode, TrainingInstanceType,
};
use aws_sdk_sagemaker::Client as SageMakerClient;

use super::PlatformError;

/// Observable existence of a named platform resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    Absent,
    Present,
}

/// Hosted endpoint state as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointStatus {
    Creating,
    InService,
    Deleting,
    Failed,
    Other(String),
}

impl EndpointStatus {
    fn from_platform(status: &str) -> Self {
        match status {
            "Creating" => Self::Creating,
            "InService" => Self::InService,
            "Deleting" => Self::Deleting,
            "Failed" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Training-job state, with the model artifact location once complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingStatus {
    InProgress,
    Completed { model_artifacts: String },
    Failed { reason: String },
}

/// Binding of a registered model to instance sizing, used when creating a
/// hosting configuration.
#[derive(Debug, Clone)]
pub struct ModelBinding {
    pub model_name: String,
    pub instance_type: String,
    pub initial_instance_count: i32,
}

/// Everything a training-job submission needs.
#[derive(Debug, Clone)]
pub struct TrainingSpec {
    pub job_name: String,
    pub image: String,
    pub role_arn: String,
    pub train_uri: String,
    pub validation_uri: String,
    pub output_uri: String,
    pub instance_type: String,
    pub instance_count: i32,
    pub hyperparameters: HashMap<String, String>,
    pub max_runtime: Duration,
}

#[async_trait]
pub trait HostingPlatform: Send + Sync {
    async fn describe_endpoint_config(&self, name: &str)
        -> Result<ResourceState, PlatformError>;
    async fn create_endpoint_config(
        &self,
        name: &str,
        binding: &ModelBinding,
    ) -> Result<(), PlatformError>;
    async fn delete_endpoint_config(&self, name: &str) -> Result<(), PlatformError>;

    /// `None` means the endpoint does not exist.
    async fn describe_endpoint(&self, name: &str)
        -> Result<Option<EndpointStatus>, PlatformError>;
    async fn create_endpoint(&self, name: &str, config_name: &str)
        -> Result<(), PlatformError>;
    async fn delete_endpoint(&self, name: &str) -> Result<(), PlatformError>;

    async fn create_training_job(&self, spec: &TrainingSpec) -> Result<(), PlatformError>;
    async fn describe_training_job(&self, name: &str) -> Result<TrainingStatus, PlatformError>;
    async fn create_model(
        &self,
        name: &str,
        role_arn: &str,
        image: &str,
        model_data_url: &str,
    ) -> Result<(), PlatformError>;
}

/// SageMaker-backed control plane.
pub struct SageMakerPlatform {
    client: SageMakerClient,
}

impl SageMakerPlatform {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: SageMakerClient::new(config),
        }
    }
}

/// Messages the platform uses to report a missing resource on describe.
const NOT_FOUND_MARKER: &str = "Could not find";

fn fold_not_found<E>(err: E) -> Result<ResourceState, PlatformError>
where
    E: ProvideErrorMetadata + std::fmt::Display,
{
    let msg = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string());
    if msg.contains(NOT_FOUND_MARKER) {
        Ok(ResourceState::Absent)
    } else {
        Err(PlatformError::Platform(msg))
    }
}

fn platform_err(err: impl std::fmt::Display) -> PlatformError {
    PlatformError::Platform(err.to_string())
}

fn channel(name: &str, uri: &str) -> Result<Channel, PlatformError> {
    let source = S3DataSource::builder()
        .s3_data_type(S3DataType::S3Prefix)
        .s3_uri(uri)
        .build();

    Ok(Channel::builder()
        .channel_name(name)
        .data_source(DataSource::builder().s3_data_source(source).build())
        .content_type("text/csv")
        .build())
}

#[async_trait]
impl HostingPlatform for SageMakerPlatform {
    async fn describe_endpoint_config(
        &self,
        name: &str,
    ) -> Result<ResourceState, PlatformError> {
        match self
            .client
            .describe_endpoint_config()
            .endpoint_config_name(name)
            .send()
            .await
        {
            Ok(_) => Ok(ResourceState::Present),
            Err(err) => fold_not_found(err.into_service_error()),
        }
    }

    async fn create_endpoint_config(
        &self,
        name: &str,
        binding: &ModelBinding,
    ) -> Result<(), PlatformError> {
        let variant = ProductionVariant::builder()
            .variant_name("AllTraffic")
            .model_name(&binding.model_name)
            .instance_type(ProductionVariantInstanceType::from(
                binding.instance_type.as_str(),
            ))
            .initial_instance_count(binding.initial_instance_count)
            .build();

        self.client
            .create_endpoint_config()
            .endpoint_config_name(name)
            .production_variants(variant)
            .send()
            .await
            .map_err(|e| platform_err(e.into_service_error()))?;

        tracing::info!("Created endpoint config '{}'", name);
        Ok(())
    }

    async fn delete_endpoint_config(&self, name: &str) -> Result<(), PlatformError> {
        self.client
            .delete_endpoint_config()
            .endpoint_config_name(name)
            .send()
            .await
            .map_err(|e| platform_err(e.into_service_error()))?;

        tracing::info!("Deleted endpoint config '{}'", name);
        Ok(())
    }

    async fn describe_endpoint(
        &self,
        name: &str,
    ) -> Result<Option<EndpointStatus>, PlatformError> {
        match self.client.describe_endpoint().endpoint_name(name).send().await {
            Ok(out) => {
                let status = out
                    .endpoint_status()
                    .map(|s| EndpointStatus::from_platform(s.as_str()))
                    .ok_or_else(|| {
                        PlatformError::MalformedResponse(format!(
                            "endpoint '{}' described without a status",
                            name
                        ))
                    })?;
                Ok(Some(status))
            }
            Err(err) => match fold_not_found(err.into_service_error())? {
                ResourceState::Absent => Ok(None),
                ResourceState::Present => unreachable!("fold_not_found only yields Absent"),
            },
        }
    }

    async fn create_endpoint(&self, name: &str, config_name: &str) -> Result<(), PlatformError> {
        self.client
            .create_endpoint()
            .endpoint_name(name)
            .endpoint_config_name(config_name)
            .send()
            .await
            .map_err(|e| platform_err(e.into_service_error()))?;

        tracing::info!("Creating endpoint '{}' bound to '{}'", name, config_name);
        Ok(())
    }

    async fn delete_endpoint(&self, name: &str) -> Result<(), PlatformError> {
        self.client
            .delete_endpoint()
            .endpoint_name(name)
            .send()
            .await
            .map_err(|e| platform_err(e.into_service_error()))?;

        tracing::info!("Deleting endpoint '{}'", name);
        Ok(())
    }

    async fn create_training_job(&self, spec: &TrainingSpec) -> Result<(), PlatformError> {
        let algorithm = AlgorithmSpecification::builder()
            .training_image(&spec.image)
            .training_input_mode(TrainingInputMode::File)
            .build();

        let resources = ResourceConfig::builder()
            .instance_type(TrainingInstanceType::from(spec.instance_type.as_str()))
            .instance_count(spec.instance_count)
            .volume_size_in_gb(10)
            .build();

        let output = OutputDataConfig::builder()
            .s3_output_path(&spec.output_uri)
            .build();

        let stopping = StoppingCondition::builder()
            .max_runtime_in_seconds(spec.max_runtime.as_secs() as i32)
            .build();

        self.client
            .create_training_job()
            .training_job_name(&spec.job_name)
            .role_arn(&spec.role_arn)
            .algorithm_specification(algorithm)
            .input_data_config(channel("train", &spec.train_uri)?)
            .input_data_config(channel("validation", &spec.validation_uri)?)
            .output_data_config(output)
            .resource_config(resources)
            .stopping_condition(stopping)
            .set_hyper_parameters(Some(spec.hyperparameters.clone()))
            .send()
            .await
            .map_err(|e| platform_err(e.into_service_error()))?;

        tracing::info!("Submitted training job '{}'", spec.job_name);
        Ok(())
    }

    async fn describe_training_job(&self, name: &str) -> Result<TrainingStatus, PlatformError> {
        let out = self
            .client
            .describe_training_job()
            .training_job_name(name)
            .send()
            .await
            .map_err(|e| platform_err(e.into_service_error()))?;

        let status = out
            .training_job_status()
            .map(|s| s.as_str().to_string())
            .ok_or_else(|| {
                PlatformError::MalformedResponse(format!(
                    "training job '{}' described without a status",
                    name
                ))
            })?;

        match status.as_str() {
            "Completed" => {
                let artifacts = out
                    .model_artifacts()
                    .and_then(|a| a.s3_model_artifacts())
                    .ok_or_else(|| {
                        PlatformError::MalformedResponse(format!(
                            "training job '{}' completed without model artifacts",
                            name
                        ))
                    })?;
                Ok(TrainingStatus::Completed {
                    model_artifacts: artifacts.to_string(),
                })
            }
            "Failed" | "Stopped" => Ok(TrainingStatus::Failed {
                reason: out
                    .failure_reason()
                    .unwrap_or("no failure reason reported")
                    .to_string(),
            }),
            _ => Ok(TrainingStatus::InProgress),
        }
    }

    async fn create_model(
        &self,
        name: &str,
        role_arn: &str,
        image: &str,
        model_data_url: &str,
    ) -> Result<(), PlatformError> {
        let container = ContainerDefinition::builder()
            .image(image)
            .model_data_url(model_data_url)
            .build();

        self.client
            .create_model()
            .model_name(name)
            .execution_role_arn(role_arn)
            .primary_container(container)
            .send()
            .await
            .map_err(|e| platform_err(e.into_service_error()))?;

        tracing::info!("Registered model '{}'", name);
        Ok(())
    }
}
