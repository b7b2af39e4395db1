//! Hosted endpoint invocation
//!
//! Synchronous data-plane call: one delimited-text record in, one
//! structured response out. Behind a trait so the predict path can be
//! tested with a mock endpoint.

use async_trait::async_trait;
use aws_sdk_sagemakerruntime::primitives::Blob;
use aws_sdk_sagemakerruntime::Client as RuntimeClient;

use super::PlatformError;

#[async_trait]
pub trait EndpointInvoker: Send + Sync {
    async fn invoke(
        &self,
        endpoint_name: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, PlatformError>;
}

/// SageMaker runtime-backed invoker.
pub struct SageMakerInvoker {
    client: RuntimeClient,
}

impl SageMakerInvoker {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: RuntimeClient::new(config),
        }
    }
}

#[async_trait]
impl EndpointInvoker for SageMakerInvoker {
    async fn invoke(
        &self,
        endpoint_name: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, PlatformError> {
        let output = self
            .client
            .invoke_endpoint()
            .endpoint_name(endpoint_name)
            .content_type(content_type)
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|e| PlatformError::Platform(e.to_string()))?;

        let blob = output.body().ok_or_else(|| {
            PlatformError::MalformedResponse(format!(
                "endpoint '{}' returned an empty body",
                endpoint_name
            ))
        })?;

        Ok(blob.as_ref().to_vec())
    }
}
