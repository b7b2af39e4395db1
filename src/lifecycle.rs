//! Endpoint lifecycle manager
//!
//! Idempotent replace semantics for the two hosted resources: a deploy
//! run guarantees exactly one endpoint config and one endpoint of the
//! derived name exist afterward, bound to the requested model. Each named
//! resource is a two-state machine (ABSENT / PRESENT): `ensure_absent`
//! probes and, when present, deletes and polls until the deletion is
//! observably complete before the caller may recreate. Every wait carries
//! a caller-supplied deadline; the platform can otherwise leave an
//! operation pending indefinitely.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::platform::{
    EndpointStatus, HostingPlatform, ModelBinding, PlatformError, ResourceState,
};

/// Suffix an endpoint-config name must carry; the endpoint name is
/// derived by substituting it.
pub const CONFIG_SUFFIX: &str = "-endpoint-config";
pub const ENDPOINT_SUFFIX: &str = "-endpoint";

/// Derive the endpoint name from its config name.
///
/// Purely textual substitution, validated up front: a config name without
/// the expected suffix would otherwise derive garbage.
pub fn derive_endpoint_name(config_name: &str) -> Result<String, PlatformError> {
    let stem = config_name.strip_suffix(CONFIG_SUFFIX).ok_or_else(|| {
        PlatformError::InvalidName(format!(
            "endpoint config name '{}' does not end in '{}'",
            config_name, CONFIG_SUFFIX
        ))
    })?;
    if stem.is_empty() {
        return Err(PlatformError::InvalidName(format!(
            "endpoint config name '{}' has an empty stem",
            config_name
        )));
    }
    Ok(format!("{}{}", stem, ENDPOINT_SUFFIX))
}

/// The two resource kinds the manager owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    EndpointConfig,
    Endpoint,
}

impl ResourceKind {
    fn label(&self) -> &'static str {
        match self {
            ResourceKind::EndpointConfig => "endpoint config",
            ResourceKind::Endpoint => "endpoint",
        }
    }
}

/// Bounds for poll-until-state waits.
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            timeout: Duration::from_secs(15 * 60),
        }
    }
}

pub struct EndpointLifecycle {
    platform: Arc<dyn HostingPlatform>,
    wait: WaitPolicy,
}

impl EndpointLifecycle {
    pub fn new(platform: Arc<dyn HostingPlatform>, wait: WaitPolicy) -> Self {
        Self { platform, wait }
    }

    /// Replace-and-deploy: after this returns, exactly one endpoint
    /// config named `config_name` and one endpoint of the derived name
    /// exist, and the endpoint is in service. Returns the endpoint name.
    pub async fn deploy(
        &self,
        config_name: &str,
        binding: &ModelBinding,
    ) -> Result<String, PlatformError> {
        let endpoint_name = derive_endpoint_name(config_name)?;

        self.ensure_absent(ResourceKind::EndpointConfig, config_name)
            .await?;
        self.platform
            .create_endpoint_config(config_name, binding)
            .await?;

        self.ensure_absent(ResourceKind::Endpoint, &endpoint_name)
            .await?;
        self.platform
            .create_endpoint(&endpoint_name, config_name)
            .await?;
        self.wait_in_service(&endpoint_name).await?;

        Ok(endpoint_name)
    }

    /// Drive a named resource to ABSENT. A missing resource is success,
    /// not an error; any probe failure other than not-found propagates
    /// unmodified.
    pub async fn ensure_absent(
        &self,
        kind: ResourceKind,
        name: &str,
    ) -> Result<(), PlatformError> {
        match self.probe(kind, name).await? {
            ResourceState::Absent => return Ok(()),
            ResourceState::Present => {
                tracing::info!("{} '{}' already exists, deleting", kind.label(), name);
                match kind {
                    ResourceKind::EndpointConfig => {
                        self.platform.delete_endpoint_config(name).await?
                    }
                    ResourceKind::Endpoint => self.platform.delete_endpoint(name).await?,
                }
            }
        }

        // Deletion must be observably complete before recreation, or the
        // create races against a resource still being torn down.
        let deadline = Instant::now() + self.wait.timeout;
        loop {
            if self.probe(kind, name).await? == ResourceState::Absent {
                tracing::info!("{} '{}' deleted", kind.label(), name);
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PlatformError::Timeout(
                    self.wait.timeout,
                    format!("{} '{}' deletion", kind.label(), name),
                ));
            }
            sleep(self.wait.interval).await;
        }
    }

    async fn probe(&self, kind: ResourceKind, name: &str) -> Result<ResourceState, PlatformError> {
        match kind {
            ResourceKind::EndpointConfig => self.platform.describe_endpoint_config(name).await,
            ResourceKind::Endpoint => Ok(match self.platform.describe_endpoint(name).await? {
                Some(_) => ResourceState::Present,
                None => ResourceState::Absent,
            }),
        }
    }

    /// Block until the endpoint is in service. A terminal failed state or
    /// an expired deadline is fatal; there is no automatic retry.
    async fn wait_in_service(&self, endpoint_name: &str) -> Result<(), PlatformError> {
        let deadline = Instant::now() + self.wait.timeout;
        loop {
            match self.platform.describe_endpoint(endpoint_name).await? {
                Some(EndpointStatus::InService) => {
                    tracing::info!("Endpoint '{}' is in service", endpoint_name);
                    return Ok(());
                }
                Some(EndpointStatus::Failed) => {
                    return Err(PlatformError::Platform(format!(
                        "endpoint '{}' entered Failed state during creation",
                        endpoint_name
                    )));
                }
                Some(status) => {
                    tracing::debug!("Endpoint '{}' status: {:?}", endpoint_name, status);
                }
                None => {
                    return Err(PlatformError::Platform(format!(
                        "endpoint '{}' disappeared while being created",
                        endpoint_name
                    )));
                }
            }
            if Instant::now() >= deadline {
                return Err(PlatformError::Timeout(
                    self.wait.timeout,
                    format!("endpoint '{}' to enter service", endpoint_name),
                ));
            }
            sleep(self.wait.interval).await;
        }
    }
}
