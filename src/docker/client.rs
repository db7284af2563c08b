//! Container daemon client.
//!
//! The explorer talks to the daemon through the [`DaemonClient`] trait.
//! [`BollardDaemon`] is the production implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::ListContainersOptions;
use bollard::image::ListImagesOptions;
use bollard::models::{ContainerSummary, ImageSummary};
use thiserror::Error;

use super::types::{ContainerDescriptor, ContainerState, ImageDescriptor};

/// Errors from the container daemon.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Could not set up a connection to the daemon.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The daemon rejected or failed a request.
    #[error("Daemon request failed: {0}")]
    Request(#[from] bollard::errors::Error),
}

/// Operations the explorer needs from the container daemon.
#[async_trait]
pub trait DaemonClient: Send + Sync {
    /// Lists local images.
    async fn list_images(&self) -> Result<Vec<ImageDescriptor>, DaemonError>;

    /// Lists containers whose lifecycle state is one of `states`.
    async fn list_containers(
        &self,
        states: &[ContainerState],
    ) -> Result<Vec<ContainerDescriptor>, DaemonError>;
}

/// Daemon client backed by bollard.
pub struct BollardDaemon {
    docker: Docker,
}

impl BollardDaemon {
    /// Connects to the local daemon (auto-detects the socket or pipe).
    ///
    /// # Errors
    /// Returns error if the connection settings cannot be resolved.
    pub fn connect_local() -> Result<Self, DaemonError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| DaemonError::ConnectionFailed(e.to_string()))?;

        Ok(Self { docker })
    }
}

#[async_trait]
impl DaemonClient for BollardDaemon {
    async fn list_images(&self) -> Result<Vec<ImageDescriptor>, DaemonError> {
        let options = ListImagesOptions::<String> {
            all: false,
            ..Default::default()
        };

        let images = self.docker.list_images(Some(options)).await?;
        tracing::debug!("daemon listed {} images", images.len());

        Ok(images.into_iter().map(ImageDescriptor::from).collect())
    }

    async fn list_containers(
        &self,
        states: &[ContainerState],
    ) -> Result<Vec<ContainerDescriptor>, DaemonError> {
        let mut filters = HashMap::new();
        filters.insert(
            "status".to_string(),
            states.iter().map(|s| s.as_str().to_string()).collect(),
        );

        let options = ListContainersOptions::<String> {
            all: true,
            filters,
            ..Default::default()
        };

        let containers = self.docker.list_containers(Some(options)).await?;
        tracing::debug!("daemon listed {} containers", containers.len());

        Ok(containers
            .into_iter()
            .map(ContainerDescriptor::from)
            .collect())
    }
}

impl From<ImageSummary> for ImageDescriptor {
    fn from(summary: ImageSummary) -> Self {
        // Older daemons report dangling images as a literal "<none>:<none>" tag.
        let repo_tags = summary
            .repo_tags
            .into_iter()
            .filter(|t| t != super::types::UNTAGGED_LABEL)
            .collect();

        Self {
            id: summary.id,
            repo_tags,
            created: summary.created,
            size: summary.size,
        }
    }
}

impl From<ContainerSummary> for ContainerDescriptor {
    fn from(summary: ContainerSummary) -> Self {
        Self {
            id: summary.id.unwrap_or_default(),
            names: summary.names.unwrap_or_default(),
            image: summary.image.unwrap_or_else(|| "<none>".to_string()),
            state: summary
                .state
                .as_deref()
                .map(ContainerState::parse)
                .unwrap_or_default(),
            status: summary.status.unwrap_or_default(),
            created: summary.created.unwrap_or_default(),
        }
    }
}
