//! Container runtime access
//!
//! The monitor only needs three calls from the runtime: list the running
//! containers, fetch a one-shot stats sample and inspect a container for
//! its display name.

mod docker;

pub use docker::{validate_docker_url, DockerRuntime, LOCAL_DEFAULTS};

use crate::error::RuntimeError;
use crate::models::{ContainerDetails, ContainerSummary, RawStatsSnapshot};

pub use async_trait::async_trait;

/// Trait for container runtime implementations
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List all currently running containers
    async fn list_running_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError>;

    /// Fetch a raw stats sample for a container
    async fn get_stats(&self, container_id: &str) -> Result<RawStatsSnapshot, RuntimeError>;

    /// Inspect a container
    async fn inspect(&self, container_id: &str) -> Result<ContainerDetails, RuntimeError>;
}

/// Strip the leading `/` Docker puts on container names
pub fn display_name(raw: &str) -> String {
    raw.strip_prefix('/').unwrap_or(raw).to_string()
}
