//! Docker runtime over the Engine API
//!
//! Uses `bollard` for the daemon connection, so the default local socket,
//! `DOCKER_HOST` and explicit `unix://`/`tcp://`/`http://` addresses all work.
//! Calls made per cycle:
//! - list running containers
//! - one-shot stats (`stream=false`)
//! - inspect for the display name

use super::{display_name, ContainerRuntime};
use crate::error::RuntimeError;
use crate::models::{ContainerDetails, ContainerSummary, RawStatsSnapshot};
use async_trait::async_trait;
use bollard::container::{InspectContainerOptions, ListContainersOptions, Stats, StatsOptions};
use bollard::models::ContainerSummary as ApiContainerSummary;
use bollard::{Docker, API_DEFAULT_VERSION};
use futures_util::TryStreamExt;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Label used in logs when connecting with local defaults
pub const LOCAL_DEFAULTS: &str = "local defaults";

/// Docker runtime backed by a bollard client
pub struct DockerRuntime {
    docker: Docker,
    endpoint: String,
}

impl DockerRuntime {
    /// Connect to the daemon at `docker_url`, or with local defaults
    /// (`DOCKER_HOST`, then the platform socket) when it is `None`
    pub fn connect(docker_url: Option<&str>, timeout: Duration) -> Result<Self, RuntimeError> {
        let timeout_secs = timeout.as_secs().max(1);

        let docker = match docker_url {
            None => Docker::connect_with_local_defaults()?.with_timeout(timeout),
            Some(raw) => {
                let url = parse_docker_url(raw).map_err(|reason| RuntimeError::InvalidUrl {
                    url: raw.to_string(),
                    reason,
                })?;

                match url.scheme() {
                    #[cfg(unix)]
                    "unix" => Docker::connect_with_unix(raw, timeout_secs, API_DEFAULT_VERSION)?,
                    _ => Docker::connect_with_http(raw, timeout_secs, API_DEFAULT_VERSION)?,
                }
            }
        };

        Ok(Self {
            docker,
            endpoint: docker_url.unwrap_or(LOCAL_DEFAULTS).to_string(),
        })
    }

    /// Address the client was built for, for logging
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Check that `raw` is an address bollard can connect to
///
/// bollard adds the API version prefix itself, so a path on a TCP address
/// would be ignored; such addresses are rejected instead.
pub fn validate_docker_url(raw: &str) -> Result<(), String> {
    parse_docker_url(raw).map(|_| ())
}

fn parse_docker_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;

    match url.scheme() {
        #[cfg(unix)]
        "unix" => {
            if url.path().is_empty() || url.path() == "/" {
                return Err("missing socket path".to_string());
            }
        }
        "http" | "tcp" => {
            if url.host_str().map(str::is_empty).unwrap_or(true) {
                return Err("missing host".to_string());
            }
            if !(url.path().is_empty() || url.path() == "/") || url.query().is_some() {
                return Err("path prefixes are not supported".to_string());
            }
        }
        other => return Err(format!("unsupported scheme '{}'", other)),
    }

    Ok(url)
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_running_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let options = ListContainersOptions::<String> {
            all: false,
            ..Default::default()
        };

        let containers = self.docker.list_containers(Some(options)).await?;
        debug!(count = containers.len(), "Listed running containers");

        containers.into_iter().map(summary_from_api).collect()
    }

    async fn get_stats(&self, container_id: &str) -> Result<RawStatsSnapshot, RuntimeError> {
        let options = StatsOptions {
            stream: false,
            one_shot: false,
        };

        let mut samples = Box::pin(self.docker.stats(container_id, Some(options)));
        let stats = samples
            .try_next()
            .await?
            .ok_or(RuntimeError::MissingField("stats sample"))?;

        Ok(stats.into())
    }

    async fn inspect(&self, container_id: &str) -> Result<ContainerDetails, RuntimeError> {
        let inspect = self
            .docker
            .inspect_container(container_id, None::<InspectContainerOptions>)
            .await?;

        let name = inspect
            .name
            .ok_or(RuntimeError::MissingField("container name"))?;

        Ok(ContainerDetails {
            name: display_name(&name),
        })
    }
}

fn summary_from_api(c: ApiContainerSummary) -> Result<ContainerSummary, RuntimeError> {
    let id = c.id.ok_or(RuntimeError::MissingField("container id"))?;

    let name = c
        .names
        .as_ref()
        .and_then(|names| names.first())
        .map(|n| display_name(n))
        .unwrap_or_else(|| id.chars().take(12).collect());

    Ok(ContainerSummary {
        name,
        image: c.image.unwrap_or_default(),
        status: c.status.unwrap_or_default(),
        id,
    })
}

impl From<Stats> for RawStatsSnapshot {
    fn from(s: Stats) -> Self {
        // Older daemons omit online_cpus
        let online_cpus = s
            .cpu_stats
            .online_cpus
            .filter(|n| *n > 0)
            .or_else(|| {
                s.cpu_stats
                    .cpu_usage
                    .percpu_usage
                    .as_ref()
                    .map(|v| v.len() as u64)
                    .filter(|n| *n > 0)
            })
            .unwrap_or(1);

        Self {
            cpu_usage_ns: s.cpu_stats.cpu_usage.total_usage,
            prev_cpu_usage_ns: s.precpu_stats.cpu_usage.total_usage,
            system_cpu_ns: s.cpu_stats.system_cpu_usage.unwrap_or_default(),
            prev_system_cpu_ns: s.precpu_stats.system_cpu_usage.unwrap_or_default(),
            online_cpus: u32::try_from(online_cpus).unwrap_or(u32::MAX),
            memory_usage_bytes: s.memory_stats.usage.unwrap_or_default(),
            memory_limit_bytes: s.memory_stats.limit.unwrap_or_default(),
        }
    }
}
