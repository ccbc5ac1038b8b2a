//! Notification sinks
//!
//! A sink is one outbound destination for alerts. The webhook sink posts a
//! chat-style embed payload: `{"embeds": [{title, description, color, timestamp}]}`.

use crate::error::{ConfigError, SinkError};
use crate::models::AlertEvent;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Title attached to every embed
pub const EMBED_TITLE: &str = "Container Monitor";

/// Trait for alert delivery implementations
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Name used in logs and dispatch reports
    fn name(&self) -> &str;

    /// Deliver a single alert
    async fn deliver(&self, event: &AlertEvent) -> Result<(), SinkError>;
}

/// One configured webhook endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkConfig {
    pub name: String,
    pub url: String,
}

/// Webhook body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    /// ISO-8601 UTC
    pub timestamp: String,
}

impl From<&AlertEvent> for WebhookPayload {
    fn from(event: &AlertEvent) -> Self {
        Self {
            embeds: vec![Embed {
                title: EMBED_TITLE.to_string(),
                description: event.message.clone(),
                color: event.severity.color(),
                timestamp: event
                    .timestamp
                    .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            }],
        }
    }
}

/// Sink that POSTs alerts as JSON to a webhook URL
pub struct WebhookSink {
    name: String,
    url: Url,
    client: Client,
}

impl WebhookSink {
    /// Create a sink from an already validated URL
    pub fn new(name: impl Into<String>, url: Url, client: Client) -> Self {
        Self {
            name: name.into(),
            url,
            client,
        }
    }

    /// Build a sink from configuration, rejecting malformed entries
    pub fn from_config(config: &SinkConfig, client: Client) -> Result<Self, ConfigError> {
        let url = parse_sink_url(config)?;
        Ok(Self::new(config.name.clone(), url, client))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, event: &AlertEvent) -> Result<(), SinkError> {
        let payload = WebhookPayload::from(event);

        let response = self
            .client
            .post(self.url.clone())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Status { status, body });
        }

        Ok(())
    }
}

fn parse_sink_url(config: &SinkConfig) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidSinkUrl {
        name: config.name.clone(),
        reason,
    };

    let url = Url::parse(&config.url).map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(invalid("missing host".to_string()));
    }

    Ok(url)
}

/// Validate a list of sink configurations without building clients
pub fn validate_sink_configs(configs: &[SinkConfig]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for config in configs {
        if config.name.trim().is_empty() {
            return Err(ConfigError::EmptySinkName);
        }
        if !seen.insert(config.name.as_str()) {
            return Err(ConfigError::DuplicateSink(config.name.clone()));
        }
        parse_sink_url(config)?;
    }

    Ok(())
}

/// Build every configured sink, sharing one HTTP client
pub fn build_sinks(
    configs: &[SinkConfig],
    request_timeout: Duration,
) -> Result<Vec<Arc<dyn NotificationSink>>, ConfigError> {
    validate_sink_configs(configs)?;

    let client = Client::builder().timeout(request_timeout).build()?;

    configs
        .iter()
        .map(|config| {
            WebhookSink::from_config(config, client.clone())
                .map(|sink| Arc::new(sink) as Arc<dyn NotificationSink>)
        })
        .collect()
}
