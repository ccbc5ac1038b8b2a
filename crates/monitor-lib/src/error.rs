//! Error types for the monitoring pipeline

use thiserror::Error;

/// Failures talking to the container runtime
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime request failed: {0}")]
    Docker(bollard::errors::Error),

    #[error("runtime returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode runtime response: {0}")]
    Decode(String),

    #[error("runtime response is missing {0}")]
    MissingField(&'static str),

    #[error("invalid runtime url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl From<bollard::errors::Error> for RuntimeError {
    fn from(err: bollard::errors::Error) -> Self {
        use bollard::errors::Error as DockerError;

        match err {
            DockerError::DockerResponseServerError {
                status_code,
                message,
            } => RuntimeError::Status {
                status: status_code,
                body: message,
            },
            e @ (DockerError::JsonDataError { .. } | DockerError::JsonSerdeError { .. }) => {
                RuntimeError::Decode(e.to_string())
            }
            other => RuntimeError::Docker(other),
        }
    }
}

/// Failures delivering to a single notification sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Rejected(String),

    #[error("sink task aborted: {0}")]
    Aborted(String),
}

/// Invalid startup configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} threshold must be a finite, non-negative percentage (got {value})")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("sampling interval must be greater than zero")]
    ZeroInterval,

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("invalid docker url '{url}': {reason}")]
    InvalidDockerUrl { url: String, reason: String },

    #[error("sink name must not be empty")]
    EmptySinkName,

    #[error("duplicate sink name '{0}'")]
    DuplicateSink(String),

    #[error("sink '{name}' has an invalid url: {reason}")]
    InvalidSinkUrl { name: String, reason: String },

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}
