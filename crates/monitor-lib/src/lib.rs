//! Container monitoring library
//!
//! This crate provides the core functionality for:
//! - Enumerating running containers and fetching their raw stats
//! - Normalizing cumulative counters into CPU and memory percentages
//! - Threshold evaluation with per-container cooldown
//! - Alert fan-out to webhook sinks

pub mod alert;
pub mod console;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod observability;
pub mod runtime;
pub mod sampler;

pub use alert::{AlertDebouncer, AlertDispatcher, DispatchReport, NotificationSink, WebhookSink};
pub use error::{ConfigError, RuntimeError, SinkError};
pub use models::*;
pub use observability::StructuredLogger;
pub use runtime::{ContainerRuntime, DockerRuntime};
pub use sampler::{supervise, CycleReport, SamplerConfig, SamplingLoop};
