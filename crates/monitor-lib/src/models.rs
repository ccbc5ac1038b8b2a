//! Core data models for the container monitor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A running container as reported by the runtime in one cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: String,
}

/// Metadata returned by a container inspect call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDetails {
    pub name: String,
}

/// Point-in-time pair of cumulative CPU counters plus memory counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStatsSnapshot {
    pub cpu_usage_ns: u64,
    pub prev_cpu_usage_ns: u64,
    pub system_cpu_ns: u64,
    pub prev_system_cpu_ns: u64,
    pub online_cpus: u32,
    pub memory_usage_bytes: u64,
    /// Zero when the runtime reports no limit
    pub memory_limit_bytes: u64,
}

/// Percentages derived from one [`RawStatsSnapshot`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMetrics {
    pub cpu_percent: f64,
    pub memory_usage_bytes: u64,
    /// `None` when the container has no memory limit
    pub memory_percent: Option<f64>,
}

/// Alerting thresholds, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_percent: 80.0,
            memory_percent: 80.0,
        }
    }
}

impl Thresholds {
    /// Strict greater-than; zero is a valid always-trigger threshold
    pub fn cpu_breached(&self, metrics: &NormalizedMetrics) -> bool {
        metrics.cpu_percent > self.cpu_percent
    }

    pub fn memory_breached(&self, metrics: &NormalizedMetrics) -> bool {
        metrics
            .memory_percent
            .map(|pct| pct > self.memory_percent)
            .unwrap_or(false)
    }

    /// Metrics that exceed their threshold, CPU first
    pub fn breaches(&self, metrics: &NormalizedMetrics) -> Vec<MetricKind> {
        let mut breached = Vec::new();
        if self.cpu_breached(metrics) {
            breached.push(MetricKind::Cpu);
        }
        if self.memory_breached(metrics) {
            breached.push(MetricKind::Memory);
        }
        breached
    }
}

/// Metric that an alert refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Cpu,
    Memory,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Cpu => write!(f, "cpu"),
            MetricKind::Memory => write!(f, "memory"),
        }
    }
}

/// Alert severity, rendered as an embed color by webhook sinks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn color(&self) -> u32 {
        match self {
            AlertSeverity::Info => 0x00FF00,
            AlertSeverity::Warning => 0xFFA500,
            AlertSeverity::Critical => 0xFF0000,
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::Info => write!(f, "info"),
            AlertSeverity::Warning => write!(f, "warning"),
            AlertSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// A single notification handed to the dispatcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub message: String,
    pub severity: AlertSeverity,
    pub timestamp: DateTime<Utc>,
}

impl AlertEvent {
    pub fn new(message: impl Into<String>, severity: AlertSeverity) -> Self {
        Self::at(message, severity, Utc::now())
    }

    pub fn at(
        message: impl Into<String>,
        severity: AlertSeverity,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            message: message.into(),
            severity,
            timestamp,
        }
    }
}
