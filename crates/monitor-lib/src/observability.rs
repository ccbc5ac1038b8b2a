//! Structured logging for monitor events
//!
//! Every notable pipeline event is emitted as a `tracing` event with
//! consistent field names so JSON log output can be filtered on `event`.

use crate::models::{AlertSeverity, MetricKind, NormalizedMetrics, Thresholds};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Structured logger for monitor events
///
/// Carries the runtime endpoint so log lines from several monitors can be
/// told apart.
#[derive(Clone, Default)]
pub struct StructuredLogger {
    runtime: String,
}

impl StructuredLogger {
    pub fn new(runtime: impl Into<String>) -> Self {
        Self {
            runtime: runtime.into(),
        }
    }

    pub fn runtime(&self) -> &str {
        &self.runtime
    }

    /// Log monitor startup
    pub fn log_startup(
        &self,
        version: &str,
        thresholds: &Thresholds,
        cooldown: Duration,
        sinks: usize,
    ) {
        info!(
            event = "monitor_started",
            runtime = %self.runtime,
            version = %version,
            cpu_threshold_percent = thresholds.cpu_percent,
            memory_threshold_percent = thresholds.memory_percent,
            cooldown_secs = cooldown.as_secs(),
            sinks = sinks,
            "Container monitor started"
        );
    }

    /// Log one container sample
    pub fn log_sample(&self, container_id: &str, name: &str, metrics: &NormalizedMetrics) {
        debug!(
            event = "container_sampled",
            runtime = %self.runtime,
            container_id = %container_id,
            container = %name,
            cpu_percent = metrics.cpu_percent,
            memory_usage_bytes = metrics.memory_usage_bytes,
            memory_percent = ?metrics.memory_percent,
            "Sampled container"
        );
    }

    /// Log a threshold breach and whether it was forwarded
    pub fn log_breach(
        &self,
        name: &str,
        metric: MetricKind,
        value: f64,
        threshold: f64,
        sent: bool,
    ) {
        if sent {
            warn!(
                event = "threshold_exceeded",
                runtime = %self.runtime,
                container = %name,
                metric = %metric,
                value = value,
                threshold = threshold,
                "Threshold exceeded, alerting"
            );
        } else {
            debug!(
                event = "alert_suppressed",
                runtime = %self.runtime,
                container = %name,
                metric = %metric,
                value = value,
                threshold = threshold,
                "Threshold exceeded, alert in cooldown"
            );
        }
    }

    /// Log a failed container listing
    pub fn log_listing_failure(&self, err: &dyn std::fmt::Display) {
        error!(
            event = "container_listing_failed",
            runtime = %self.runtime,
            error = %err,
            "Failed to list containers"
        );
    }

    /// Log a failed stats or inspect call for one container
    pub fn log_collection_failure(
        &self,
        container_id: &str,
        name: &str,
        err: &dyn std::fmt::Display,
    ) {
        error!(
            event = "container_collection_failed",
            runtime = %self.runtime,
            container_id = %container_id,
            container = %name,
            error = %err,
            "Failed to collect container stats"
        );
    }

    /// Log the end of a sampling cycle
    pub fn log_cycle(
        &self,
        containers: usize,
        failed: usize,
        alerts_sent: usize,
        elapsed: Duration,
    ) {
        debug!(
            event = "cycle_complete",
            runtime = %self.runtime,
            containers = containers,
            errors = failed,
            alerts_sent = alerts_sent,
            elapsed_ms = elapsed.as_millis() as u64,
            "Sampling cycle complete"
        );
    }

    /// Log an alert about to be fanned out
    pub fn log_dispatch(&self, severity: AlertSeverity, sinks: usize, message: &str) {
        info!(
            event = "alert_dispatched",
            runtime = %self.runtime,
            severity = %severity,
            sinks = sinks,
            message = %message,
            "Dispatching alert"
        );
    }

    pub fn log_sink_delivered(&self, sink: &str) {
        debug!(
            event = "alert_delivered",
            runtime = %self.runtime,
            sink = %sink,
            "Alert delivered"
        );
    }

    /// Log a sink that failed or panicked during delivery
    pub fn log_sink_failure(&self, sink: &str, err: &dyn std::fmt::Display) {
        warn!(
            event = "sink_delivery_failed",
            runtime = %self.runtime,
            sink = %sink,
            error = %err,
            "Failed to deliver alert"
        );
    }

    /// Log a fatal error that stops the monitor
    pub fn log_fatal(&self, err: &dyn std::fmt::Display) {
        error!(
            event = "monitor_fatal",
            runtime = %self.runtime,
            error = %err,
            "Monitor stopped by fatal error"
        );
    }

    /// Log monitor shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "monitor_shutdown",
            runtime = %self.runtime,
            reason = %reason,
            "Container monitor shutting down"
        );
    }
}
