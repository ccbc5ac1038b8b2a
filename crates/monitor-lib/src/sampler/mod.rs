//! Sampling loop
//!
//! Each cycle lists the running containers, samples every one of them,
//! evaluates the thresholds and dispatches alerts that pass the cooldown.
//! Failures are contained per container (or per cycle for the listing
//! call); nothing a collaborator returns stops the loop.


use crate::alert::{AlertDebouncer, AlertDispatcher, DispatchReport, DEFAULT_COOLDOWN};
use crate::console;
use crate::error::RuntimeError;
use crate::models::{
    AlertEvent, AlertSeverity, ContainerSummary, MetricKind, NormalizedMetrics, Thresholds,
};
use crate::normalizer::{format_megabytes, normalize};
use crate::observability::StructuredLogger;
use crate::runtime::ContainerRuntime;
use chrono::{DateTime, Utc};
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::warn;

/// Default time between cycles
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);

/// Configuration for the sampling loop
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub thresholds: Thresholds,
    /// Minimum time between two alerts for the same container and metric
    pub cooldown: Duration,
    /// Time between cycles (default: 3 seconds)
    pub interval: Duration,
    /// Print per-container lines to stdout
    pub console_output: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            cooldown: DEFAULT_COOLDOWN,
            interval: DEFAULT_INTERVAL,
            console_output: true,
        }
    }
}

/// Results from one sampling cycle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Containers returned by the listing call
    pub containers_seen: usize,
    /// Containers whose stats were collected and evaluated
    pub sampled: usize,
    /// Containers skipped because a runtime call failed
    pub failed: usize,
    pub alerts_sent: usize,
    pub alerts_suppressed: usize,
    pub listing_failed: bool,
}

/// Drives the list, sample, evaluate, alert pipeline
pub struct SamplingLoop {
    runtime: Arc<dyn ContainerRuntime>,
    dispatcher: AlertDispatcher,
    debouncer: AlertDebouncer,
    config: SamplerConfig,
    logger: StructuredLogger,
}

impl SamplingLoop {
    /// A zero interval is replaced with [`DEFAULT_INTERVAL`]
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        dispatcher: AlertDispatcher,
        mut config: SamplerConfig,
        logger: StructuredLogger,
    ) -> Self {
        if config.interval.is_zero() {
            warn!(
                default_secs = DEFAULT_INTERVAL.as_secs(),
                "Sampling interval is zero, using default"
            );
            config.interval = DEFAULT_INTERVAL;
        }

        Self {
            runtime,
            dispatcher,
            debouncer: AlertDebouncer::new(config.cooldown),
            config,
            logger,
        }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn debouncer(&self) -> &AlertDebouncer {
        &self.debouncer
    }

    /// Print the banner and send the startup notice to every sink
    pub async fn announce_startup(&self, version: &str) -> DispatchReport {
        let thresholds = &self.config.thresholds;

        self.logger.log_startup(
            version,
            thresholds,
            self.config.cooldown,
            self.dispatcher.sink_count(),
        );
        if self.config.console_output {
            console::print_banner(thresholds, self.config.cooldown, self.config.interval);
        }

        self.dispatcher
            .send_alert(
                format!(
                    "Container monitor started. CPU threshold: {}%, memory threshold: {}%",
                    thresholds.cpu_percent, thresholds.memory_percent
                ),
                AlertSeverity::Info,
            )
            .await
    }

    /// Run cycles forever, one per tick; the first cycle starts immediately
    pub async fn run(mut self) -> Infallible {
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.run_cycle().await;

            if self.config.console_output {
                console::print_waiting(self.config.interval);
            }
        }
    }

    /// Run one cycle against the wall clock
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.run_cycle_at(Utc::now()).await
    }

    /// Run one cycle, using `now` for cooldown decisions and alert timestamps
    pub async fn run_cycle_at(&mut self, now: DateTime<Utc>) -> CycleReport {
        let start = Instant::now();
        let mut report = CycleReport::default();

        let containers = match self.runtime.list_running_containers().await {
            Ok(containers) => containers,
            Err(e) => {
                self.logger.log_listing_failure(&e);
                if self.config.console_output {
                    console::print_failure(&format!("Failed to list containers: {}", e));
                }
                report.listing_failed = true;
                self.notify(format!("Failed to list containers: {}", e), now).await;
                Vec::new()
            }
        };

        report.containers_seen = containers.len();

        for container in &containers {
            match self.sample(container).await {
                Ok((name, metrics)) => {
                    report.sampled += 1;
                    self.evaluate(&name, &metrics, now, &mut report).await;
                }
                Err(e) => {
                    report.failed += 1;
                    self.logger.log_collection_failure(&container.id, &container.name, &e);
                    let message = format!(
                        "Failed to collect stats for container {}: {}",
                        container.name, e
                    );
                    if self.config.console_output {
                        console::print_failure(&message);
                    }
                    self.notify(message, now).await;
                }
            }
        }

        self.debouncer.evict_expired(now);

        self.logger.log_cycle(
            report.containers_seen,
            report.failed,
            report.alerts_sent,
            start.elapsed(),
        );

        report
    }

    /// Fetch stats and display name for one container
    async fn sample(
        &self,
        container: &ContainerSummary,
    ) -> Result<(String, NormalizedMetrics), RuntimeError> {
        let stats = self.runtime.get_stats(&container.id).await?;
        let details = self.runtime.inspect(&container.id).await?;

        let metrics = normalize(&stats);
        self.logger.log_sample(&container.id, &details.name, &metrics);

        Ok((details.name, metrics))
    }

    /// Compare against thresholds and alert on breaches that pass the cooldown
    async fn evaluate(
        &mut self,
        name: &str,
        metrics: &NormalizedMetrics,
        now: DateTime<Utc>,
        report: &mut CycleReport,
    ) {
        let thresholds = self.config.thresholds;
        let breaches = thresholds.breaches(metrics);

        if self.config.console_output {
            console::print_container(name, metrics, !breaches.is_empty());
        }

        for metric in breaches {
            let (value, threshold) = match metric {
                MetricKind::Cpu => (metrics.cpu_percent, thresholds.cpu_percent),
                MetricKind::Memory => (
                    metrics.memory_percent.unwrap_or_default(),
                    thresholds.memory_percent,
                ),
            };

            let permitted = self.debouncer.can_send_alert_at(name, metric, now);
            self.logger.log_breach(name, metric, value, threshold, permitted);

            if !permitted {
                report.alerts_suppressed += 1;
                continue;
            }

            let message = alert_message(name, metric, metrics, &thresholds);
            self.dispatcher
                .dispatch(AlertEvent::at(message, AlertSeverity::Warning, now))
                .await;
            report.alerts_sent += 1;
        }
    }

    /// Operational notice, not subject to cooldown
    async fn notify(&self, message: String, now: DateTime<Utc>) {
        self.dispatcher
            .dispatch(AlertEvent::at(message, AlertSeverity::Critical, now))
            .await;
    }
}

/// Wait for the sampling task to end or for `shutdown` to resolve
///
/// The loop never returns on its own, so a finished task means it panicked:
/// the failure is logged, a Critical notice is sent and 1 is returned.
/// On shutdown the task is aborted and 0 is returned.
pub async fn supervise<F>(
    mut task: JoinHandle<Infallible>,
    shutdown: F,
    dispatcher: &AlertDispatcher,
    logger: &StructuredLogger,
) -> i32
where
    F: Future<Output = ()>,
{
    tokio::select! {
        joined = &mut task => {
            let reason = match joined {
                Ok(never) => match never {},
                Err(e) => e.to_string(),
            };
            logger.log_fatal(&reason);
            dispatcher
                .send_alert(
                    format!("Container monitor stopped by a fatal error: {}", reason),
                    AlertSeverity::Critical,
                )
                .await;
            1
        }
        _ = shutdown => {
            logger.log_shutdown("shutdown requested");
            task.abort();
            0
        }
    }
}

/// Alert text for a breached metric
pub fn alert_message(
    name: &str,
    metric: MetricKind,
    metrics: &NormalizedMetrics,
    thresholds: &Thresholds,
) -> String {
    match metric {
        MetricKind::Cpu => format!(
            "High CPU usage on {}: {:.2}% (threshold {}%)",
            name, metrics.cpu_percent, thresholds.cpu_percent
        ),
        MetricKind::Memory => format!(
            "High memory usage on {}: {} MB ({:.2}%, threshold {}%)",
            name,
            format_megabytes(metrics.memory_usage_bytes),
            metrics.memory_percent.unwrap_or_default(),
            thresholds.memory_percent
        ),
    }
}
