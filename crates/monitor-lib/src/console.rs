//! Console output
//!
//! Human-facing lines printed to stdout each cycle, separate from the
//! structured log stream.

use crate::models::{NormalizedMetrics, Thresholds};
use crate::normalizer::format_megabytes;
use colored::Colorize;
use std::time::Duration;

/// Startup banner listing the active thresholds
pub fn banner(thresholds: &Thresholds, cooldown: Duration, interval: Duration) -> String {
    format!(
        concat!(
            "Container monitor started\n",
            "  CPU threshold:    {:.2}%\n",
            "  Memory threshold: {:.2}%\n",
            "  Cooldown:         {}s\n",
            "  Interval:         {}s"
        ),
        thresholds.cpu_percent,
        thresholds.memory_percent,
        cooldown.as_secs(),
        interval.as_secs()
    )
}

/// One line per sampled container, uncolored
pub fn container_line(name: &str, metrics: &NormalizedMetrics) -> String {
    let memory_percent = metrics
        .memory_percent
        .map(|pct| format!("{:.2}%", pct))
        .unwrap_or_else(|| "no limit".to_string());

    format!(
        "{}: CPU {:.2}% | Memory {} MB ({})",
        name,
        metrics.cpu_percent,
        format_megabytes(metrics.memory_usage_bytes),
        memory_percent
    )
}

/// Waiting notice printed between cycles
pub fn waiting_line(interval: Duration) -> String {
    format!("Waiting {}s for next check...", interval.as_secs())
}

pub fn print_banner(thresholds: &Thresholds, cooldown: Duration, interval: Duration) {
    println!("{}", banner(thresholds, cooldown, interval).bold());
}

/// Print a container line, red when any threshold is breached
pub fn print_container(name: &str, metrics: &NormalizedMetrics, breached: bool) {
    let line = container_line(name, metrics);
    if breached {
        println!("{} {}", "✗".red().bold(), line.red());
    } else {
        println!("{} {}", "✓".green().bold(), line.green());
    }
}

pub fn print_failure(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_waiting(interval: Duration) {
    println!("{}", waiting_line(interval).dimmed());
}
