//! Conversion of raw runtime counters into percentages
//!
//! CPU usage is derived from the delta between the current and previous
//! cumulative counters, scaled by the number of online cores. Memory usage
//! is the raw usage counter over the configured limit.

use crate::models::{NormalizedMetrics, RawStatsSnapshot};
use tracing::debug;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Normalize a raw stats snapshot for one container
pub fn normalize(stats: &RawStatsSnapshot) -> NormalizedMetrics {
    NormalizedMetrics {
        cpu_percent: cpu_percent(stats),
        memory_usage_bytes: stats.memory_usage_bytes,
        memory_percent: memory_percent(stats.memory_usage_bytes, stats.memory_limit_bytes),
    }
}

/// CPU usage as a percentage of a single core, times online cores
///
/// Returns 0 when the system counter did not advance, and treats a
/// container counter that went backwards (restart) as no usage.
pub fn cpu_percent(stats: &RawStatsSnapshot) -> f64 {
    let system_delta = stats.system_cpu_ns.saturating_sub(stats.prev_system_cpu_ns);
    if system_delta == 0 {
        debug!(
            system_cpu_ns = stats.system_cpu_ns,
            prev_system_cpu_ns = stats.prev_system_cpu_ns,
            "System CPU counter did not advance, reporting 0% CPU"
        );
        return 0.0;
    }

    let cpu_delta = stats.cpu_usage_ns.saturating_sub(stats.prev_cpu_usage_ns);
    (cpu_delta as f64 / system_delta as f64) * f64::from(stats.online_cpus) * 100.0
}

/// Memory usage as a percentage of the limit, `None` when unlimited
pub fn memory_percent(usage_bytes: u64, limit_bytes: u64) -> Option<f64> {
    if limit_bytes == 0 {
        return None;
    }
    Some(usage_bytes as f64 / limit_bytes as f64 * 100.0)
}

/// Megabytes with two decimals, e.g. `"90.00"`
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / BYTES_PER_MB)
}
