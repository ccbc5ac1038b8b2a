//! Cooldown tracking for threshold alerts

use crate::models::MetricKind;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// Default cooldown between alerts for the same container and metric (5 minutes)
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5 * 60);

/// Key for cooldown tracking
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CooldownKey {
    container_name: String,
    metric: MetricKind,
}

/// Decides whether an alert may be sent for a (container, metric) pair
///
/// Keyed by container name, so a container recreated under the same name
/// keeps its cooldown window. The timestamp is recorded when an alert is
/// permitted, whether or not delivery later succeeds.
#[derive(Debug)]
pub struct AlertDebouncer {
    cooldown: Duration,
    last_sent: HashMap<CooldownKey, DateTime<Utc>>,
}

impl Default for AlertDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl AlertDebouncer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_sent: HashMap::new(),
        }
    }

    /// Check-and-record against the current wall clock
    pub fn can_send_alert(&mut self, container_name: &str, metric: MetricKind) -> bool {
        self.can_send_alert_at(container_name, metric, Utc::now())
    }

    /// Permit if no alert was recorded for the pair, or the last one is
    /// strictly older than the cooldown. Records `now` on permit.
    pub fn can_send_alert_at(
        &mut self,
        container_name: &str,
        metric: MetricKind,
        now: DateTime<Utc>,
    ) -> bool {
        let key = CooldownKey {
            container_name: container_name.to_string(),
            metric,
        };

        let permitted = match self.last_sent.get(&key) {
            Some(last) => elapsed(*last, now).map_or(false, |e| e > self.cooldown),
            None => true,
        };

        if permitted {
            self.last_sent.insert(key, now);
        }

        permitted
    }

    /// Drop entries whose cooldown has already elapsed at `now`
    ///
    /// Such entries would permit the next alert anyway, so removing them
    /// does not change any decision.
    pub fn evict_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.last_sent.len();
        let cooldown = self.cooldown;
        self.last_sent
            .retain(|_, last| elapsed(*last, now).map_or(true, |e| e <= cooldown));
        before - self.last_sent.len()
    }

    pub fn len(&self) -> usize {
        self.last_sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_sent.is_empty()
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

/// Time from `last` to `now`, `None` if the clock went backwards
fn elapsed(last: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
    now.signed_duration_since(last).to_std().ok()
}
