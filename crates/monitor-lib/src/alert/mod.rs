//! Alert gating and delivery
//!
//! This module provides:
//! - Per-container, per-metric cooldown suppression
//! - Webhook notification sinks
//! - Concurrent fan-out of alerts to every configured sink

mod debouncer;
mod dispatcher;
mod sink;

pub use debouncer::{AlertDebouncer, DEFAULT_COOLDOWN};
pub use dispatcher::{AlertDispatcher, DispatchReport};
pub use sink::{
    build_sinks, validate_sink_configs, Embed, NotificationSink, SinkConfig, WebhookPayload,
    WebhookSink, EMBED_TITLE,
};
