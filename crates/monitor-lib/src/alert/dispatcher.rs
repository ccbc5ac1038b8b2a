//! Concurrent alert fan-out

use super::NotificationSink;
use crate::error::SinkError;
use crate::models::{AlertEvent, AlertSeverity};
use crate::observability::StructuredLogger;
use std::sync::Arc;

/// Outcome of one [`AlertDispatcher::send_alert`] call
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Sinks that accepted the alert
    pub delivered: Vec<String>,
    /// Sinks that failed, with the reason
    pub failed: Vec<(String, SinkError)>,
}

impl DispatchReport {
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Broadcasts alerts to every configured sink
///
/// The sink set is fixed at construction. Cloning is cheap and clones share
/// the same sinks.
#[derive(Clone, Default)]
pub struct AlertDispatcher {
    sinks: Arc<Vec<Arc<dyn NotificationSink>>>,
    logger: StructuredLogger,
}

impl AlertDispatcher {
    pub fn new(sinks: Vec<Arc<dyn NotificationSink>>) -> Self {
        Self {
            sinks: Arc::new(sinks),
            logger: StructuredLogger::default(),
        }
    }

    /// Use `logger` for dispatch and per-sink delivery events
    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Build an event stamped with the current time and dispatch it
    pub async fn send_alert(
        &self,
        message: impl Into<String>,
        severity: AlertSeverity,
    ) -> DispatchReport {
        self.dispatch(AlertEvent::new(message, severity)).await
    }

    /// Deliver `event` to every sink concurrently and wait for all of them
    ///
    /// Individual sink failures are logged and collected in the report;
    /// they never abort delivery to the remaining sinks.
    pub async fn dispatch(&self, event: AlertEvent) -> DispatchReport {
        self.logger.log_dispatch(event.severity, self.sinks.len(), &event.message);

        let event = Arc::new(event);
        let handles: Vec<_> = self
            .sinks
            .iter()
            .map(|sink| {
                let sink = Arc::clone(sink);
                let event = Arc::clone(&event);
                let name = sink.name().to_string();
                let handle = tokio::spawn(async move { sink.deliver(&event).await });
                (name, handle)
            })
            .collect();

        let mut report = DispatchReport::default();

        for (name, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(SinkError::Aborted(e.to_string())),
            };

            match result {
                Ok(()) => {
                    self.logger.log_sink_delivered(&name);
                    report.delivered.push(name);
                }
                Err(e) => {
                    self.logger.log_sink_failure(&name, &e);
                    report.failed.push((name, e));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Barrier;
    use tracing_subscriber::fmt::MakeWriter;

    /// Collects formatted log output in memory
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Mock sink for testing
    struct MockSink {
        name: String,
        fail: bool,
        calls: AtomicUsize,
        barrier: Option<Arc<Barrier>>,
    }

    impl MockSink {
        fn new(name: &str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                fail,
                calls: AtomicUsize::new(0),
                barrier: None,
            })
        }

        fn with_barrier(name: &str, barrier: Arc<Barrier>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                fail: false,
                calls: AtomicUsize::new(0),
                barrier: Some(barrier),
            })
        }
    }

    #[async_trait]
    impl NotificationSink for MockSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn deliver(&self, _event: &AlertEvent) -> Result<(), SinkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(barrier) = &self.barrier {
                barrier.wait().await;
            }
            if self.fail {
                return Err(SinkError::Rejected("unreachable".to_string()));
            }
            Ok(())
        }
    }

    struct PanickingSink;

    #[async_trait]
    impl NotificationSink for PanickingSink {
        fn name(&self) -> &str {
            "panics"
        }

        async fn deliver(&self, _event: &AlertEvent) -> Result<(), SinkError> {
            panic!("sink bug");
        }
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_block_others() {
        let sinks = vec![
            MockSink::new("one", false),
            MockSink::new("two", true),
            MockSink::new("three", false),
            MockSink::new("four", false),
        ];
        let dispatcher = AlertDispatcher::new(
            sinks
                .iter()
                .map(|s| Arc::clone(s) as Arc<dyn NotificationSink>)
                .collect(),
        );

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            dispatcher.send_alert("High CPU usage on web-1", AlertSeverity::Warning),
        )
        .await
        .expect("dispatch should complete");

        assert_eq!(report.delivered, vec!["one", "three", "four"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "two");
        assert!(!report.all_delivered());

        for sink in &sinks {
            assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn test_sinks_are_contacted_concurrently() {
        // Each sink waits until all three are in flight; sequential delivery
        // would never get past the first one.
        let barrier = Arc::new(Barrier::new(3));
        let dispatcher = AlertDispatcher::new(
            ["a", "b", "c"]
                .into_iter()
                .map(|name| {
                    MockSink::with_barrier(name, Arc::clone(&barrier)) as Arc<dyn NotificationSink>
                })
                .collect(),
        );

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            dispatcher.send_alert("startup", AlertSeverity::Info),
        )
        .await
        .expect("sinks should be dispatched concurrently");

        assert_eq!(report.delivered.len(), 3);
        assert!(report.all_delivered());
    }

    #[tokio::test]
    async fn test_panicking_sink_is_reported_as_failure() {
        let ok = MockSink::new("ok", false);
        let dispatcher = AlertDispatcher::new(vec![
            Arc::new(PanickingSink) as Arc<dyn NotificationSink>,
            Arc::clone(&ok) as Arc<dyn NotificationSink>,
        ]);

        let report = dispatcher.send_alert("boom", AlertSeverity::Critical).await;

        assert_eq!(report.delivered, vec!["ok"]);
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(report.failed[0].1, SinkError::Aborted(_)));
    }

    #[tokio::test]
    async fn test_no_sinks() {
        let dispatcher = AlertDispatcher::default();
        let report = dispatcher.send_alert("nobody listens", AlertSeverity::Info).await;

        assert_eq!(dispatcher.sink_count(), 0);
        assert!(report.delivered.is_empty());
        assert!(report.all_delivered());
    }

    #[tokio::test]
    async fn test_sink_failure_is_logged_as_structured_event() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(logs.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let dispatcher = AlertDispatcher::new(vec![
            MockSink::new("ok", false) as Arc<dyn NotificationSink>,
            MockSink::new("broken", true) as Arc<dyn NotificationSink>,
        ])
        .with_logger(StructuredLogger::new("mock"));

        dispatcher.send_alert("disk full", AlertSeverity::Critical).await;

        let output = logs.contents();
        assert!(output.contains(r#""event":"alert_dispatched""#), "{output}");
        assert!(output.contains(r#""event":"alert_delivered""#), "{output}");
        assert!(output.contains(r#""event":"sink_delivery_failed""#), "{output}");
        assert!(output.contains(r#""sink":"broken""#), "{output}");
        assert!(output.contains(r#""runtime":"mock""#), "{output}");
    }
}
