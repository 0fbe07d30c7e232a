//! End-to-end pipeline tests: ingest, tick, broadcast, dispatch.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use notify::{DispatchError, Notifier, ProviderReceipt, SmsChannel, SmsMessage};
use telemetry::{
    Broadcaster, Caller, Ingestor, LiveCache, LivestockId, LivestockRecord, SqliteStore,
    TelemetryEvent, TelemetryMonitor, Thresholds, VitalsSample, MONITOR_ROOM,
};
use uuid::Uuid;

/// Records every message it is asked to send.
struct CountingChannel {
    sent: Mutex<Vec<SmsMessage>>,
}

impl CountingChannel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(vec![]),
        })
    }

    fn sent(&self) -> Vec<SmsMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmsChannel for CountingChannel {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn send(&self, message: &SmsMessage) -> Result<ProviderReceipt, DispatchError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(ProviderReceipt::new(serde_json::Value::Null))
    }
}

/// Fails every send, like an unreachable gateway.
struct FailingChannel;

#[async_trait]
impl SmsChannel for FailingChannel {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn send(&self, _message: &SmsMessage) -> Result<ProviderReceipt, DispatchError> {
        Err(DispatchError::Gateway {
            status: 503,
            body: "gateway unreachable".to_string(),
        })
    }
}

struct Pipeline {
    _dir: tempfile::TempDir,
    ingestor: Ingestor,
    broadcaster: Arc<Broadcaster>,
    monitor: Arc<TelemetryMonitor>,
}

impl Pipeline {
    async fn with_notifier(notifier: Notifier) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::open(dir.path().join("herd.db")).unwrap());
        store
            .register_livestock(LivestockRecord {
                livestock_id: LivestockId(7),
                name: "Bessie".to_string(),
                owner_ref: "farmer-17".to_string(),
                contact: "+254700000001".to_string(),
                submit_key: "device-key".to_string(),
            })
            .await
            .unwrap();

        let cache = Arc::new(LiveCache::new());
        let broadcaster = Arc::new(Broadcaster::new());
        let ingestor = Ingestor::new(store.clone(), store, cache.clone());
        let monitor = Arc::new(TelemetryMonitor::new(
            cache,
            broadcaster.clone(),
            Arc::new(notifier),
            Thresholds::default(),
            Duration::from_secs(5),
        ));

        Self {
            _dir: dir,
            ingestor,
            broadcaster,
            monitor,
        }
    }

    async fn ingest(&self, temperature: f64, pulse: i64) {
        self.ingestor
            .receive(
                &Caller::with_token("device-key"),
                LivestockId(7),
                VitalsSample { temperature, pulse },
            )
            .await
            .unwrap();
    }
}

/// Poll the counting channel until the fire-and-forget dispatch task ran.
async fn wait_for_sends(channel: &CountingChannel, expected: usize) -> Vec<SmsMessage> {
    for _ in 0..100 {
        let sent = channel.sent();
        if sent.len() >= expected {
            return sent;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    channel.sent()
}

#[tokio::test]
async fn idle_tick_evaluates_and_dispatches_nothing() {
    let channel = CountingChannel::new();
    let pipeline = Pipeline::with_notifier(Notifier::with_channels(vec![channel.clone()])).await;

    // A breach is sitting in the cache, but nobody is watching.
    pipeline.ingest(42.0, 130).await;
    let report = pipeline.monitor.tick();

    assert!(report.is_idle());
    assert_eq!(report.entries, 0);
    assert_eq!(report.alerts, 0);
    assert_eq!(report.dispatched, 0);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(channel.sent().is_empty());
}

#[tokio::test]
async fn breach_tick_broadcasts_alert_and_dispatches_one_sms() {
    let channel = CountingChannel::new();
    let pipeline = Pipeline::with_notifier(Notifier::with_channels(vec![channel.clone()])).await;

    let mut rx = pipeline.broadcaster.join(MONITOR_ROOM, Uuid::new_v4());
    pipeline.ingest(42.0, 75).await;

    let report = pipeline.monitor.tick();
    assert_eq!(report.members, 1);
    assert_eq!(report.entries, 1);
    assert_eq!(report.alerts, 1);
    assert_eq!(report.dispatched, 1);

    match rx.recv().await.unwrap() {
        TelemetryEvent::LivestockData {
            livestock_id,
            temperature,
            pulse,
            ..
        } => {
            assert_eq!(livestock_id, LivestockId(7));
            assert!((temperature - 42.0).abs() < f64::EPSILON);
            assert_eq!(pulse, 75);
        }
        other => panic!("expected livestock_data frame, got {other:?}"),
    }

    match rx.recv().await.unwrap() {
        TelemetryEvent::LivestockAlert {
            livestock_id,
            metric,
            value,
            exceeding,
            message,
        } => {
            assert_eq!(livestock_id, LivestockId(7));
            assert_eq!(metric.as_str(), "temperature");
            assert!((value - 42.0).abs() < f64::EPSILON);
            assert!(exceeding);
            assert!(message.contains("High temperature"));
        }
        other => panic!("expected livestock_alert frame, got {other:?}"),
    }

    let sent = wait_for_sends(&channel, 1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "+254700000001");
    assert_eq!(
        sent[0].body,
        "Livestock Alert: High temperature detected!\nCurrent temperature: 42.0°C."
    );
}

#[tokio::test]
async fn normal_tick_broadcasts_data_only() {
    let channel = CountingChannel::new();
    let pipeline = Pipeline::with_notifier(Notifier::with_channels(vec![channel.clone()])).await;

    let mut rx = pipeline.broadcaster.join(MONITOR_ROOM, Uuid::new_v4());
    pipeline.ingest(38.0, 75).await;

    let report = pipeline.monitor.tick();
    assert_eq!(report.data_events, 1);
    assert_eq!(report.alerts, 0);
    assert_eq!(report.dispatched, 0);

    assert!(matches!(
        rx.recv().await.unwrap(),
        TelemetryEvent::LivestockData { .. }
    ));
    // Nothing else queued: the next tick's data frame arrives first.
    pipeline.monitor.tick();
    assert!(matches!(
        rx.recv().await.unwrap(),
        TelemetryEvent::LivestockData { .. }
    ));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(channel.sent().is_empty());
}

#[tokio::test]
async fn failed_dispatch_does_not_block_alert_broadcast() {
    let pipeline =
        Pipeline::with_notifier(Notifier::with_channels(vec![Arc::new(FailingChannel)])).await;

    let mut rx = pipeline.broadcaster.join(MONITOR_ROOM, Uuid::new_v4());
    pipeline.ingest(42.0, 75).await;

    let report = pipeline.monitor.tick();
    assert_eq!(report.alerts, 1);
    assert_eq!(report.dispatched, 1);

    // The alert frame reaches the dashboard even though the SMS failed.
    assert!(matches!(
        rx.recv().await.unwrap(),
        TelemetryEvent::LivestockData { .. }
    ));
    assert!(matches!(
        rx.recv().await.unwrap(),
        TelemetryEvent::LivestockAlert { .. }
    ));
}

#[tokio::test]
async fn tick_after_leave_goes_idle_again() {
    let channel = CountingChannel::new();
    let pipeline = Pipeline::with_notifier(Notifier::with_channels(vec![channel.clone()])).await;

    let connection = Uuid::new_v4();
    let _rx = pipeline.broadcaster.join(MONITOR_ROOM, connection);
    pipeline.ingest(42.0, 75).await;

    assert_eq!(pipeline.monitor.tick().alerts, 1);

    pipeline.broadcaster.leave(MONITOR_ROOM, connection);
    let report = pipeline.monitor.tick();
    assert!(report.is_idle());

    let sent = wait_for_sends(&channel, 1).await;
    assert_eq!(sent.len(), 1, "only the joined tick dispatched");
}
