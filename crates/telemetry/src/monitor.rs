//! Periodic evaluation and broadcast loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use notify::{templates, Notifier, SmsMessage};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::cache::LiveCache;
use crate::evaluator::{evaluate, Thresholds};
use crate::events::TelemetryEvent;
use crate::rooms::{Broadcaster, MONITOR_ROOM};

/// Counts from one monitor tick.
///
/// An idle tick (no joined connections) reports zeros across the board:
/// the cache is not snapshotted and nothing is evaluated or dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Connections in the monitoring room when the tick ran.
    pub members: usize,
    /// Cache entries evaluated.
    pub entries: usize,
    /// `livestock_data` frames broadcast.
    pub data_events: usize,
    /// Threshold breaches found (equals `livestock_alert` frames).
    pub alerts: usize,
    /// SMS messages handed to the notifier.
    pub dispatched: usize,
}

impl TickReport {
    /// Whether the tick skipped all work because the room was empty.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.members == 0
    }
}

/// The background loop driving dashboard broadcasts and SMS alerts.
///
/// One monitor per process. [`TelemetryMonitor::ensure_started`] is
/// idempotent, so every new dashboard connection can call it; the loop
/// then ticks until [`TelemetryMonitor::shutdown`] cancels it. Ticks with
/// an empty room are free apart from the member count check.
pub struct TelemetryMonitor {
    cache: Arc<LiveCache>,
    broadcaster: Arc<Broadcaster>,
    notifier: Arc<Notifier>,
    thresholds: Thresholds,
    tick_interval: Duration,
    started: AtomicBool,
    cancel: CancellationToken,
}

impl TelemetryMonitor {
    #[must_use]
    pub fn new(
        cache: Arc<LiveCache>,
        broadcaster: Arc<Broadcaster>,
        notifier: Arc<Notifier>,
        thresholds: Thresholds,
        tick_interval: Duration,
    ) -> Self {
        Self {
            cache,
            broadcaster,
            notifier,
            thresholds,
            tick_interval,
            started: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        }
    }

    /// Start the loop if it is not running yet.
    ///
    /// The second and every later call is a no-op, so the gateway can call
    /// this from each WebSocket upgrade without spawning duplicate loops.
    pub fn ensure_started(self: &Arc<Self>) {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        info!(
            interval_secs = self.tick_interval.as_secs_f64(),
            "starting telemetry monitor loop"
        );
        let monitor = Arc::clone(self);
        tokio::spawn(async move { monitor.run().await });
    }

    /// Whether the loop has been started.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Stop the loop. Safe to call more than once or before start.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    async fn run(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    info!("telemetry monitor loop stopped");
                    break;
                }
                _ = interval.tick() => {
                    let report = self.tick();
                    if report.is_idle() {
                        trace!("monitor tick skipped, no joined connections");
                    } else {
                        debug!(
                            members = report.members,
                            entries = report.entries,
                            alerts = report.alerts,
                            dispatched = report.dispatched,
                            "monitor tick"
                        );
                    }
                }
            }
        }
    }

    /// Run one evaluation pass over the live cache.
    ///
    /// With zero joined connections this returns immediately without
    /// touching the cache or the notifier. Otherwise every cache entry is
    /// re-broadcast as `livestock_data`, evaluated against the thresholds,
    /// and each breach is broadcast as `livestock_alert` and handed to the
    /// notifier as one SMS to the animal's contact. The notifier spawns
    /// its own dispatch tasks, so a slow or dead SMS gateway can never
    /// delay the next tick.
    pub fn tick(&self) -> TickReport {
        let members = self.broadcaster.member_count(MONITOR_ROOM);
        if members == 0 {
            return TickReport::default();
        }

        let mut report = TickReport {
            members,
            ..TickReport::default()
        };

        for entry in self.cache.snapshot() {
            self.broadcaster
                .broadcast(MONITOR_ROOM, TelemetryEvent::data(&entry));
            report.entries += 1;
            report.data_events += 1;

            for alert in evaluate(&entry, &self.thresholds) {
                let message =
                    templates::livestock_alert(alert.metric.as_str(), alert.value, alert.exceeding);
                self.broadcaster
                    .broadcast(MONITOR_ROOM, TelemetryEvent::alert(&alert, message.clone()));
                report.alerts += 1;

                if self.notifier.has_channels() {
                    self.notifier.notify(SmsMessage::new(&entry.contact, message));
                    report.dispatched += 1;
                }
            }
        }

        report
    }
}
