//! Threshold evaluation for livestock vitals.

use serde::{Deserialize, Serialize};

use crate::types::{LiveCacheEntry, LivestockId};

/// Metric kinds evaluated against thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Temperature,
    Pulse,
}

impl MetricKind {
    /// Wire and template name of the metric.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Pulse => "pulse",
        }
    }
}

/// Safety bounds for livestock vitals.
///
/// A value strictly above the high bound or strictly below the low bound
/// raises an alert; values equal to a bound are quiet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub temperature_high: f64,
    pub temperature_low: f64,
    pub pulse_high: i64,
    pub pulse_low: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature_high: 40.0,
            temperature_low: 36.0,
            pulse_high: 100,
            pulse_low: 60,
        }
    }
}

/// A single threshold breach.
///
/// Transient: broadcast and dispatched on the tick that produced it, never
/// persisted. A sustained breach produces a fresh event every tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    pub livestock_id: LivestockId,
    pub metric: MetricKind,
    /// Observed value (pulse is widened to f64 so one event type covers
    /// both metrics).
    pub value: f64,
    /// `true` when the value broke the upper bound, `false` the lower one.
    pub exceeding: bool,
}

/// Evaluate one cache entry against the configured thresholds.
///
/// Pure function of its inputs. Returns at most one event per metric, and
/// high/low are mutually exclusive for the same metric, so the result
/// holds zero, one, or two events.
#[must_use]
pub fn evaluate(entry: &LiveCacheEntry, thresholds: &Thresholds) -> Vec<AlertEvent> {
    let mut alerts = Vec::with_capacity(2);

    if entry.temperature > thresholds.temperature_high {
        alerts.push(AlertEvent {
            livestock_id: entry.livestock_id,
            metric: MetricKind::Temperature,
            value: entry.temperature,
            exceeding: true,
        });
    } else if entry.temperature < thresholds.temperature_low {
        alerts.push(AlertEvent {
            livestock_id: entry.livestock_id,
            metric: MetricKind::Temperature,
            value: entry.temperature,
            exceeding: false,
        });
    }

    if entry.pulse > thresholds.pulse_high {
        alerts.push(AlertEvent {
            livestock_id: entry.livestock_id,
            metric: MetricKind::Pulse,
            value: entry.pulse as f64,
            exceeding: true,
        });
    } else if entry.pulse < thresholds.pulse_low {
        alerts.push(AlertEvent {
            livestock_id: entry.livestock_id,
            metric: MetricKind::Pulse,
            value: entry.pulse as f64,
            exceeding: false,
        });
    }

    alerts
}
