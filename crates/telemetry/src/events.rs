//! Wire events streamed to dashboard connections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evaluator::{AlertEvent, MetricKind};
use crate::types::{LiveCacheEntry, LivestockId};

/// Server frames sent over the monitoring stream, tagged by `event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// Greeting sent once per connection after it joined the room.
    Connected { room: String },

    /// Latest vitals for one animal, re-broadcast every tick.
    LivestockData {
        livestock_id: LivestockId,
        temperature: f64,
        pulse: i64,
        contact: String,
        timestamp: DateTime<Utc>,
    },

    /// A threshold breach, carrying the same wording the owner gets by SMS.
    LivestockAlert {
        livestock_id: LivestockId,
        message: String,
        metric: MetricKind,
        value: f64,
        exceeding: bool,
    },
}

impl TelemetryEvent {
    /// Build the data frame for a cache entry.
    #[must_use]
    pub fn data(entry: &LiveCacheEntry) -> Self {
        Self::LivestockData {
            livestock_id: entry.livestock_id,
            temperature: entry.temperature,
            pulse: entry.pulse,
            contact: entry.contact.clone(),
            timestamp: entry.recorded_at,
        }
    }

    /// Build the alert frame for a breach.
    #[must_use]
    pub fn alert(alert: &AlertEvent, message: String) -> Self {
        Self::LivestockAlert {
            livestock_id: alert.livestock_id,
            message,
            metric: alert.metric,
            value: alert.value,
            exceeding: alert.exceeding,
        }
    }
}
