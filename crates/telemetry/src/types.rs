//! Core data model for the telemetry pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a monitored animal, the pipeline's owning entity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LivestockId(pub i64);

impl fmt::Display for LivestockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for LivestockId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Row id assigned to a stored reading.
pub type ReadingId = i64;

/// One vitals sample as submitted by a device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalsSample {
    /// Body temperature in °C.
    pub temperature: f64,
    /// Pulse in beats per minute.
    pub pulse: i64,
}

/// A persisted health reading. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub livestock_id: LivestockId,
    pub temperature: f64,
    pub pulse: i64,
    /// Server-assigned ingestion time.
    pub recorded_at: DateTime<Utc>,
}

/// A reading together with its assigned store id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReading {
    pub id: ReadingId,
    #[serde(flatten)]
    pub reading: Reading,
}

/// Most recent reading for one animal plus its owner routing data.
///
/// Denormalized on purpose: the monitor loop must not touch the directory
/// or the store on its hot path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveCacheEntry {
    pub livestock_id: LivestockId,
    pub name: String,
    /// Upstream identity of the responsible party.
    pub owner_ref: String,
    /// Phone number alerts are sent to.
    pub contact: String,
    pub temperature: f64,
    pub pulse: i64,
    pub recorded_at: DateTime<Utc>,
}

/// Acknowledgement returned to the submitting device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestAck {
    pub livestock_id: LivestockId,
    pub owner_ref: String,
    pub reading_id: ReadingId,
    pub recorded_at: DateTime<Utc>,
}
