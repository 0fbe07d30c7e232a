//! # Telemetry
//!
//! Livestock health telemetry pipeline: ingestion, threshold evaluation,
//! live cache, broadcast rooms, and the periodic monitor loop.
//!
//! Field devices submit temperature/pulse readings per animal. The
//! [`Ingestor`] resolves and authorizes the submission, appends it to the
//! durable [`store`], and overwrites that animal's [`LiveCache`] entry.
//! The [`TelemetryMonitor`] periodically snapshots the cache, runs the
//! [`evaluator`], and fans `livestock_data` / `livestock_alert` events out
//! to dashboard connections through the [`Broadcaster`], firing an SMS via
//! the `notify` crate for each breach.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use telemetry::{Broadcaster, Ingestor, LiveCache, SqliteStore, TelemetryMonitor};
//!
//! let store = Arc::new(SqliteStore::open("herd.db")?);
//! let cache = Arc::new(LiveCache::new());
//! let ingestor = Ingestor::new(store.clone(), store.clone(), cache.clone());
//! ```

// Data model
pub mod types;

// Error taxonomy
pub mod error;

// Threshold evaluation
pub mod evaluator;

// Keyed live cache
pub mod cache;

// Durable reading log
pub mod store;

// Owner directory seam
pub mod directory;

// Wire events
pub mod events;

// Broadcast rooms
pub mod rooms;

// Ingestion service
pub mod ingest;

// Periodic evaluation loop
pub mod monitor;

// Re-export key types for convenience
pub use cache::LiveCache;
pub use directory::{Caller, DirectoryError, HerdDirectory, LivestockTarget};
pub use error::IngestError;
pub use evaluator::{evaluate, AlertEvent, MetricKind, Thresholds};
pub use events::TelemetryEvent;
pub use ingest::Ingestor;
pub use monitor::{TelemetryMonitor, TickReport};
pub use rooms::{Broadcaster, ConnectionId, MONITOR_ROOM};
pub use store::{LivestockRecord, ReadingStore, SqliteStore, StoreError};
pub use types::{
    IngestAck, LiveCacheEntry, LivestockId, Reading, ReadingId, StoredReading, VitalsSample,
};
