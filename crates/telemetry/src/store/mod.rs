//! Durable storage for health readings.

mod sqlite;

pub use sqlite::{LivestockRecord, SqliteStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{LivestockId, ReadingId, StoredReading, VitalsSample};

/// Errors from the reading store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The owning animal is not in the registry
    #[error("livestock {0} is not registered")]
    UnknownLivestock(LivestockId),

    /// Storage engine failure
    #[error("storage backend error: {reason}")]
    Backend { reason: String },

    /// The storage worker is gone
    #[error("storage worker unavailable")]
    WorkerGone,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Backend {
            reason: err.to_string(),
        }
    }
}

/// Append-only log of health readings.
///
/// Readings are immutable once appended; the pipeline has no update or
/// delete operations.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Append one reading. Fails with [`StoreError::UnknownLivestock`]
    /// when the animal is not registered.
    async fn append(
        &self,
        livestock_id: LivestockId,
        sample: VitalsSample,
        recorded_at: DateTime<Utc>,
    ) -> Result<ReadingId, StoreError>;

    /// Most recently appended reading for one animal, `None` when nothing
    /// has been recorded yet.
    ///
    /// "Latest" follows append order, not `recorded_at`: device clocks may
    /// deliver out-of-order timestamps and must not make latest go
    /// backwards.
    async fn latest_for(
        &self,
        livestock_id: LivestockId,
    ) -> Result<Option<StoredReading>, StoreError>;
}
