//! Reading ingestion: resolve, authorize, persist, cache.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::cache::LiveCache;
use crate::directory::{Caller, HerdDirectory};
use crate::error::IngestError;
use crate::store::{ReadingStore, StoreError};
use crate::types::{IngestAck, LiveCacheEntry, LivestockId, VitalsSample};

/// Ingestion service, one `receive` call per device reading.
///
/// Ingestion never publishes to dashboards; joined connections see new
/// values on the next monitor tick.
pub struct Ingestor {
    store: Arc<dyn ReadingStore>,
    directory: Arc<dyn HerdDirectory>,
    cache: Arc<LiveCache>,
}

impl Ingestor {
    #[must_use]
    pub fn new(
        store: Arc<dyn ReadingStore>,
        directory: Arc<dyn HerdDirectory>,
        cache: Arc<LiveCache>,
    ) -> Self {
        Self {
            store,
            directory,
            cache,
        }
    }

    /// Accept one reading for `livestock_id` submitted by `caller`.
    ///
    /// The check order is part of the contract: unregistered animals are
    /// rejected before authorization is consulted, and nothing is persisted
    /// or cached unless every check passed.
    pub async fn receive(
        &self,
        caller: &Caller,
        livestock_id: LivestockId,
        sample: VitalsSample,
    ) -> Result<IngestAck, IngestError> {
        validate(sample)?;

        let Some(target) = self.directory.resolve(livestock_id).await? else {
            warn!(%livestock_id, "reading for unregistered livestock rejected");
            return Err(IngestError::UnknownLivestock(livestock_id));
        };

        if !self.directory.authorize(caller, livestock_id).await? {
            warn!(%livestock_id, "unauthorized reading submission rejected");
            return Err(IngestError::Unauthorized(livestock_id));
        }

        let recorded_at = Utc::now();
        let reading_id = match self.store.append(livestock_id, sample, recorded_at).await {
            Ok(id) => id,
            // The animal can disappear between resolve and append.
            Err(StoreError::UnknownLivestock(id)) => {
                return Err(IngestError::UnknownLivestock(id))
            }
            Err(err) => return Err(IngestError::Persistence(err)),
        };

        let ack = IngestAck {
            livestock_id,
            owner_ref: target.owner_ref.clone(),
            reading_id,
            recorded_at,
        };

        self.cache.put(LiveCacheEntry {
            livestock_id,
            name: target.name,
            owner_ref: target.owner_ref,
            contact: target.contact,
            temperature: sample.temperature,
            pulse: sample.pulse,
            recorded_at,
        });

        debug!(
            %livestock_id,
            reading_id,
            temperature = sample.temperature,
            pulse = sample.pulse,
            "reading ingested"
        );

        Ok(ack)
    }
}

fn validate(sample: VitalsSample) -> Result<(), IngestError> {
    if !sample.temperature.is_finite() {
        return Err(IngestError::Validation(
            "temperature must be a finite number".to_string(),
        ));
    }
    if sample.pulse < 0 {
        return Err(IngestError::Validation(
            "pulse must be a non-negative integer".to_string(),
        ));
    }
    Ok(())
}
