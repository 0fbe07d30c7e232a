//! Ingestion error taxonomy.

use thiserror::Error;

use crate::directory::DirectoryError;
use crate::store::StoreError;
use crate::types::LivestockId;

/// Everything that can go wrong while accepting one reading.
///
/// The HTTP layer maps these one-to-one onto status codes: `Validation`
/// is a 400, `UnknownLivestock` a 404, `Unauthorized` a 403, and the
/// backend variants a 500.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The submitted payload is malformed or incomplete
    #[error("invalid reading payload: {0}")]
    Validation(String),

    /// The animal is not in the registry
    #[error("livestock {0} is not registered")]
    UnknownLivestock(LivestockId),

    /// The caller may not submit readings for this animal
    #[error("caller is not allowed to submit readings for livestock {0}")]
    Unauthorized(LivestockId),

    /// The reading could not be persisted
    #[error("failed to persist reading: {0}")]
    Persistence(#[from] StoreError),

    /// Owner lookup or authorization check failed in the backend
    #[error("owner directory lookup failed: {0}")]
    Directory(#[from] DirectoryError),
}
