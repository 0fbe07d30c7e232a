//! Owner directory seam.
//!
//! The pipeline needs exactly two answers from the wider farm system: who
//! is responsible for an animal (and where to reach them), and whether a
//! caller may submit readings for it. The embedded registry implements
//! this trait; a surrounding application can substitute its own directory.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::LivestockId;

/// Credential presented by a submitting device.
#[derive(Debug, Clone)]
pub struct Caller {
    token: Option<String>,
}

impl Caller {
    /// Caller that presented a bearer token.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Caller that presented no credential.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { token: None }
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Owner and contact routing data for one animal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivestockTarget {
    pub livestock_id: LivestockId,
    pub name: String,
    /// Upstream identity of the responsible party.
    pub owner_ref: String,
    /// Phone number alerts are sent to.
    pub contact: String,
}

/// Errors from the directory backend.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory backend error: {reason}")]
    Backend { reason: String },
}

/// Lookup and authorization against the livestock registry.
#[async_trait]
pub trait HerdDirectory: Send + Sync {
    /// Owner/contact lookup. `None` when the animal is not registered.
    async fn resolve(
        &self,
        livestock_id: LivestockId,
    ) -> Result<Option<LivestockTarget>, DirectoryError>;

    /// Whether the caller may submit readings for the animal.
    async fn authorize(
        &self,
        caller: &Caller,
        livestock_id: LivestockId,
    ) -> Result<bool, DirectoryError>;
}
