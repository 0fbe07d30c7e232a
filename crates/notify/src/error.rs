//! Error types for SMS dispatch.

use thiserror::Error;

/// Errors that can occur when dispatching an SMS.
///
/// These are absorbed by the [`crate::Notifier`]: logged, never propagated
/// to ingestion or broadcast paths.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// HTTP request failed (connect, TLS, timeout)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Channel is not configured
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    /// The SMS gateway answered with a non-success status
    #[error("SMS gateway returned {status}: {body}")]
    Gateway { status: u16, body: String },
}
