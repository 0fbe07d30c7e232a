//! SMS channel implementations.

pub mod tiara;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::error::DispatchError;

/// A single outbound SMS.
#[derive(Debug, Clone)]
pub struct SmsMessage {
    /// Recipient phone number in international format.
    pub to: String,
    /// Message body.
    pub body: String,
    /// Reference id passed to the provider for delivery tracking.
    pub ref_id: String,
}

impl SmsMessage {
    /// Create a message with a generated reference id.
    #[must_use]
    pub fn new(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            body: body.into(),
            ref_id: Uuid::new_v4().to_string(),
        }
    }

    /// Override the generated reference id.
    #[must_use]
    pub fn with_ref_id(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = ref_id.into();
        self
    }
}

/// Receipt returned by a provider on accepted dispatch.
#[derive(Debug, Clone)]
pub struct ProviderReceipt {
    /// Raw provider response body.
    pub raw: Value,
}

impl ProviderReceipt {
    #[must_use]
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }
}

/// Trait for SMS channels (Tiara Connect, future providers).
#[async_trait]
pub trait SmsChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Check if this channel is enabled/configured.
    fn enabled(&self) -> bool;

    /// Send one SMS through this channel.
    async fn send(&self, message: &SmsMessage) -> Result<ProviderReceipt, DispatchError>;
}
