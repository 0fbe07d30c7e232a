//! SMS alert dispatch for livestock health events.
//!
//! This crate provides a fire-and-forget SMS dispatcher for alerting farm
//! owners when a monitored animal's vitals breach their safety thresholds.
//!
//! # Usage
//!
//! ```no_run
//! use notify::{Notifier, SmsMessage};
//!
//! // Create notifier from environment variables
//! let notifier = Notifier::from_env();
//!
//! // Send an SMS (fire-and-forget)
//! notifier.notify(SmsMessage::new(
//!     "+254700000001",
//!     notify::templates::livestock_alert("temperature", 41.3, true),
//! ));
//! ```
//!
//! # Configuration
//!
//! The notifier is configured via environment variables:
//!
//! - `SEND_SMS_ENDPOINT`: SMS gateway URL (enables the Tiara channel)
//! - `TIARA_API_KEY`: gateway bearer token
//! - `TIARA_SENDER_ID`: registered sender id (optional)
//! - `SMS_DISABLED`: set to "true" to disable all dispatch
//!
//! # Architecture
//!
//! Dispatch uses a trait-based channel design for extensibility:
//!
//! - [`SmsChannel`] trait defines the interface for SMS providers
//! - [`TiaraChannel`] implements the Tiara Connect HTTP gateway
//! - [`Notifier`] dispatches messages to all enabled channels
//!
//! Dispatch failures are logged and absorbed. A lost SMS must never stall
//! or fail the telemetry paths that triggered it.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod error;
pub mod templates;

pub use channels::tiara::TiaraChannel;
pub use channels::{ProviderReceipt, SmsChannel, SmsMessage};
pub use error::DispatchError;

use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Environment variable to disable all SMS dispatch.
const ENV_SMS_DISABLED: &str = "SMS_DISABLED";

/// Central SMS dispatcher.
///
/// The `Notifier` manages the configured SMS channels and dispatches
/// messages to all enabled channels in a fire-and-forget manner.
pub struct Notifier {
    channels: Vec<Arc<dyn SmsChannel>>,
    disabled: bool,
}

impl Notifier {
    /// Create a new notifier from environment variables.
    ///
    /// This will auto-detect which channels are configured based on
    /// environment variables and enable them accordingly.
    #[must_use]
    pub fn from_env() -> Self {
        let disabled = std::env::var(ENV_SMS_DISABLED)
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        if disabled {
            info!("SMS dispatch disabled via SMS_DISABLED");
            return Self {
                channels: vec![],
                disabled: true,
            };
        }

        let mut channels: Vec<Arc<dyn SmsChannel>> = vec![];

        let tiara = TiaraChannel::from_env();
        if tiara.enabled() {
            info!("Tiara SMS channel enabled");
            channels.push(Arc::new(tiara));
        }

        if channels.is_empty() {
            warn!("No SMS channels configured, alerts will not reach owners");
        } else {
            info!(channel_count = channels.len(), "SMS dispatch initialized");
        }

        Self {
            channels,
            disabled: false,
        }
    }

    /// Create a notifier with specific channels.
    #[must_use]
    pub fn with_channels(channels: Vec<Arc<dyn SmsChannel>>) -> Self {
        Self {
            channels,
            disabled: false,
        }
    }

    /// Create a disabled notifier (for testing or when dispatch is off).
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            channels: vec![],
            disabled: true,
        }
    }

    /// Check if any SMS channels are enabled.
    #[must_use]
    pub fn has_channels(&self) -> bool {
        !self.disabled && !self.channels.is_empty()
    }

    /// Get the number of enabled channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        if self.disabled {
            0
        } else {
            self.channels.len()
        }
    }

    /// Dispatch a message to all enabled channels (fire-and-forget).
    ///
    /// This method spawns async tasks for each channel and returns
    /// immediately. Errors are logged but not propagated to the caller.
    pub fn notify(&self, message: SmsMessage) {
        if self.disabled {
            debug!("SMS dispatch disabled, skipping message");
            return;
        }

        if self.channels.is_empty() {
            debug!("No SMS channels configured, skipping message");
            return;
        }

        let message = Arc::new(message);

        for channel in &self.channels {
            let channel = Arc::clone(channel);
            let message = Arc::clone(&message);

            tokio::spawn(async move {
                let channel_name = channel.name();

                if !channel.enabled() {
                    debug!(channel = channel_name, "Channel disabled, skipping");
                    return;
                }

                match channel.send(&message).await {
                    Ok(receipt) => {
                        debug!(
                            channel = channel_name,
                            ref_id = %message.ref_id,
                            receipt = %receipt.raw,
                            "SMS dispatched"
                        );
                    }
                    Err(e) => {
                        error!(
                            channel = channel_name,
                            ref_id = %message.ref_id,
                            error = %e,
                            "Failed to dispatch SMS"
                        );
                    }
                }
            });
        }
    }

    /// Dispatch a message and wait for all channels to complete.
    ///
    /// Unlike `notify()`, this method waits for every channel and collects
    /// the results. Useful for testing or when delivery confirmation is
    /// needed.
    pub async fn notify_and_wait(
        &self,
        message: SmsMessage,
    ) -> Vec<(String, Result<ProviderReceipt, DispatchError>)> {
        if self.disabled || self.channels.is_empty() {
            return vec![];
        }

        let mut results = vec![];

        for channel in &self.channels {
            let channel_name = channel.name().to_string();
            let result = channel.send(&message).await;
            results.push((channel_name, result));
        }

        results
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::from_env()
    }
}
