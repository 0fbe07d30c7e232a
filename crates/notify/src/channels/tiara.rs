//! Tiara Connect SMS gateway channel.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::channels::{ProviderReceipt, SmsMessage};
use crate::error::DispatchError;
use crate::SmsChannel;

/// Environment variable for the SMS gateway endpoint URL.
const ENV_SEND_SMS_ENDPOINT: &str = "SEND_SMS_ENDPOINT";

/// Environment variable for the gateway API key (bearer token).
const ENV_TIARA_API_KEY: &str = "TIARA_API_KEY";

/// Environment variable for the registered sender id.
const ENV_TIARA_SENDER_ID: &str = "TIARA_SENDER_ID";

/// Sender id used when none is configured.
const DEFAULT_SENDER_ID: &str = "TIARACONECT";

/// Outbound request timeout. Dispatch must never stall the alerting loop.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Tiara Connect HTTP SMS channel.
pub struct TiaraChannel {
    endpoint: Option<String>,
    api_key: Option<String>,
    sender_id: String,
    client: reqwest::Client,
}

impl TiaraChannel {
    /// Create a new Tiara channel from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let endpoint = std::env::var(ENV_SEND_SMS_ENDPOINT).ok();
        let api_key = std::env::var(ENV_TIARA_API_KEY).ok();
        let sender_id =
            std::env::var(ENV_TIARA_SENDER_ID).unwrap_or_else(|_| DEFAULT_SENDER_ID.to_string());

        if endpoint.is_some() && api_key.is_some() {
            debug!("Tiara SMS channel enabled");
        } else {
            debug!("Tiara SMS channel disabled (SEND_SMS_ENDPOINT or TIARA_API_KEY not set)");
        }

        Self {
            endpoint,
            api_key,
            sender_id,
            client: http_client(),
        }
    }

    /// Create a Tiara channel with explicit settings.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        sender_id: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            api_key: Some(api_key.into()),
            sender_id: sender_id.into(),
            client: http_client(),
        }
    }

    /// Format a message as the gateway's JSON payload.
    fn format_payload(&self, message: &SmsMessage) -> TiaraPayload {
        TiaraPayload {
            from: self.sender_id.clone(),
            to: message.to.clone(),
            message: message.body.clone(),
            ref_id: message.ref_id.clone(),
            message_type: "1".to_string(),
        }
    }
}

#[async_trait]
impl SmsChannel for TiaraChannel {
    fn name(&self) -> &'static str {
        "tiara"
    }

    fn enabled(&self) -> bool {
        self.endpoint.is_some() && self.api_key.is_some()
    }

    async fn send(&self, message: &SmsMessage) -> Result<ProviderReceipt, DispatchError> {
        let endpoint = self
            .endpoint
            .as_ref()
            .ok_or_else(|| DispatchError::NotConfigured(ENV_SEND_SMS_ENDPOINT.to_string()))?;
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| DispatchError::NotConfigured(ENV_TIARA_API_KEY.to_string()))?;

        let payload = self.format_payload(message);

        debug!(
            channel = "tiara",
            to = %message.to,
            ref_id = %message.ref_id,
            "Sending SMS"
        );

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            let raw = response
                .json::<serde_json::Value>()
                .await
                .unwrap_or(serde_json::Value::Null);
            debug!(channel = "tiara", "SMS accepted by gateway");
            Ok(ProviderReceipt::new(raw))
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            warn!(
                channel = "tiara",
                status = %status,
                body = %body,
                "SMS gateway request failed"
            );

            Err(DispatchError::Gateway {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Build the HTTP client with the dispatch timeout applied.
fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .unwrap_or_default()
}

// =============================================================================
// Tiara Connect API types
// =============================================================================

#[derive(Debug, Serialize)]
struct TiaraPayload {
    from: String,
    to: String,
    message: String,
    #[serde(rename = "refId")]
    ref_id: String,
    #[serde(rename = "messageType")]
    message_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_wire_format() {
        let channel = TiaraChannel::new("https://sms.example/send", "key", "TIARACONECT");
        let message = SmsMessage::new("+254700000001", "hello").with_ref_id("ref-1");

        let payload = serde_json::to_value(channel.format_payload(&message)).unwrap();

        assert_eq!(
            payload,
            serde_json::json!({
                "from": "TIARACONECT",
                "to": "+254700000001",
                "message": "hello",
                "refId": "ref-1",
                "messageType": "1",
            })
        );
    }

    #[test]
    fn test_disabled_without_settings() {
        let channel = TiaraChannel {
            endpoint: None,
            api_key: None,
            sender_id: DEFAULT_SENDER_ID.to_string(),
            client: http_client(),
        };
        assert!(!channel.enabled());
    }

    #[tokio::test]
    async fn test_send_unconfigured_is_not_configured_error() {
        let channel = TiaraChannel {
            endpoint: None,
            api_key: Some("key".to_string()),
            sender_id: DEFAULT_SENDER_ID.to_string(),
            client: http_client(),
        };
        let err = channel
            .send(&SmsMessage::new("+254700000001", "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotConfigured(_)));
    }
}
