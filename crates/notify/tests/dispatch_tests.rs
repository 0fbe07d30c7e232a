//! Wire-level tests for the Tiara SMS gateway channel.

use std::sync::Arc;

use notify::{DispatchError, Notifier, SmsChannel, SmsMessage, TiaraChannel};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn channel_for(server: &MockServer) -> TiaraChannel {
    TiaraChannel::new(
        format!("{}/sms/send", server.uri()),
        "test-api-key",
        "TIARACONECT",
    )
}

#[tokio::test]
async fn accepted_dispatch_returns_provider_receipt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sms/send"))
        .and(header("authorization", "Bearer test-api-key"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "from": "TIARACONECT",
            "to": "+254700000001",
            "message": "Livestock Alert: High temperature detected!\nCurrent temperature: 42.0°C.",
            "refId": "ref-42",
            "messageType": "1",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "desc": "queued",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let channel = channel_for(&server);
    let message = SmsMessage::new(
        "+254700000001",
        notify::templates::livestock_alert("temperature", 42.0, true),
    )
    .with_ref_id("ref-42");

    let receipt = channel.send(&message).await.unwrap();
    assert_eq!(receipt.raw["status"], "success");
}

#[tokio::test]
async fn gateway_error_carries_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sms/send"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string(r#"{"status":"error","desc":"no credits"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let channel = channel_for(&server);
    let err = channel
        .send(&SmsMessage::new("+254700000001", "hello"))
        .await
        .unwrap_err();

    match err {
        DispatchError::Gateway { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("no credits"));
        }
        other => panic!("expected gateway error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_success_body_still_yields_receipt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sms/send"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    let channel = channel_for(&server);
    let receipt = channel
        .send(&SmsMessage::new("+254700000001", "hello"))
        .await
        .unwrap();
    assert!(receipt.raw.is_null());
}

#[tokio::test]
async fn notifier_absorbs_gateway_failures() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sms/send"))
        .respond_with(ResponseTemplate::new(403).set_body_string("bad key"))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = Notifier::with_channels(vec![Arc::new(channel_for(&server)) as Arc<dyn SmsChannel>]);

    let results = notifier
        .notify_and_wait(SmsMessage::new("+254700000001", "hello"))
        .await;

    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0].1,
        Err(DispatchError::Gateway { status: 403, .. })
    ));
}
