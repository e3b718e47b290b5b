//! End-to-end relay tests against a local webhook.

use httpmock::Method::POST;
use httpmock::MockServer;
use notify_relay::{
    DeliveryOutcome, FakeDecryptor, Relay, RelayConfig, RelayError, ResolverState, prepare,
};
use notify_format::parse_event;
use serde_json::json;

fn alarm_event() -> String {
    json!({
        "Records": [{
            "EventSubscriptionArn": "arn:aws:sns:us-east-1:123456789012:CloudWatchNotifications:0a1b",
            "Sns": {
                "Subject": "ALARM: \"cpu-high\" in US East (N. Virginia)",
                "TopicArn": "arn:aws:sns:us-east-1:123456789012:CloudWatchNotifications",
                "Timestamp": "2024-01-02T03:04:05.678Z",
                "Message": json!({
                    "AlarmName": "cpu-high",
                    "AlarmDescription": "CPU above 80%",
                    "NewStateValue": "ALARM",
                    "NewStateReason": "Threshold Crossed",
                    "OldStateValue": "OK",
                    "Trigger": {
                        "Statistic": "Average",
                        "MetricName": "CPUUtilization",
                        "ComparisonOperator": "GreaterThanThreshold",
                        "Threshold": 80,
                        "EvaluationPeriods": 1,
                        "Period": 60
                    }
                }).to_string()
            }
        }]
    })
    .to_string()
}

fn plain_relay(server: &MockServer) -> Relay<FakeDecryptor> {
    let config = RelayConfig::default().with_plain_hook_url(server.url("/services/hook"));
    Relay::new(config, FakeDecryptor::default()).unwrap()
}

#[tokio::test]
async fn alarm_is_posted_as_json() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/services/hook")
                .header("content-type", "application/json")
                .body_contains("\"text\":\"*AWS CloudWatch Notification*\"")
                .body_contains("\"color\":\"danger\"")
                .body_contains(
                    "Average CPUUtilization GreaterThanThreshold 80 for 1 period(s) of 60 seconds.",
                );
            then.status(200).body("ok");
        })
        .await;

    let outcomes = plain_relay(&server).handle_event(&alarm_event()).await.unwrap();

    assert_eq!(outcomes, vec![DeliveryOutcome::Delivered { status: 200 }]);
    mock.assert_async().await;
}

#[tokio::test]
async fn channel_override_is_sent() {
    let server = MockServer::start_async().await;
    let document = alarm_event();
    let envelopes = parse_event(&document).unwrap();
    let expected = serde_json::to_value(prepare(&envelopes[0], Some("#ops"))).unwrap();

    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/services/hook").json_body(expected);
            then.status(200);
        })
        .await;

    let config = RelayConfig::default()
        .with_plain_hook_url(server.url("/services/hook"))
        .with_channel_override("#ops");
    let relay = Relay::new(config, FakeDecryptor::default()).unwrap();

    relay.handle_event(&document).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn client_error_is_logged_not_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/services/hook");
            then.status(404).body("no_service");
        })
        .await;

    let outcomes = plain_relay(&server).handle_event(&alarm_event()).await.unwrap();

    assert_eq!(
        outcomes,
        vec![DeliveryOutcome::Rejected {
            status: 404,
            reason: "Not Found".to_string(),
        }]
    );
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn redirect_is_delivered_without_following() {
    let server = MockServer::start_async().await;
    let hook = server
        .mock_async(|when, then| {
            when.method(POST).path("/services/hook");
            then.status(302).header("Location", "/moved");
        })
        .await;
    let moved = server
        .mock_async(|when, then| {
            when.path("/moved");
            then.status(503);
        })
        .await;

    let outcomes = plain_relay(&server).handle_event(&alarm_event()).await.unwrap();

    assert_eq!(outcomes, vec![DeliveryOutcome::Delivered { status: 302 }]);
    hook.assert_hits_async(1).await;
    moved.assert_hits_async(0).await;
}

#[tokio::test]
async fn server_error_is_retryable() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/services/hook");
            then.status(503).body("try later");
        })
        .await;

    let err = plain_relay(&server)
        .handle_event(&alarm_event())
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(
        err.to_string(),
        "server error when processing message: 503 - Service Unavailable"
    );
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn unreachable_webhook_is_retryable() {
    let config = RelayConfig::default().with_plain_hook_url("http://127.0.0.1:1/services/hook");
    let relay = Relay::new(config, FakeDecryptor::default()).unwrap();

    let err = relay.handle_event(&alarm_event()).await.unwrap_err();
    assert!(matches!(err, RelayError::Transport(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn encrypted_url_is_decrypted_once() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/services/hook");
            then.status(200);
        })
        .await;

    let decryptor = FakeDecryptor::returning(server.url("/services/hook"));
    let config = RelayConfig::default().with_encrypted_hook_url("Y2lwaGVydGV4dA==");
    let relay = Relay::new(config, decryptor.clone()).unwrap();

    relay.handle_event(&alarm_event()).await.unwrap();
    relay.handle_event(&alarm_event()).await.unwrap();

    assert_eq!(decryptor.calls(), 1);
    assert_eq!(relay.resolver().state(), ResolverState::Resolved);
    mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn decryption_failure_posts_nothing() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200);
        })
        .await;

    let decryptor = FakeDecryptor::returning(server.url("/services/hook")).failing_first(1);
    let config = RelayConfig::default().with_encrypted_hook_url("Y2lwaGVydGV4dA==");
    let relay = Relay::new(config, decryptor.clone()).unwrap();

    let err = relay.handle_event(&alarm_event()).await.unwrap_err();
    assert!(matches!(err, RelayError::Decryption { .. }));
    assert!(err.is_retryable());
    mock.assert_hits_async(0).await;

    relay.handle_event(&alarm_event()).await.unwrap();
    assert_eq!(decryptor.calls(), 2);
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn every_record_is_delivered() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/services/hook");
            then.status(200);
        })
        .await;

    let document = json!({
        "Records": [
            {"Sns": {"Subject": "first", "Message": "plain text", "Timestamp": "2024-01-02T03:04:05.000Z"}},
            {"Sns": {"Subject": "second", "Message": "{\"source\":\"aws.events\",\"detail\":{}}", "Timestamp": "2024-01-02T03:04:05.000Z"}}
        ]
    })
    .to_string();

    let outcomes = plain_relay(&server).handle_event(&document).await.unwrap();
    assert_eq!(outcomes.len(), 2);
    mock.assert_hits_async(2).await;
}
