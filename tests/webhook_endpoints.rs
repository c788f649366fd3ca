//! End-to-end tests for the webhook ingress endpoint

mod common;

use common::{TEST_SECRET, push_event, sign, spawn_app, tag_event};
use deploy_relay::payload::CanonicalPayload;
use deploy_relay::queue::QueueGateway;

#[tokio::test]
async fn accepted_push_persists_and_publishes() {
    // Arrange
    let server = spawn_app().await;
    let client = reqwest::Client::new();
    let body = push_event();

    // Act
    let response = client
        .post(server.url("/webhooks"))
        .header("X-Hub-Signature", sign(TEST_SECRET, body.as_bytes()))
        .body(body)
        .send()
        .await
        .expect("send webhook");

    // Assert
    assert_eq!(response.status(), 200);
    let json: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(
        json["received"],
        "adsws@bcdf7771aa10d78d865c61e5336145e335e30427:sandbox"
    );

    assert_eq!(server.audit.count().await.unwrap(), 1);
    let records = server.audit.recent(10).await.unwrap();
    assert_eq!(records[0].repository, "adsws");
    assert_eq!(records[0].commit, "bcdf7771aa10d78d865c61e5336145e335e30427");
    assert_eq!(records[0].author, "vsudilov");
    assert_eq!(records[0].tag, None);
    assert!(!records[0].deployed);
    assert!(!records[0].tested);

    assert_eq!(server.queue.message_count("test").await.unwrap(), 1);
    let message = server.queue.read_one("test").await.unwrap().expect("message");
    let payload: CanonicalPayload = serde_json::from_slice(&message).expect("canonical payload");
    assert_eq!(payload.repository, "adsws");
    assert_eq!(payload.commit, "bcdf7771aa10d78d865c61e5336145e335e30427");
    assert_eq!(payload.environment, "sandbox");
    assert_eq!(payload.author, "vsudilov");
    assert_eq!(payload.tag, None);
}

#[tokio::test]
async fn accepted_tag_push_carries_the_tag() {
    // Arrange
    let server = spawn_app().await;
    let client = reqwest::Client::new();
    let body = tag_event();

    // Act
    let response = client
        .post(server.url("/webhooks"))
        .header("X-Hub-Signature", sign(TEST_SECRET, body.as_bytes()))
        .body(body)
        .send()
        .await
        .expect("send webhook");

    // Assert
    assert_eq!(response.status(), 200);
    let json: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(
        json["received"],
        "adsws@2a047ead58a3a87b46388ac67fe08c944c3230e0:sandbox"
    );

    let records = server.audit.recent(10).await.unwrap();
    assert_eq!(records[0].tag, Some("v1.0.0".to_string()));

    let message = server.queue.read_one("test").await.unwrap().expect("message");
    let payload: CanonicalPayload = serde_json::from_slice(&message).expect("canonical payload");
    assert_eq!(payload.tag, Some("v1.0.0".to_string()));
}

#[tokio::test]
async fn missing_signature_is_rejected_without_side_effects() {
    // Arrange
    let server = spawn_app().await;
    let client = reqwest::Client::new();

    // Act - no signature header at all
    let response = client
        .post(server.url("/webhooks"))
        .body(push_event())
        .send()
        .await
        .expect("send webhook");

    // Assert
    assert_eq!(response.status(), 400);
    assert_eq!(server.audit.count().await.unwrap(), 0);
    assert_eq!(server.queue.message_count("test").await.unwrap(), 0);
}

#[tokio::test]
async fn wrong_signature_is_rejected_without_side_effects() {
    // Arrange
    let server = spawn_app().await;
    let client = reqwest::Client::new();
    let body = push_event();

    // Act - signed with the wrong secret
    let response = client
        .post(server.url("/webhooks"))
        .header("X-Hub-Signature", sign("some-other-secret", body.as_bytes()))
        .body(body)
        .send()
        .await
        .expect("send webhook");

    // Assert
    assert_eq!(response.status(), 400);
    assert_eq!(server.audit.count().await.unwrap(), 0);
    assert_eq!(server.queue.message_count("test").await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_repository_is_named_and_has_no_side_effects() {
    // Arrange
    let server = spawn_app().await;
    let client = reqwest::Client::new();
    let body = push_event().replace(r#""name": "adsws""#, r#""name": "mission-control""#);

    // Act - correctly signed, but the repository is not watched
    let response = client
        .post(server.url("/webhooks"))
        .header("X-Hub-Signature", sign(TEST_SECRET, body.as_bytes()))
        .body(body)
        .send()
        .await
        .expect("send webhook");

    // Assert
    assert_eq!(response.status(), 400);
    let json: serde_json::Value = response.json().await.expect("json body");
    assert!(
        json["error"].as_str().unwrap().contains("mission-control"),
        "error should name the repository: {}",
        json
    );
    assert_eq!(server.audit.count().await.unwrap(), 0);
    assert_eq!(server.queue.message_count("test").await.unwrap(), 0);
}

#[tokio::test]
async fn malformed_payload_with_valid_signature_is_rejected() {
    // Arrange
    let server = spawn_app().await;
    let client = reqwest::Client::new();
    let body = r#"{"ref": "refs/heads/master"}"#;

    // Act
    let response = client
        .post(server.url("/webhooks"))
        .header("X-Hub-Signature", sign(TEST_SECRET, body.as_bytes()))
        .body(body)
        .send()
        .await
        .expect("send webhook");

    // Assert
    assert_eq!(response.status(), 400);
    assert_eq!(server.audit.count().await.unwrap(), 0);
}

#[tokio::test]
async fn get_requests_are_not_allowed() {
    // Arrange
    let server = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(server.url("/webhooks"))
        .send()
        .await
        .expect("send request");

    // Assert
    assert_eq!(response.status(), 405);
}

#[tokio::test]
async fn repeated_deliveries_are_relayed_independently() {
    // Arrange
    let server = spawn_app().await;
    let client = reqwest::Client::new();
    let body = push_event();
    let signature = sign(TEST_SECRET, body.as_bytes());

    // Act - the same delivery twice
    for _ in 0..2 {
        let response = client
            .post(server.url("/webhooks"))
            .header("X-Hub-Signature", signature.clone())
            .body(body)
            .send()
            .await
            .expect("send webhook");
        assert_eq!(response.status(), 200);
    }

    // Assert - no dedup anywhere
    assert_eq!(server.audit.count().await.unwrap(), 2);
    assert_eq!(server.queue.message_count("test").await.unwrap(), 2);
}
