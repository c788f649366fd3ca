//! End-to-end tests for the generic queue proxy endpoint

mod common;

use common::spawn_app;
use deploy_relay::queue::QueueGateway;
use serde_json::json;

#[tokio::test]
async fn relays_payload_to_the_named_queue() {
    // Arrange
    let server = spawn_app().await;
    server.queue.declare_topology("deploy").await.unwrap();
    let client = reqwest::Client::new();
    let payload = json!({
        "queue": "deploy",
        "commit": "23d3f",
        "service": "adsws"
    });

    // Act
    let response = client
        .post(server.url("/rabbit"))
        .body(payload.to_string())
        .send()
        .await
        .expect("send relay request");

    // Assert
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["msg"], "success");

    assert_eq!(server.queue.message_count("deploy").await.unwrap(), 1);
    let message = server.queue.read_one("deploy").await.unwrap().expect("message");
    let forwarded: serde_json::Value = serde_json::from_slice(&message).expect("json message");
    assert_eq!(forwarded, payload);
}

#[tokio::test]
async fn route_and_exchange_overrides_are_stripped_from_the_message() {
    // Arrange - the "test" topology is declared by the harness
    let server = spawn_app().await;
    let client = reqwest::Client::new();
    let payload = json!({
        "queue": "deploy",
        "commit": "23d3f",
        "service": "adsws",
        "route": "test",
        "exchange": "test"
    });

    // Act
    let response = client
        .post(server.url("/rabbit"))
        .body(payload.to_string())
        .send()
        .await
        .expect("send relay request");

    // Assert - delivered to the overridden target, minus the routing keys
    assert_eq!(response.status(), 200);
    assert_eq!(server.queue.message_count("test").await.unwrap(), 1);
    let message = server.queue.read_one("test").await.unwrap().expect("message");
    let forwarded: serde_json::Value = serde_json::from_slice(&message).expect("json message");
    assert_eq!(
        forwarded,
        json!({
            "queue": "deploy",
            "commit": "23d3f",
            "service": "adsws"
        })
    );
}

#[tokio::test]
async fn missing_queue_field_is_a_client_error() {
    // Arrange
    let server = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .post(server.url("/rabbit"))
        .body(json!({ "commit": "23d3f", "service": "adsws" }).to_string())
        .send()
        .await
        .expect("send relay request");

    // Assert
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn unbound_queue_surfaces_as_server_error() {
    // Arrange - nothing declared for "nowhere"
    let server = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .post(server.url("/rabbit"))
        .body(json!({ "queue": "nowhere", "commit": "23d3f", "service": "adsws" }).to_string())
        .send()
        .await
        .expect("send relay request");

    // Assert
    assert_eq!(response.status(), 500);
}

#[tokio::test]
async fn get_requests_are_not_allowed() {
    // Arrange
    let server = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(server.url("/rabbit"))
        .send()
        .await
        .expect("send request");

    // Assert
    assert_eq!(response.status(), 405);
}
