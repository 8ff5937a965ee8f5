// tests/integration/pubsub_test.rs

//! End-to-end tests for subscription tracking, message delivery, and
//! subscription restoration across reconnects.

use super::test_helpers::{MockServer, client_over, wait_for_open_attempts, wait_for_status};
use bytes::Bytes;
use spinel_client::{Config, ConnectionStatus, RetryStrategy};
use std::time::Duration;

fn pubsub_config() -> Config {
    Config {
        lazy_connect: true,
        retry: Some(RetryStrategy::new(|_| Some(Duration::ZERO))),
        ..Config::default()
    }
}

/// Polls until the server-side subscription count matches, panicking after
/// two seconds.
async fn wait_for_subscription_count(server: &MockServer, expected: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while server.subscription_count() != expected {
        if tokio::time::Instant::now() > deadline {
            panic!(
                "timed out waiting for subscription count {expected}; current is {}",
                server.subscription_count()
            );
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

#[tokio::test]
async fn test_subscribe_acknowledges_and_delivers_messages() {
    let server = MockServer::new();
    let client = client_over(&server, pubsub_config());
    client.connect().await.unwrap();
    let mut messages = client.messages();

    client
        .subscribe(vec![Bytes::from_static(b"news")])
        .await
        .unwrap();
    assert_eq!(server.subscription_count(), 1);

    server.push_message("news", "hello");
    let message = tokio::time::timeout(Duration::from_secs(2), messages.recv())
        .await
        .expect("timed out waiting for a message")
        .unwrap();
    assert_eq!(message.channel, Bytes::from_static(b"news"));
    assert_eq!(message.payload, Bytes::from_static(b"hello"));
    assert!(message.pattern.is_none());
}

#[tokio::test]
async fn test_multi_channel_subscribe_resolves_after_every_ack() {
    let server = MockServer::new();
    let client = client_over(&server, pubsub_config());
    client.connect().await.unwrap();

    client
        .subscribe(vec![
            Bytes::from_static(b"a"),
            Bytes::from_static(b"b"),
            Bytes::from_static(b"c"),
        ])
        .await
        .unwrap();
    assert_eq!(server.subscription_count(), 3);
}

#[tokio::test]
async fn test_subscriptions_are_restored_after_a_forced_reconnect() {
    let server = MockServer::new();
    let client = client_over(&server, pubsub_config());
    client.connect().await.unwrap();

    client
        .subscribe(vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")])
        .await
        .unwrap();
    client
        .psubscribe(vec![Bytes::from_static(b"news.*")])
        .await
        .unwrap();
    let before = server.subscription_count();
    assert_eq!(before, 3);
    let opens_before = server.open_attempts();

    client.disconnect(true);
    wait_for_open_attempts(&server, opens_before + 1).await;
    wait_for_status(&client, ConnectionStatus::Ready).await;
    wait_for_subscription_count(&server, before).await;

    let names = server.last_connection_commands();
    assert!(names.contains(&"SUBSCRIBE".to_string()));
    assert!(names.contains(&"PSUBSCRIBE".to_string()));
}

#[tokio::test]
async fn test_queued_commands_wait_for_resubscription() {
    let server = MockServer::new();
    let client = client_over(&server, pubsub_config());
    client.connect().await.unwrap();
    client
        .subscribe(vec![Bytes::from_static(b"news")])
        .await
        .unwrap();

    server.kill_connection();
    client.command("PING", vec![]).await.unwrap();

    let names = server.last_connection_commands();
    let subscribe_at = names.iter().position(|n| n == "SUBSCRIBE").unwrap();
    let ping_at = names.iter().position(|n| n == "PING").unwrap();
    assert!(
        subscribe_at < ping_at,
        "SUBSCRIBE must be written before queued commands; saw {names:?}"
    );
}

#[tokio::test]
async fn test_unsubscribed_channels_are_not_restored() {
    let server = MockServer::new();
    let client = client_over(&server, pubsub_config());
    client.connect().await.unwrap();

    client
        .subscribe(vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")])
        .await
        .unwrap();
    client
        .unsubscribe(vec![Bytes::from_static(b"a")])
        .await
        .unwrap();
    let opens_before = server.open_attempts();

    client.disconnect(true);
    wait_for_open_attempts(&server, opens_before + 1).await;
    wait_for_status(&client, ConnectionStatus::Ready).await;
    wait_for_subscription_count(&server, 1).await;

    let restored: Vec<Vec<Bytes>> = server
        .log()
        .iter()
        .filter(|c| c.name == "SUBSCRIBE")
        .map(|c| c.args.clone())
        .collect();
    assert_eq!(restored.last().unwrap(), &vec![Bytes::from_static(b"b")]);
}

#[tokio::test]
async fn test_bare_unsubscribe_clears_every_subscription() {
    let server = MockServer::new();
    let client = client_over(&server, pubsub_config());
    client.connect().await.unwrap();

    client
        .subscribe(vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")])
        .await
        .unwrap();
    client.unsubscribe(vec![]).await.unwrap();
    assert_eq!(server.subscription_count(), 0);

    client.disconnect(true);
    wait_for_status(&client, ConnectionStatus::Ready).await;

    // Nothing to restore on the new connection: the first command it sees is
    // the PING, not a replayed SUBSCRIBE.
    client.command("PING", vec![]).await.unwrap();
    let names = server.last_connection_commands();
    assert_eq!(names, vec!["PING"]);
}
