//! WebSocket End-to-End Tests
//!
//! These tests run the whole application on a random port and talk to it
//! the way a browser would.

mod common;

use std::time::Duration;

use common::{
    create_test_config, start_server, token_for, StaticQuotes, TestClient, AAPL_CSV,
};
use finchat::bot::EXTERNAL_FAILURE_TEXT;
use finchat::chat::INVALID_COMMAND_TEXT;
use finchat::MessageType;
use serde_json::Value;
use tokio_tungstenite::tungstenite;

const QUIET: Duration = Duration::from_millis(200);

fn status_of(err: tungstenite::Error) -> u16 {
    match err {
        tungstenite::Error::Http(response) => response.status().as_u16(),
        other => panic!("Expected HTTP rejection, got {other}"),
    }
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_upgrade_requires_token() {
    let addr = start_server(create_test_config(), StaticQuotes::new(None)).await;

    let err = TestClient::connect_raw(addr, "room=general")
        .await
        .err()
        .expect("Connection without token accepted");
    assert_eq!(status_of(err), 401);
}

#[tokio::test]
async fn test_upgrade_rejects_invalid_token() {
    let addr = start_server(create_test_config(), StaticQuotes::new(None)).await;

    let err = TestClient::connect_raw(addr, "token=not-a-jwt")
        .await
        .err()
        .expect("Connection with invalid token accepted");
    assert_eq!(status_of(err), 401);
}

#[tokio::test]
async fn test_missing_room_joins_default_room() {
    let addr = start_server(create_test_config(), StaticQuotes::new(None)).await;

    let query = format!("token={}", token_for("u1", "alice"));
    let mut alice = TestClient::connect_raw(addr, &query).await.unwrap();

    let joined = alice.recv().await.unwrap();
    assert_eq!(joined.kind, MessageType::UserJoined);
    assert_eq!(joined.room_id, "general");
    assert_eq!(joined.content, "alice joined the room");
}

// ============================================================================
// Chat fan-out
// ============================================================================

#[tokio::test]
async fn test_chat_reaches_room_members_once() {
    let addr = start_server(create_test_config(), StaticQuotes::new(None)).await;

    let mut alice = TestClient::join(addr, "u1", "alice", "general").await;
    let mut bob = TestClient::join(addr, "u2", "bob", "general").await;
    let mut carol = TestClient::join(addr, "u3", "carol", "random").await;

    let bob_joined = alice.recv().await.unwrap();
    assert_eq!(bob_joined.kind, MessageType::UserJoined);
    assert_eq!(bob_joined.username, "bob");

    alice.say("hi").await;

    for client in [&mut alice, &mut bob] {
        let message = client.recv().await.unwrap();
        assert_eq!(message.kind, MessageType::Chat);
        assert_eq!(message.content, "hi");
        assert_eq!(message.user_id, "u1");
        assert_eq!(message.username, "alice");
        assert_eq!(message.room_id, "general");
    }

    bob.expect_silence(QUIET).await;
    carol.expect_silence(QUIET).await;
}

#[tokio::test]
async fn test_sender_identity_cannot_be_spoofed() {
    let addr = start_server(create_test_config(), StaticQuotes::new(None)).await;

    let mut alice = TestClient::join(addr, "u1", "alice", "general").await;
    alice
        .send_text(r#"{"type":"default","user_id":"u9","username":"mallory","room_id":"other","content":"x"}"#)
        .await;

    let message = alice.recv().await.unwrap();
    assert_eq!(message.user_id, "u1");
    assert_eq!(message.username, "alice");
    assert_eq!(message.room_id, "general");
}

#[tokio::test]
async fn test_malformed_frames_keep_connection_open() {
    let addr = start_server(create_test_config(), StaticQuotes::new(None)).await;

    let mut alice = TestClient::join(addr, "u1", "alice", "general").await;
    alice.send_text("{not json").await;
    alice.send_text(r#"{"type":"shout","content":"x"}"#).await;
    alice.say("still here").await;

    let message = alice.recv().await.unwrap();
    assert_eq!(message.content, "still here");
}

#[tokio::test]
async fn test_leave_notifies_remaining_members() {
    let addr = start_server(create_test_config(), StaticQuotes::new(None)).await;

    let alice = TestClient::join(addr, "u1", "alice", "general").await;
    let mut bob = TestClient::join(addr, "u2", "bob", "general").await;

    alice.close().await;

    let left = bob.recv().await.unwrap();
    assert_eq!(left.kind, MessageType::UserLeft);
    assert_eq!(left.content, "alice left the room");
}

#[tokio::test]
async fn test_second_connection_replaces_first() {
    let addr = start_server(create_test_config(), StaticQuotes::new(None)).await;

    let mut first = TestClient::join(addr, "u1", "alice", "general").await;
    let mut second = TestClient::join(addr, "u1", "alice", "general").await;

    assert!(first.is_closed().await);

    second.say("from second").await;
    assert_eq!(second.recv().await.unwrap().content, "from second");
}

// ============================================================================
// Commands
// ============================================================================

#[tokio::test]
async fn test_stock_command_round_trip() {
    let addr = start_server(create_test_config(), StaticQuotes::new(Some(AAPL_CSV))).await;

    let mut alice = TestClient::join(addr, "u1", "alice", "general").await;
    let mut bob = TestClient::join(addr, "u2", "bob", "general").await;
    alice.recv().await.unwrap();

    alice.command("/stock=AAPL.US").await;

    for client in [&mut alice, &mut bob] {
        let reply = client.recv().await.unwrap();
        assert_eq!(reply.kind, MessageType::Bot);
        assert_eq!(reply.content, "AAPL.US quote is $185.64 per share");
        assert_eq!(reply.room_id, "general");
        assert!(reply.is_from_bot());
    }
}

#[tokio::test]
async fn test_command_text_is_not_echoed() {
    let mut config = create_test_config();
    config.bot.enabled = false;
    let addr = start_server(config, StaticQuotes::new(None)).await;

    let mut alice = TestClient::join(addr, "u1", "alice", "general").await;
    alice.command("/stock=AAPL.US").await;

    alice.expect_silence(QUIET).await;
}

#[tokio::test]
async fn test_invalid_command_notice() {
    let addr = start_server(create_test_config(), StaticQuotes::new(Some(AAPL_CSV))).await;

    let mut alice = TestClient::join(addr, "u1", "alice", "general").await;
    alice.command("/weather=Paris").await;

    let notice = alice.recv().await.unwrap();
    assert_eq!(notice.kind, MessageType::Invalid);
    assert_eq!(notice.content, INVALID_COMMAND_TEXT);
    alice.expect_silence(QUIET).await;
}

#[tokio::test]
async fn test_quote_source_failure_reported() {
    let addr = start_server(create_test_config(), StaticQuotes::new(None)).await;

    let mut alice = TestClient::join(addr, "u1", "alice", "general").await;
    alice.command("/stock=AAPL.US").await;

    let reply = alice.recv().await.unwrap();
    assert_eq!(reply.kind, MessageType::Bot);
    assert_eq!(reply.content, EXTERNAL_FAILURE_TEXT);
}

// ============================================================================
// HTTP API
// ============================================================================

#[tokio::test]
async fn test_rooms_endpoint_lists_active_rooms() {
    let addr = start_server(create_test_config(), StaticQuotes::new(None)).await;

    let _alice = TestClient::join(addr, "u1", "alice", "general").await;
    let _bob = TestClient::join(addr, "u2", "bob", "general").await;
    let _carol = TestClient::join(addr, "u3", "carol", "random").await;

    let body = reqwest::get(format!("http://{}/api/rooms", addr))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let rooms: Value = serde_json::from_str(&body).unwrap();

    assert_eq!(
        rooms,
        serde_json::json!([
            { "room_id": "general", "member_count": 2 },
            { "room_id": "random", "member_count": 1 }
        ])
    );
}

#[tokio::test]
async fn test_health_endpoint() {
    let addr = start_server(create_test_config(), StaticQuotes::new(None)).await;

    let resp = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
    assert!(resp.status().is_success());

    let body: Value = serde_json::from_str(&resp.text().await.unwrap()).unwrap();
    assert_eq!(body["status"], "ok");
}
