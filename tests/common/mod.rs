//! Test helpers for E2E tests.
//!
//! Provides TestClient, a static quote provider and helpers for starting a
//! server on a random port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use finchat::bot::QuoteProvider;
use finchat::{Application, Config, FinchatError, JwtService, Message};

/// Default timeout for test operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Secret shared by the test server and the test tokens.
pub const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// CSV returned by [`StaticQuotes`] for every symbol.
pub const AAPL_CSV: &str =
    "Symbol,Date,Time,Open,High,Low,Close,Volume\nAAPL.US,2024-01-02,22:00:00,187.15,188.44,183.89,185.64,82488674\n";

/// Quote provider answering from a fixed CSV, or failing when it has none.
pub struct StaticQuotes {
    csv: Option<String>,
}

impl StaticQuotes {
    pub fn new(csv: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            csv: csv.map(str::to_string),
        })
    }
}

#[async_trait]
impl QuoteProvider for StaticQuotes {
    async fn fetch_csv(&self, _symbol: &str) -> finchat::Result<String> {
        self.csv
            .clone()
            .ok_or_else(|| FinchatError::Quote("connection refused".to_string()))
    }
}

/// Create a test configuration bound to a random local port.
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.auth.jwt_secret = TEST_SECRET.to_string();
    config
}

/// Start a server with the given quote provider and return its address.
pub async fn start_server(config: Config, quotes: Arc<dyn QuoteProvider>) -> SocketAddr {
    Application::new(config)
        .with_quote_provider(quotes)
        .run_with_addr()
        .await
        .expect("Failed to start test server")
}

/// Issue a token for the test secret.
pub fn token_for(user_id: &str, username: &str) -> String {
    JwtService::new(TEST_SECRET, 900)
        .generate_token(user_id, username)
        .expect("Failed to generate token")
}

/// Test client speaking the chat protocol over a WebSocket.
pub struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Connect with an arbitrary query string.
    pub async fn connect_raw(addr: SocketAddr, query: &str) -> Result<Self, tungstenite::Error> {
        let url = format!("ws://{}/ws?{}", addr, query);
        let (stream, _) = connect_async(url).await?;
        Ok(Self { stream })
    }

    /// Connect as `user_id` to `room` and wait for the own join notice.
    pub async fn join(addr: SocketAddr, user_id: &str, username: &str, room: &str) -> Self {
        let query = format!("token={}&room={}", token_for(user_id, username), room);
        let mut client = Self::connect_raw(addr, &query)
            .await
            .expect("Failed to connect");
        let joined = client.recv().await.expect("No join notice");
        assert_eq!(joined.user_id, user_id);
        client
    }

    /// Send a raw text frame.
    pub async fn send_text(&mut self, text: &str) {
        self.stream
            .send(WsMessage::text(text))
            .await
            .expect("Failed to send frame");
    }

    /// Send a chat message.
    pub async fn say(&mut self, content: &str) {
        let frame = serde_json::json!({ "type": "default", "content": content });
        self.send_text(&frame.to_string()).await;
    }

    /// Send a command message.
    pub async fn command(&mut self, content: &str) {
        let frame = serde_json::json!({ "type": "command", "content": content });
        self.send_text(&frame.to_string()).await;
    }

    /// Receive the next chat message, skipping control frames.
    ///
    /// Returns None when the connection is closed or nothing arrives in time.
    pub async fn recv(&mut self) -> Option<Message> {
        loop {
            let frame = timeout(DEFAULT_TIMEOUT, self.stream.next()).await.ok()??;
            match frame {
                Ok(WsMessage::Text(text)) => {
                    return Some(serde_json::from_str(text.as_str()).expect("Invalid message"))
                }
                Ok(WsMessage::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            }
        }
    }

    /// Assert that no chat message arrives within `wait`.
    pub async fn expect_silence(&mut self, wait: Duration) {
        if let Ok(Some(Ok(WsMessage::Text(text)))) = timeout(wait, self.stream.next()).await {
            panic!("Unexpected message: {}", text.as_str());
        }
    }

    /// Whether the server closed the connection.
    pub async fn is_closed(&mut self) -> bool {
        loop {
            match timeout(DEFAULT_TIMEOUT, self.stream.next()).await {
                Err(_) => return false,
                Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(WsMessage::Close(_)))) => return true,
                Ok(Some(Ok(_))) => continue,
            }
        }
    }

    /// Close the connection.
    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
