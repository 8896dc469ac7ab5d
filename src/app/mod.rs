//! Application module.
//!
//! Wires the hub, the broker, the response listener, the optional command
//! worker and the web server together.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::JwtService;
use crate::bot::{QuoteProvider, StooqClient, Worker};
use crate::broker::{Consumer, MemoryBroker};
use crate::chat::{spawn_response_listener, CommandDispatcher, Hub};
use crate::config::Config;
use crate::error::Result;
use crate::web::ws::{ChatWsState, ConnectionSettings};
use crate::web::WebServer;

/// Main application that owns the running services.
pub struct Application {
    /// Application configuration.
    config: Config,
    /// Broker carrying commands and replies.
    broker: Arc<MemoryBroker>,
    /// Market data source used by the worker.
    quotes: Option<Arc<dyn QuoteProvider>>,
}

impl Application {
    /// Create a new application instance.
    pub fn new(config: Config) -> Self {
        let broker = Arc::new(MemoryBroker::new(config.broker.queue_capacity));
        Self {
            config,
            broker,
            quotes: None,
        }
    }

    /// Use `quotes` instead of the configured market data endpoint.
    pub fn with_quote_provider(mut self, quotes: Arc<dyn QuoteProvider>) -> Self {
        self.quotes = Some(quotes);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the broker.
    pub fn broker(&self) -> Arc<MemoryBroker> {
        self.broker.clone()
    }

    /// Start the background services and build the web server.
    async fn start(self) -> Result<WebServer> {
        let config = &self.config;

        let hub = Hub::spawn(config.hub.event_buffer);
        tracing::info!("Hub started");

        spawn_response_listener(
            self.broker.as_ref(),
            &config.broker.responses_queue,
            hub.clone(),
        )
        .await?;

        if config.bot.enabled {
            let quotes: Arc<dyn QuoteProvider> = match self.quotes.clone() {
                Some(quotes) => quotes,
                None => Arc::new(StooqClient::new(
                    config.bot.quote_url.clone(),
                    Duration::from_secs(config.bot.request_timeout_secs),
                )?),
            };
            let subscription = self.broker.subscribe(&config.broker.commands_queue).await?;
            let worker = Worker::new(
                quotes,
                self.broker.clone(),
                config.broker.responses_queue.clone(),
            );
            tokio::spawn(worker.run(subscription));
        } else {
            tracing::info!("Command worker disabled");
        }

        let dispatcher = CommandDispatcher::new(
            self.broker.clone(),
            hub.clone(),
            config.broker.commands_queue.clone(),
        );
        let state = ChatWsState::new(
            Arc::new(JwtService::new(
                &config.auth.jwt_secret,
                config.auth.token_expiry_secs,
            )),
            hub,
            dispatcher,
            ConnectionSettings::from(&config.hub),
        );

        WebServer::new(&config.server, state)
    }

    /// Run until the web server stops.
    pub async fn run(self) -> Result<()> {
        let server = self.start().await?;
        server.run().await?;
        Ok(())
    }

    /// Start everything and return the bound address once listening.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let server = self.start().await?;
        Ok(server.run_with_addr().await?)
    }
}
