//! `ClientBuilder`: configure and assemble a [`ProtocolEngine`].

use std::time::Duration;

use sushigo_backoff::{Backoff, BackoffConfig};
use sushigo_engine::{DEFAULT_STRATEGY_BUDGET, EngineConfig, Machine, Strategy};
use sushigo_transport::{Connector, DEFAULT_CONNECT_TIMEOUT, TcpConnector};
use tokio_util::sync::CancellationToken;

use crate::connection::ConnectionManager;
use crate::{ProtocolEngine, SushiGoError};

/// Port the game server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 7878;

/// Builder for a Sushi Go client.
///
/// # Example
///
/// ```rust,no_run
/// use sushigo::prelude::*;
///
/// # async fn play() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ClientBuilder::new()
///     .host("127.0.0.1")
///     .game("abc123")
///     .player_name("alice")
///     .build(FirstCard)?;
///
/// match client.run().await? {
///     Outcome::GameEnded(summary) => println!("{summary}"),
///     Outcome::Cancelled => {}
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    host: String,
    port: u16,
    connect_timeout: Duration,
    backoff: BackoffConfig,
    game_id: String,
    player_name: String,
    strategy_budget: Duration,
    shutdown: Option<CancellationToken>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            backoff: BackoffConfig::default(),
            game_id: String::new(),
            player_name: String::new(),
            strategy_budget: DEFAULT_STRATEGY_BUDGET,
            shutdown: None,
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn backoff(mut self, config: BackoffConfig) -> Self {
        self.backoff = config;
        self
    }

    /// The game to join. Required.
    pub fn game(mut self, game_id: impl Into<String>) -> Self {
        self.game_id = game_id.into();
        self
    }

    /// The name to join under. Required.
    pub fn player_name(mut self, name: impl Into<String>) -> Self {
        self.player_name = name.into();
        self
    }

    pub fn strategy_budget(mut self, budget: Duration) -> Self {
        self.strategy_budget = budget;
        self
    }

    /// Use an existing token to stop the client, e.g. one tied to Ctrl-C.
    pub fn shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    /// Builds a client that connects over TCP.
    ///
    /// # Errors
    /// [`SushiGoError::InvalidConfig`] if the host is empty or the game
    /// id or player name isn't a single non-empty token.
    pub fn build<S: Strategy>(
        self,
        strategy: S,
    ) -> Result<ProtocolEngine<TcpConnector, S>, SushiGoError> {
        if self.host.trim().is_empty() {
            return Err(SushiGoError::InvalidConfig("host must not be empty".into()));
        }
        let connector = TcpConnector::new(&self.host, self.port)
            .with_connect_timeout(self.connect_timeout);
        self.build_with(connector, strategy)
    }

    /// Builds a client on a caller-supplied connector.
    pub fn build_with<T: Connector, S: Strategy>(
        self,
        connector: T,
        strategy: S,
    ) -> Result<ProtocolEngine<T, S>, SushiGoError> {
        single_token("game id", &self.game_id)?;
        single_token("player name", &self.player_name)?;

        let config = EngineConfig::new(self.game_id, self.player_name)
            .with_strategy_budget(self.strategy_budget);
        Ok(ProtocolEngine::new(
            ConnectionManager::new(connector),
            Machine::new(config, strategy),
            Backoff::new(self.backoff),
            self.shutdown.unwrap_or_default(),
        ))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The protocol splits on whitespace, so anything we send in `JOIN` must
/// be one token.
fn single_token(what: &str, value: &str) -> Result<(), SushiGoError> {
    if value.is_empty() {
        return Err(SushiGoError::InvalidConfig(format!("{what} must not be empty")));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(SushiGoError::InvalidConfig(format!(
            "{what} must not contain whitespace: {value:?}"
        )));
    }
    Ok(())
}
