//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sushigo_protocol::GameId;

/// How long a strategy may think before the engine logs a warning.
pub const DEFAULT_STRATEGY_BUDGET: Duration = Duration::from_secs(2);

/// What the engine needs to know that the server doesn't tell it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Game to join. Sent in `JOIN`.
    pub game_id: GameId,

    /// Display name. Sent in `JOIN`.
    pub player_name: String,

    /// Warning threshold for a single strategy call.
    pub strategy_budget: Duration,
}

impl EngineConfig {
    pub fn new(game_id: impl Into<String>, player_name: impl Into<String>) -> Self {
        Self {
            game_id: GameId::new(game_id),
            player_name: player_name.into(),
            strategy_budget: DEFAULT_STRATEGY_BUDGET,
        }
    }

    pub fn with_strategy_budget(mut self, budget: Duration) -> Self {
        self.strategy_budget = budget;
        self
    }
}
