use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Config, GameSnapshot, Move, MoveAction};

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateGameRequest {
    pub config: Config,
    /// Redelivering the same key returns the game it already created.
    #[serde(default, rename = "requestId")]
    pub request_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RestartRequest {
    pub config: Config,
    #[serde(default, rename = "requestId")]
    pub request_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub row: usize,
    pub col: usize,
    pub action: MoveAction,
    /// Idempotence key. Re-sending the same id never applies the move twice.
    #[serde(default)]
    pub request_id: Option<Uuid>,
}

impl MoveRequest {
    pub const fn to_move(&self) -> Move {
        Move::new(self.row, self.col, self.action)
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    pub game_state: GameSnapshot,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}
