use chrono::Utc;
use rocket::{Request, State, catch, get, http::Status, post, serde::json::Json};
use tracing::{error, info, instrument, warn};

use minesweeper_common::protocol::{
    CreateGameRequest, ErrorResponse, GameResponse, HealthResponse, MoveRequest, RestartRequest,
};

use crate::{
    error::{ActorError, GameError, RegistryError},
    registry::Games,
};

pub type ApiError = (Status, Json<ErrorResponse>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn status_for(error: &RegistryError) -> Status {
    match error {
        RegistryError::NotFound { .. } => Status::NotFound,
        RegistryError::Actor(ActorError::Game(GameError::InvalidConfig(_))) => Status::BadRequest,
        RegistryError::Actor(ActorError::Game(_)) => Status::UnprocessableEntity,
        RegistryError::Actor(_) => Status::ServiceUnavailable,
    }
}

fn api_error(error: RegistryError) -> ApiError {
    let status = status_for(&error);
    if status.code >= 500 {
        error!("Request failed with {}: {}", status, error);
    } else {
        warn!("Request rejected with {}: {}", status, error);
    }
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

#[post("/games", data = "<request>")]
#[instrument(level = "trace", skip(games, request), fields(config = %request.config))]
pub async fn create_game(
    request: Json<CreateGameRequest>,
    games: &State<Games>,
) -> ApiResult<GameResponse> {
    let game_state = games
        .create(&request.config, request.request_id)
        .await
        .map_err(api_error)?;
    info!("Game {} created: {}", game_state.id, request.config);
    Ok(Json(GameResponse { game_state }))
}

#[get("/games/<id>")]
#[instrument(level = "trace", skip(games))]
pub async fn get_game(id: &str, games: &State<Games>) -> ApiResult<GameResponse> {
    let game_state = games.get_state(id).await.map_err(api_error)?;
    Ok(Json(GameResponse { game_state }))
}

#[post("/games/<id>/moves", data = "<request>")]
#[instrument(level = "trace", skip(games, request), fields(row = request.row, col = request.col, action = ?request.action))]
pub async fn make_move(
    id: &str,
    request: Json<MoveRequest>,
    games: &State<Games>,
) -> ApiResult<GameResponse> {
    let game_state = games
        .move_update(id, request.to_move(), request.request_id)
        .await
        .map_err(api_error)?;
    Ok(Json(GameResponse { game_state }))
}

#[post("/games/<id>/moves/signal", data = "<request>")]
#[instrument(level = "trace", skip(games, request), fields(row = request.row, col = request.col, action = ?request.action))]
pub async fn signal_move(
    id: &str,
    request: Json<MoveRequest>,
    games: &State<Games>,
) -> Result<Status, ApiError> {
    games
        .move_signal(id, request.to_move(), request.request_id)
        .await
        .map_err(api_error)?;
    Ok(Status::Accepted)
}

#[post("/games/<id>/restart", data = "<request>")]
#[instrument(level = "trace", skip(games, request), fields(config = %request.config))]
pub async fn restart_game(
    id: &str,
    request: Json<RestartRequest>,
    games: &State<Games>,
) -> ApiResult<GameResponse> {
    let game_state = games
        .restart_update(id, request.config, request.request_id)
        .await
        .map_err(api_error)?;
    info!("Game {} restarted: {}", id, request.config);
    Ok(Json(GameResponse { game_state }))
}

#[get("/health")]
pub fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now(),
    })
}

/// Malformed bodies and unknown paths still answer with a JSON error.
#[catch(default)]
pub fn json_catcher(status: Status, request: &Request<'_>) -> (Status, Json<ErrorResponse>) {
    warn!("{} {} failed with {}", request.method(), request.uri(), status);
    (
        status,
        Json(ErrorResponse {
            error: status.reason_lossy().to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IllegalMove, JournalError};

    #[test]
    fn errors_map_to_statuses() {
        let cases = [
            (
                RegistryError::NotFound {
                    id: "x".to_string(),
                },
                Status::NotFound,
            ),
            (
                GameError::InvalidConfig(Default::default()).into(),
                Status::BadRequest,
            ),
            (
                GameError::OutOfBounds { row: 1, col: 2 }.into(),
                Status::UnprocessableEntity,
            ),
            (
                GameError::IllegalMove(IllegalMove::ChordZero).into(),
                Status::UnprocessableEntity,
            ),
            (
                ActorError::Unavailable {
                    id: "x".to_string(),
                }
                .into(),
                Status::ServiceUnavailable,
            ),
            (
                JournalError::Unavailable {
                    id: "x".to_string(),
                    reason: "down".to_string(),
                }
                .into(),
                Status::ServiceUnavailable,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(status_for(&error), expected, "{error}");
        }
    }
}
