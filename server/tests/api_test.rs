//! REST gateway tests against a local Rocket instance.

use minesweeper_common::{
    models::{GameSnapshot, GameStatus},
    protocol::{ErrorResponse, GameResponse, HealthResponse},
};
use minesweeper_server::{build_rocket, config::Settings};
use rocket::{http::Status, local::asynchronous::Client};
use serde_json::{Value, json};

async fn client() -> Client {
    let rocket = build_rocket(Settings::default()).expect("valid cors settings");
    Client::tracked(rocket).await.expect("valid rocket instance")
}

async fn create(client: &Client, config: Value) -> GameSnapshot {
    let response = client
        .post("/api/games")
        .json(&json!({ "config": config }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    response.into_json::<GameResponse>().await.unwrap().game_state
}

async fn play(client: &Client, id: &str, body: Value) -> (Status, Option<Value>) {
    let response = client
        .post(format!("/api/games/{id}/moves"))
        .json(&body)
        .dispatch()
        .await;
    (response.status(), response.into_json::<Value>().await)
}

#[rocket::async_test]
async fn test_health() {
    let client = client().await;

    let response = client.get("/api/health").dispatch().await;

    assert_eq!(response.status(), Status::Ok);
    let health: HealthResponse = response.into_json().await.unwrap();
    assert_eq!(health.status, "OK");
}

#[rocket::async_test]
async fn test_empty_board_wins_on_first_reveal() {
    let client = client().await;
    let game = create(&client, json!({ "width": 3, "height": 3, "mineCount": 0 })).await;
    assert_eq!(game.status, GameStatus::NotStarted);

    let (status, body) = play(
        &client,
        &game.id,
        json!({ "row": 1, "col": 1, "action": "reveal" }),
    )
    .await;

    assert_eq!(status, Status::Ok);
    let state = &body.unwrap()["gameState"];
    assert_eq!(state["status"], "WON");
    assert_eq!(state["cellsRevealed"], 9);
    assert!(state["startTime"].is_string());
    assert!(state["endTime"].is_string());
    let cells = state["board"]["cells"].as_array().unwrap();
    assert!(
        cells
            .iter()
            .flat_map(|row| row.as_array().unwrap())
            .all(|cell| cell["isRevealed"] == true)
    );
}

#[rocket::async_test]
async fn test_snapshot_uses_camel_case_fields() {
    let client = client().await;
    let game = create(&client, json!({})).await;

    let response = client
        .get(format!("/api/games/{}", game.id))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.unwrap();
    let state = &body["gameState"];
    assert_eq!(state["id"], game.id.as_str());
    assert_eq!(state["status"], "NOT_STARTED");
    assert_eq!(state["board"]["width"], 9);
    assert_eq!(state["board"]["mineCount"], 10);
    assert_eq!(state["flagsUsed"], 0);
    assert!(state["startTime"].is_null());
    let cell = &state["board"]["cells"][0][0];
    assert_eq!(cell["isFlagged"], false);
    assert_eq!(cell["isMine"], false);
    assert_eq!(cell["neighborMines"], 0);
}

#[rocket::async_test]
async fn test_invalid_config_is_bad_request() {
    let client = client().await;

    let response = client
        .post("/api/games")
        .json(&json!({ "config": { "width": 2, "height": 2, "mineCount": 4 } }))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
    let error: ErrorResponse = response.into_json().await.unwrap();
    assert!(error.error.contains("invalid game configuration"));
}

#[rocket::async_test]
async fn test_oversized_board_is_bad_request() {
    let client = client().await;

    let response = client
        .post("/api/games")
        .json(&json!({ "config": { "width": 60000, "height": 60000, "mineCount": 10 } }))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
}

#[rocket::async_test]
async fn test_unknown_game_is_not_found() {
    let client = client().await;

    let response = client.get("/api/games/missing").dispatch().await;

    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn test_rejected_moves_are_unprocessable() {
    let client = client().await;
    let game = create(&client, json!({})).await;

    let (status, body) = play(
        &client,
        &game.id,
        json!({ "row": 9, "col": 0, "action": "reveal" }),
    )
    .await;
    assert_eq!(status, Status::UnprocessableEntity);
    assert!(body.unwrap()["error"].as_str().unwrap().contains("outside"));

    play(&client, &game.id, json!({ "row": 0, "col": 0, "action": "flag" })).await;
    let (status, _) = play(
        &client,
        &game.id,
        json!({ "row": 0, "col": 0, "action": "reveal" }),
    )
    .await;
    assert_eq!(status, Status::UnprocessableEntity);

    let (status, _) = play(
        &client,
        &game.id,
        json!({ "row": -1, "col": 0, "action": "reveal" }),
    )
    .await;
    assert_eq!(status, Status::UnprocessableEntity);
}

#[rocket::async_test]
async fn test_signal_is_visible_to_next_query() {
    let client = client().await;
    let game = create(&client, json!({})).await;

    let response = client
        .post(format!("/api/games/{}/moves/signal", game.id))
        .json(&json!({ "row": 2, "col": 3, "action": "flag" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Accepted);

    let response = client
        .get(format!("/api/games/{}", game.id))
        .dispatch()
        .await;
    let state = response.into_json::<GameResponse>().await.unwrap().game_state;
    assert_eq!(state.flags_used, 1);
    assert!(state.board.cells[2][3].is_flagged);
}

#[rocket::async_test]
async fn test_request_id_is_applied_once() {
    let client = client().await;
    let game = create(&client, json!({})).await;
    let request_id = "4a0d3f2e-4f7c-4bd1-9b43-1f3e8f6a2c11";

    for _ in 0..2 {
        let (status, body) = play(
            &client,
            &game.id,
            json!({ "row": 4, "col": 4, "action": "flag", "requestId": request_id }),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body.unwrap()["gameState"]["flagsUsed"], 1);
    }

    // a different action under the same id is still a duplicate
    let (_, body) = play(
        &client,
        &game.id,
        json!({ "row": 4, "col": 4, "action": "unflag", "requestId": request_id }),
    )
    .await;
    assert_eq!(body.unwrap()["gameState"]["flagsUsed"], 1);
}

#[rocket::async_test]
async fn test_create_with_request_id_is_idempotent() {
    let client = client().await;
    let body = json!({
        "config": { "width": 5, "height": 5, "mineCount": 3 },
        "requestId": "0f9c7a52-8d3b-4e7e-a4d1-5b2c6e9f1a30",
    });

    let mut ids = Vec::new();
    for _ in 0..2 {
        let response = client.post("/api/games").json(&body).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        ids.push(response.into_json::<GameResponse>().await.unwrap().game_state.id);
    }

    assert_eq!(ids[0], ids[1]);
}

#[rocket::async_test]
async fn test_restart_replaces_board() {
    let client = client().await;
    let game = create(&client, json!({})).await;
    play(&client, &game.id, json!({ "row": 0, "col": 0, "action": "flag" })).await;

    let response = client
        .post(format!("/api/games/{}/restart", game.id))
        .json(&json!({ "config": { "width": 16, "height": 16, "mineCount": 40 } }))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
    let state = response.into_json::<GameResponse>().await.unwrap().game_state;
    assert_eq!(state.id, game.id);
    assert_eq!(state.status, GameStatus::NotStarted);
    assert_eq!(state.board.width, 16);
    assert_eq!(state.board.mine_count, 40);
    assert_eq!(state.flags_used, 0);
}

#[rocket::async_test]
async fn test_move_on_unknown_id_starts_default_game() {
    let client = client().await;

    let (status, body) = play(
        &client,
        "brand-new",
        json!({ "row": 0, "col": 0, "action": "flag" }),
    )
    .await;

    assert_eq!(status, Status::Ok);
    let state = &body.unwrap()["gameState"];
    assert_eq!(state["id"], "brand-new");
    assert_eq!(state["board"]["width"], 9);
    assert_eq!(state["flagsUsed"], 1);
}
