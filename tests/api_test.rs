//! Tests for the REST API routes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use diesel::prelude::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::NamedTempFile;
use tower::ServiceExt;

use tictactoe_service::{
    AiDifficulty, AiError, AiMove, AiService, Board, DisabledPlatform, FirstLegalMove,
    GameRepository, GameService, LocalAiService, Mark, PlayerId, router,
};

fn test_repository() -> (NamedTempFile, GameRepository) {
    let db = NamedTempFile::new().expect("Failed to create temp file");
    let repo = GameRepository::new(db.path().to_str().unwrap().to_string()).unwrap();
    repo.run_migrations().expect("Migrations failed");
    (db, repo)
}

fn app_with(repo: GameRepository, ai: Arc<dyn AiService>) -> Router {
    let service = GameService::new(repo, ai, Arc::new(DisabledPlatform), AiDifficulty::Medium);
    router(service)
}

fn setup_app() -> (NamedTempFile, Router) {
    let (db, repo) = test_repository();
    let app = app_with(repo, Arc::new(LocalAiService::new(Arc::new(FirstLegalMove))));
    (db, app)
}

struct FailingAi;

#[async_trait]
impl AiService for FailingAi {
    async fn calculate_move(
        &self,
        _board: &Board,
        _mark: Mark,
        _difficulty: AiDifficulty,
    ) -> Result<AiMove, AiError> {
        Err(AiError::new("AI service unreachable"))
    }
}

/// AI that fails its first call. Later calls store a rival AI move on the
/// newest game before answering with a different cell.
struct RivalWriterAi {
    repo: GameRepository,
    calls: AtomicUsize,
}

#[async_trait]
impl AiService for RivalWriterAi {
    async fn calculate_move(
        &self,
        board: &Board,
        _mark: Mark,
        _difficulty: AiDifficulty,
    ) -> Result<AiMove, AiError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(AiError::new("AI busy"));
        }

        let mut game = self.repo.list(1).unwrap().remove(0);
        let mut empty = board.get_empty_positions();
        let rival = empty.remove(0);
        game.play_evaluated_move(rival, &PlayerId::ai(), 0.0).unwrap();
        self.repo.save(&game).unwrap();

        Ok(AiMove {
            position: empty[0],
            evaluation: 0.0,
            metadata: json!({}),
        })
    }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app.clone().oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Body is not JSON")
    };
    (status, value)
}

async fn create_pvai(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/games",
        Some(json!({"player_x_id": "alice", "mode": "pvai"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().expect("id").to_string()
}

async fn create_pvp(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/games",
        Some(json!({"player_x_id": "alice", "player_o_id": "bob", "mode": "pvp"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().expect("id").to_string()
}

#[tokio::test]
async fn test_health() {
    let (_db, app) = setup_app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_and_get_game() {
    let (_db, app) = setup_app();
    let id = create_pvp(&app).await;

    let (status, body) = send(&app, Method::GET, &format!("/games/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "IN_PROGRESS");
    assert_eq!(body["mode"], "pvp");
    assert_eq!(body["next_player"], "X");
    assert_eq!(body["player_o"]["name"], "Player O");
    assert_eq!(body["legal_moves"].as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn test_create_rejects_bad_setup() {
    let (_db, app) = setup_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/games",
        Some(json!({"player_x_id": "alice", "mode": "pvp"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("player O"));
}

#[tokio::test]
async fn test_undecodable_create_body_is_400_json() {
    let (_db, app) = setup_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/games",
        Some(json!({"player_x_id": "alice", "mode": "bogus"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("bogus"));
}

#[tokio::test]
async fn test_undecodable_move_body_is_400_json() {
    let (_db, app) = setup_app();
    let id = create_pvp(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/games/{}/moves", id),
        Some(json!({"player_id": "alice", "row": -1, "col": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/games/{}/ai-move", id),
        Some(json!({"ai_difficulty": "impossible"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_bad_list_query_is_400_json() {
    let (_db, app) = setup_app();
    let (status, body) = send(&app, Method::GET, "/games?limit=many", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_unknown_game_is_404() {
    let (_db, app) = setup_app();
    let (status, body) = send(&app, Method::GET, "/games/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, Method::DELETE, "/games/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_play_moves_and_snapshot() {
    let (_db, app) = setup_app();
    let id = create_pvp(&app).await;
    let moves_uri = format!("/games/{}/moves", id);

    let (status, body) = send(
        &app,
        Method::POST,
        &moves_uri,
        Some(json!({"player_id": "alice", "row": 0, "col": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applied"]["move_number"], 1);
    assert_eq!(body["game"]["next_player"], "O");

    let (status, body) = send(
        &app,
        Method::POST,
        &moves_uri,
        Some(json!({"player_id": "bob", "row": 0, "col": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("occupied"));

    let (status, body) = send(&app, Method::GET, &format!("/games/{}/state", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["game_id"], id.as_str());
    assert_eq!(body["board"][0], json!(["X", ".", "."]));
    assert_eq!(body["current_player"], "O");
    assert_eq!(body["game_status"], "IN_PROGRESS");
    assert_eq!(body["history"], json!([{"player": "X", "move_index": 0}]));
}

#[tokio::test]
async fn test_missing_coordinates_is_400() {
    let (_db, app) = setup_app();
    let id = create_pvp(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/games/{}/moves", id),
        Some(json!({"player_id": "alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pvai_round() {
    let (_db, app) = setup_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/games",
        Some(json!({"player_x_id": "alice", "mode": "pvai", "ai_difficulty": "easy"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["ai_difficulty"], "easy");
    let id = body["id"].as_str().unwrap().to_string();

    let ai_move_uri = format!("/games/{}/ai-move", id);
    let (status, body) = send(&app, Method::POST, &ai_move_uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not the AI's turn"));

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/games/{}/moves", id),
        Some(json!({"player_id": "alice", "row": 1, "col": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applied"]["player_id"], "alice");
    assert_eq!(body["ai_reply"]["player_id"], "AI");
    assert_eq!(body["ai_reply"]["mark"], "O");
    assert_eq!(body["ai_reply"]["row"], 0);
    assert_eq!(body["ai_reply"]["col"], 0);
    assert_eq!(body["game"]["move_count"], 2);
    assert_eq!(body["game"]["is_ai_turn"], false);

    let (status, _) = send(&app, Method::POST, &ai_move_uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_hint_route() {
    let (_db, app) = setup_app();
    let id = create_pvp(&app).await;
    let hint_uri = format!("/games/{}/hint", id);

    let (status, body) = send(&app, Method::GET, &hint_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["player"], "X");
    assert_eq!(body["move_index"], 0);
    assert_eq!(body["row"], 0);
    assert_eq!(body["col"], 0);

    for (player, row, col) in [("alice", 0, 0), ("bob", 1, 0), ("alice", 0, 1), ("bob", 1, 1)] {
        send(
            &app,
            Method::POST,
            &format!("/games/{}/moves", id),
            Some(json!({"player_id": player, "row": row, "col": col})),
        )
        .await;
    }
    let (status, body) = send(&app, Method::GET, &format!("{}?ai_difficulty=hard", hint_uri), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["player"], "X");
    assert_eq!(body["move_index"], 2);

    send(
        &app,
        Method::POST,
        &format!("/games/{}/moves", id),
        Some(json!({"player_id": "alice", "row": 0, "col": 2})),
    )
    .await;
    let (status, body) = send(&app, Method::GET, &hint_uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("finished"));
}

#[tokio::test]
async fn test_ai_failure_is_502() {
    let (_db, repo) = test_repository();
    let app = app_with(repo, Arc::new(FailingAi));
    let id = create_pvai(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/games/{}/moves", id),
        Some(json!({"player_id": "alice", "row": 1, "col": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ai_reply"], Value::Null);
    assert_eq!(body["game"]["is_ai_turn"], true);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/games/{}/ai-move", id),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "AI service unreachable");
}

#[tokio::test]
async fn test_concurrent_write_is_409() {
    let (_db, repo) = test_repository();
    let ai = Arc::new(RivalWriterAi {
        repo: repo.clone(),
        calls: AtomicUsize::new(0),
    });
    let app = app_with(repo, ai);
    let id = create_pvai(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/games/{}/moves", id),
        Some(json!({"player_id": "alice", "row": 1, "col": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/games/{}/ai-move", id),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (_, body) = send(&app, Method::GET, &format!("/games/{}", id), None).await;
    assert_eq!(body["move_count"], 2);
    assert_eq!(body["moves"][1]["row"], 0);
    assert_eq!(body["moves"][1]["col"], 0);
}

#[tokio::test]
async fn test_storage_failure_is_500() {
    let (db, app) = setup_app();
    let id = create_pvp(&app).await;

    let mut conn = SqliteConnection::establish(db.path().to_str().unwrap()).unwrap();
    diesel::sql_query("DROP TABLE moves")
        .execute(&mut conn)
        .unwrap();

    let (status, body) = send(&app, Method::GET, &format!("/games/{}", id), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_list_and_delete() {
    let (_db, app) = setup_app();
    let first = create_pvp(&app).await;
    let _second = create_pvp(&app).await;

    let (status, body) = send(&app, Method::GET, "/games?limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::DELETE, &format!("/games/{}", first), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (_, body) = send(&app, Method::GET, "/games", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}
