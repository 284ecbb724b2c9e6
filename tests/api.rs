use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use buzz_back::{config::AppConfig, routes, state::AppState};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    routes::router(AppState::new(AppConfig::default()))
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router, username: &str) -> (String, String) {
    let (status, body) = post(app, "/api/create", json!({ "username": username })).await;
    assert_eq!(status, StatusCode::OK);
    (
        body["game_ext_id"].as_str().unwrap().to_owned(),
        body["session_key"].as_str().unwrap().to_owned(),
    )
}

async fn join(app: &Router, game_id: &str, username: &str) -> String {
    let (status, body) = post(
        app,
        &format!("/api/{game_id}/join"),
        json!({ "username": username }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["session_key"].as_str().unwrap().to_owned()
}

fn ranks(status: &Value) -> Vec<(String, bool, i64)> {
    status["player_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|player| {
            (
                player["username"].as_str().unwrap().to_owned(),
                player["is_creator"].as_bool().unwrap(),
                player["buzz_order"].as_i64().unwrap(),
            )
        })
        .collect()
}

#[tokio::test]
async fn full_round_between_alice_and_bob() {
    let app = app();
    let (game_id, alice) = create(&app, "Alice").await;
    assert_eq!(game_id.len(), 8);
    assert!(game_id.chars().all(|c| c.is_ascii_uppercase()));
    assert_eq!(alice.len(), 32);

    let bob = join(&app, &game_id.to_lowercase(), "Bob").await;

    let buzz_uri = format!("/api/{game_id}/buzz");
    let (status, body) = post(&app, &buzz_uri, json!({ "session_key": bob })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["buzz_order"], 0);
    post(&app, &buzz_uri, json!({ "session_key": alice })).await;

    let status_uri = format!("/api/{game_id}");
    let (status, body) = post(&app, &status_uri, json!({ "session_key": alice })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["q_num"], 1);
    assert_eq!(
        ranks(&body),
        [("Alice".to_owned(), true, 1), ("Bob".to_owned(), false, 0)]
    );

    let (status, _) = post(
        &app,
        &format!("/api/{game_id}/clearbuzz"),
        json!({ "session_key": alice }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post(
        &app,
        &format!("/api/{game_id}/set_q_num"),
        json!({ "session_key": alice, "q_num": "2" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = post(&app, &status_uri, json!({ "session_key": bob })).await;
    assert_eq!(body["q_num"], 2);
    assert!(ranks(&body).iter().all(|(_, _, rank)| *rank == -1));
}

#[tokio::test]
async fn non_creator_cannot_use_creator_routes() {
    let app = app();
    let (game_id, _alice) = create(&app, "Alice").await;
    let bob = join(&app, &game_id, "Bob").await;

    let (clear_status, clear_body) = post(
        &app,
        &format!("/api/{game_id}/clearbuzz"),
        json!({ "session_key": bob }),
    )
    .await;
    let (set_status, _) = post(
        &app,
        &format!("/api/{game_id}/set_q_num"),
        json!({ "session_key": bob, "q_num": 5 }),
    )
    .await;
    let (unknown_status, unknown_body) = post(
        &app,
        &format!("/api/{game_id}/buzz"),
        json!({ "session_key": "not-a-real-session-key" }),
    )
    .await;

    assert_eq!(clear_status, StatusCode::UNAUTHORIZED);
    assert_eq!(set_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(clear_body, unknown_body);
}

#[tokio::test]
async fn session_keys_are_bound_to_their_game() {
    let app = app();
    let (first_game, alice) = create(&app, "Alice").await;
    let (second_game, _carol) = create(&app, "Carol").await;
    assert_ne!(first_game, second_game);

    let (status, _) = post(
        &app,
        &format!("/api/{second_game}/buzz"),
        json!({ "session_key": alice }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn joining_twice_returns_the_same_session() {
    let app = app();
    let (game_id, alice) = create(&app, "Alice").await;
    let first = join(&app, &game_id, "Bob").await;
    let second = join(&app, &game_id, "  Bob ").await;
    assert_eq!(first, second);

    let (_, body) = post(
        &app,
        &format!("/api/{game_id}"),
        json!({ "session_key": alice }),
    )
    .await;
    assert_eq!(body["player_list"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn oversized_key_length_setting_still_issues_usable_keys() {
    let config = AppConfig {
        session_key_length: 200,
        ..AppConfig::default()
    };
    let app = routes::router(AppState::new(config));
    let (game_id, alice) = create(&app, "Alice").await;
    assert_eq!(alice.len(), 128);

    let (status, body) = post(
        &app,
        &format!("/api/{game_id}/buzz"),
        json!({ "session_key": alice }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["buzz_order"], 0);
}

#[tokio::test]
async fn rejected_session_key_is_not_echoed() {
    let app = app();
    let (game_id, _alice) = create(&app, "Alice").await;
    let forged = "Z".repeat(300);

    let (status, body) = post(
        &app,
        &format!("/api/{game_id}/buzz"),
        json!({ "session_key": forged }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body["message"].as_str().unwrap().contains(&forged));
}

#[tokio::test]
async fn unknown_game_is_not_found() {
    let app = app();
    let (status, body) = post(&app, "/api/ZZZZZZZZ/join", json!({ "username": "Bob" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn malformed_input_is_a_bad_request() {
    let app = app();
    let (status, _) = post(&app, "/api/create", json!({ "username": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (game_id, alice) = create(&app, "Alice").await;
    for q_num in [json!(1.5), json!("two"), json!(null)] {
        let (status, _) = post(
            &app,
            &format!("/api/{game_id}/set_q_num"),
            json!({ "session_key": alice, "q_num": q_num }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "q_num {q_num}");
    }
}

#[tokio::test]
async fn healthcheck_reports_ok_without_storage() {
    let app = app();
    create(&app, "Alice").await;

    let request = Request::builder()
        .uri("/healthcheck")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "status": "ok", "games": 1 }));
}

#[tokio::test]
async fn sse_requires_a_valid_session() {
    let app = app();
    let (game_id, alice) = create(&app, "Alice").await;

    let denied = Request::builder()
        .uri(format!("/sse/{game_id}?session_key=nope"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(denied).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let allowed = Request::builder()
        .uri(format!("/sse/{game_id}?session_key={alice}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(allowed).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );

    let mut body = response.into_body();
    let frame = body.frame().await.unwrap().unwrap();
    let first = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
    assert!(first.contains("event: status"));
    assert!(first.contains("\"Alice\""));
}
