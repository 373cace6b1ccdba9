use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use engine::{DocumentStore, MemoryStore, SqliteStore};
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use server::{
    ServerState, router,
    types::{ErrorResponse, ValueResponse},
};

fn app(store: impl DocumentStore + 'static) -> axum::Router {
    router(ServerState {
        store: Arc::new(store),
    })
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(res: axum::response::Response) -> T {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let res = app(MemoryStore::new())
        .oneshot(empty_request("GET", "/health"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = body_json(res).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn put_get_delete_round() {
    let store = MemoryStore::new();
    let app = app(store.clone());

    let res = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/db/games/ABC123/players/p1",
            json!({"name": "Alice", "balance": 1500}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        store.get("games/ABC123/players/p1/name").await.unwrap(),
        Some(json!("Alice"))
    );

    let res = app
        .clone()
        .oneshot(empty_request("GET", "/db/games/ABC123/players/p1/balance"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: ValueResponse = body_json(res).await;
    assert_eq!(body.value, Some(json!(1500)));

    let res = app
        .clone()
        .oneshot(empty_request("DELETE", "/db/games/ABC123"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app
        .oneshot(empty_request("GET", "/db/games/ABC123"))
        .await
        .unwrap();
    let body: ValueResponse = body_json(res).await;
    assert_eq!(body.value, None);
}

#[tokio::test]
async fn patch_applies_every_path_or_none() {
    let store = MemoryStore::new();
    store
        .set("games/ABC123", json!({"players": {"a": {"balance": 10}, "b": {"balance": 0}}}))
        .await
        .unwrap();
    let app = app(store.clone());

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/db",
            json!({"updates": {
                "games/ABC123/players/a/balance": 4,
                "games/ABC123/players/b/balance": 6,
                "games/ABC123/transactions/tx_1": {"amount": 6, "timestamp": {".sv": "timestamp"}},
            }}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        store.get("games/ABC123/players/b/balance").await.unwrap(),
        Some(json!(6))
    );
    let stamp = store
        .get("games/ABC123/transactions/tx_1/timestamp")
        .await
        .unwrap();
    assert!(stamp.is_some_and(|v| v.is_i64()));

    let res = app
        .oneshot(json_request(
            "PATCH",
            "/db",
            json!({"updates": {
                "games/ABC123/players/a/balance": 0,
                "games/ABC123/players/a": null,
            }}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = body_json(res).await;
    assert_eq!(body.kind, "validation");
    assert_eq!(
        store.get("games/ABC123/players/a/balance").await.unwrap(),
        Some(json!(4))
    );
}

#[tokio::test]
async fn empty_patch_is_rejected() {
    let res = app(MemoryStore::new())
        .oneshot(json_request("PATCH", "/db", json!({"updates": {}})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_path_is_a_bad_request() {
    let res = app(MemoryStore::new())
        .oneshot(empty_request("GET", "/db/games/bad$key"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = body_json(res).await;
    assert_eq!(body.kind, "validation");
}

#[tokio::test]
async fn watch_opens_an_event_stream() {
    let res = app(MemoryStore::new())
        .oneshot(empty_request("GET", "/watch/games/ABC123"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));

    let mut body = res.into_body();
    let frame = body.frame().await.unwrap().unwrap();
    let chunk = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
    assert!(chunk.contains("event: snapshot"));
    assert!(chunk.contains("data: null"));
}

#[tokio::test]
async fn sqlite_backed_router() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let app = app(SqliteStore::new(db));

    let res = app
        .clone()
        .oneshot(json_request("PUT", "/db/games/ABC123/id", json!("ABC123")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app
        .clone()
        .oneshot(empty_request("GET", "/db/games/ABC123"))
        .await
        .unwrap();
    let body: ValueResponse = body_json(res).await;
    assert_eq!(body.value, Some(json!({"id": "ABC123"})));

    let res = app
        .oneshot(json_request("PUT", "/db/games", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
