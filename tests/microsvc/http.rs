//! HTTP transport integration tests.
//!
//! Starts an axum server and exercises it with reqwest.

use std::sync::Arc;
use std::time::Duration;

use minimal_planner::microsvc::{self, HttpState, Service};
use minimal_planner::{DocumentStore, InMemoryStore, RecordsExt, TokenSigner, User};
use serde_json::{json, Value};

use crate::support::{ann, planner, SlowStore, SECRET};

/// Bind to port 0 and return the actual address.
async fn start_server<S: DocumentStore + 'static>(state: HttpState<S>) -> String {
    let app = microsvc::router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn planner_server() -> (String, String) {
    let fx = planner();
    let base = start_server(HttpState::new(fx.service.clone())).await;
    (base, fx.token)
}

#[tokio::test]
async fn health_check() {
    let (base, _) = planner_server().await;
    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
    let commands = body["commands"].as_array().unwrap();
    assert!(commands.iter().any(|c| c == "todo.create"));
    assert!(commands.iter().any(|c| c == "user.get"));
}

#[tokio::test]
async fn create_and_list_todos() {
    let (base, token) = planner_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/all-todo"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "No todos found for this user" }));

    let resp = client
        .post(format!("{base}/create-todo"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Buy milk", "sub_task": ["whole", "skimmed"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Todo Created Successfully");
    let id = body["id"].as_str().unwrap().to_string();

    let resp = client
        .get(format!("{base}/all-todo"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body[0]["id"], id.as_str());
    assert_eq!(body[0]["sub_task"], json!(["whole", "skimmed"]));
}

#[tokio::test]
async fn update_sticky_with_id_in_body() {
    let (base, token) = planner_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/create-sticky"))
        .bearer_auth(&token)
        .json(&json!({ "topic": "Ideas", "content": "ship it", "color": "pink" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let id = body["id"].as_str().unwrap().to_string();

    let resp = client
        .put(format!("{base}/update-sticky"))
        .bearer_auth(&token)
        .json(&json!({ "id": id, "color": "green" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["matched"], 1);
    assert_eq!(body["updated"], 1);

    let resp = client
        .put(format!("{base}/update-sticky"))
        .bearer_auth(&token)
        .json(&json!({ "id": id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "No fields to update");
}

#[tokio::test]
async fn update_unknown_id_is_not_found() {
    let (base, token) = planner_server().await;
    let resp = reqwest::Client::new()
        .put(format!("{base}/update-todo/missing"))
        .bearer_auth(&token)
        .json(&json!({ "name": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Todo not found");
}

#[tokio::test]
async fn delete_by_path_twice() {
    let (base, token) = planner_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/create-event"))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Standup",
            "start": "2024-05-01T09:00:00Z",
            "end": "2024-05-01T09:15:00Z",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    let id = body["id"].as_str().unwrap().to_string();

    let resp = client
        .delete(format!("{base}/delete-event/{id}"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Event Deleted Successfully");

    let resp = client
        .delete(format!("{base}/delete-event/{id}"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn single_list_by_path() {
    let (base, token) = planner_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/create-list"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Groceries", "color": "red" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let id = body["id"].as_str().unwrap().to_string();

    let resp = client
        .get(format!("{base}/lists/{id}"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["name"], "Groceries");
}

#[tokio::test]
async fn current_user() {
    let (base, token) = planner_server().await;
    let resp = reqwest::Client::new()
        .get(format!("{base}/auth/user"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["id"], "u-ann");
    assert_eq!(body["email"], "a@example.com");
    assert_eq!(body["todos"], json!([]));
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let (base, _) = planner_server().await;
    let resp = reqwest::get(format!("{base}/all-list")).await.unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Missing authorization token");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let (base, token) = planner_server().await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/create-todo"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid JSON format"));
}

#[tokio::test]
async fn generic_command_route() {
    let (base, token) = planner_server().await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/commands/list.create"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Work", "color": "grey" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
}

#[tokio::test]
async fn timed_out_create_writes_nothing() {
    let inner = InMemoryStore::new();
    inner.records::<User>().insert(&ann()).unwrap();
    let signer = TokenSigner::new(SECRET);
    let token = signer.issue(&ann()).unwrap();

    let store = SlowStore {
        inner: inner.clone(),
        delay: Duration::from_millis(200),
    };
    let service: Arc<Service<SlowStore>> = Arc::new(microsvc::planner(store, signer));
    let state = HttpState::new(service).with_deadline(Duration::from_millis(50));
    let base = start_server(state).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/create-todo"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Buy milk" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 504);

    // Let the abandoned dispatch run to completion.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(inner.count("todo").unwrap(), 0);
    let user = inner.records::<User>().get("u-ann").unwrap().unwrap();
    assert!(user.todos.is_empty());
}
