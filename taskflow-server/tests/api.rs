//! Integration tests for the HTTP API.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use taskflow_core::agent::ChatAgent;
use taskflow_core::config::{AppConfig, AuthConfig, ChatConfig};
use taskflow_core::lexicon::Lexicon;
use taskflow_core::llm::MockLlmProvider;
use taskflow_core::store::{SqliteTaskStore, TaskStore};
use taskflow_server::auth::{TokenSigner, UserStore};
use taskflow_server::build_state;
use taskflow_server::routes::{app_router, AppState};
use tower::ServiceExt;

fn test_state(provider: MockLlmProvider) -> AppState {
    let store: Arc<dyn TaskStore> = Arc::new(SqliteTaskStore::open_in_memory().unwrap());
    let users = Arc::new(UserStore::open_in_memory().unwrap());
    let signer = Arc::new(TokenSigner::new(&AuthConfig::default()));
    let agent = Arc::new(ChatAgent::new(
        Arc::new(provider),
        store.clone(),
        Lexicon::default(),
        ChatConfig::default(),
    ));
    AppState {
        store,
        users,
        signer,
        agent,
    }
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(state: &AppState, req: Request<Body>) -> (StatusCode, Value) {
    let app = app_router(state.clone());
    let resp = ServiceExt::<Request<Body>>::oneshot(app, req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn signup(state: &AppState, email: &str) -> String {
    let (status, json) = send(
        state,
        request(
            "POST",
            "/auth/signup",
            None,
            Some(json!({"email": email, "password": "hunter2secret"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn root_reports_name_and_version() {
    let state = test_state(MockLlmProvider::new());
    let (status, json) = send(&state, request("GET", "/", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "TaskFlow API");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn signup_validates_and_rejects_duplicates() {
    let state = test_state(MockLlmProvider::new());

    let (status, _) = send(
        &state,
        request(
            "POST",
            "/auth/signup",
            None,
            Some(json!({"email": "not-an-email", "password": "hunter2secret"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &state,
        request(
            "POST",
            "/auth/signup",
            None,
            Some(json!({"email": "a@b.c", "password": "short"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    signup(&state, "a@b.c").await;
    let (status, _) = send(
        &state,
        request(
            "POST",
            "/auth/signup",
            None,
            Some(json!({"email": "a@b.c", "password": "hunter2secret"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let state = test_state(MockLlmProvider::new());
    signup(&state, "a@b.c").await;

    let (status, json) = send(
        &state,
        request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "a@b.c", "password": "hunter2secret"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["token"].is_string());

    let (status, _) = send(
        &state,
        request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "a@b.c", "password": "wrong-password"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn task_routes_require_a_token() {
    let state = test_state(MockLlmProvider::new());
    let (status, _) = send(&state, request("GET", "/tasks", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&state, request("GET", "/tasks", Some("garbage"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn task_crud_flow() {
    let state = test_state(MockLlmProvider::new());
    let token = signup(&state, "a@b.c").await;

    let (status, created) = send(
        &state,
        request(
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({
                "title": "Client meeting",
                "priority": "high",
                "due_date": "2026-09-05"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "Client meeting");
    assert_eq!(created["priority"], "high");
    assert_eq!(created["status"], "pending");
    assert_eq!(created["due_date"], "2026-09-05");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, listed) = send(&state, request("GET", "/tasks", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, fetched) = send(
        &state,
        request("GET", &format!("/tasks/{id}"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], id.as_str());

    let (status, updated) = send(
        &state,
        request(
            "PUT",
            &format!("/tasks/{id}"),
            Some(&token),
            Some(json!({"priority": "low"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["priority"], "low");
    assert_eq!(updated["title"], "Client meeting");

    let (status, _) = send(
        &state,
        request("DELETE", &format!("/tasks/{id}"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &state,
        request("GET", &format!("/tasks/{id}"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn toggle_maintains_completed_at() {
    let state = test_state(MockLlmProvider::new());
    let token = signup(&state, "a@b.c").await;
    let (_, created) = send(
        &state,
        request("POST", "/tasks", Some(&token), Some(json!({"title": "flip"}))),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, toggled) = send(
        &state,
        request("PATCH", &format!("/tasks/{id}/toggle"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["status"], "completed");
    assert!(toggled["completed_at"].is_string());

    let (_, toggled_back) = send(
        &state,
        request("PATCH", &format!("/tasks/{id}/toggle"), Some(&token), None),
    )
    .await;
    assert_eq!(toggled_back["status"], "pending");
    assert!(toggled_back["completed_at"].is_null());
}

#[tokio::test]
async fn foreign_tasks_are_forbidden_not_missing() {
    let state = test_state(MockLlmProvider::new());
    let owner_token = signup(&state, "owner@b.c").await;
    let intruder_token = signup(&state, "intruder@b.c").await;

    let (_, created) = send(
        &state,
        request(
            "POST",
            "/tasks",
            Some(&owner_token),
            Some(json!({"title": "secret"})),
        ),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, _) = send(
        &state,
        request("GET", &format!("/tasks/{id}"), Some(&intruder_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &state,
        request(
            "PUT",
            &format!("/tasks/{id}"),
            Some(&intruder_token),
            Some(json!({"title": "hijacked"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &state,
        request(
            "DELETE",
            &format!("/tasks/{id}"),
            Some(&intruder_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // And the task itself is untouched.
    let (_, unchanged) = send(
        &state,
        request("GET", &format!("/tasks/{id}"), Some(&owner_token), None),
    )
    .await;
    assert_eq!(unchanged["title"], "secret");

    // The intruder's own listing stays empty.
    let (_, listed) = send(&state, request("GET", "/tasks", Some(&intruder_token), None)).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn create_task_validation() {
    let state = test_state(MockLlmProvider::new());
    let token = signup(&state, "a@b.c").await;

    let (status, _) = send(
        &state,
        request("POST", "/tasks", Some(&token), Some(json!({"title": "  "}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &state,
        request(
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({"title": "x".repeat(201)})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_endpoint_runs_the_agent() {
    let state = test_state(MockLlmProvider::new());
    let token = signup(&state, "a@b.c").await;

    let (status, json) = send(
        &state,
        request(
            "POST",
            "/api/chat",
            Some(&token),
            Some(json!({"message": "thank you"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["reply"],
        "You're welcome! I'm glad I was able to help you."
    );

    let (status, _) = send(
        &state,
        request("POST", "/api/chat", Some(&token), Some(json!({"message": "  "}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_create_flow_end_to_end() {
    let provider = MockLlmProvider::new();
    provider.queue_response(MockLlmProvider::tool_call_response(
        "create_task",
        json!({"title": "Buy groceries"}),
    ));
    let state = test_state(provider);
    let token = signup(&state, "a@b.c").await;

    let (status, json) = send(
        &state,
        request(
            "POST",
            "/api/chat",
            Some(&token),
            Some(json!({"message": "I need to buy groceries"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["reply"], "✅ Created task 'Buy groceries'.");

    let (_, listed) = send(&state, request("GET", "/tasks", Some(&token), None)).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["title"], "Buy groceries");
}

#[tokio::test]
async fn build_state_opens_stores_at_configured_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.store.path = dir.path().join("taskflow.db");
    config.llm.provider = "mock".into();

    let state = build_state(&config).unwrap();
    let token = signup(&state, "a@b.c").await;
    let (status, _) = send(
        &state,
        request(
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({"title": "persisted"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Both tables landed in the same on-disk file.
    assert!(config.store.path.exists());
}
