//! HTTP API surface built on axum.

use crate::auth::{AuthError, TokenSigner, User, UserStore};
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use taskflow_core::agent::ChatAgent;
use taskflow_core::error::{StoreError, TaskflowError};
use taskflow_core::store::TaskStore;
use taskflow_core::types::{NewTask, Priority, StatusFilter, Task, TaskPatch, TaskStatus};
use tracing::error;
use uuid::Uuid;

const MAX_TITLE_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 1000;
const MIN_PASSWORD_CHARS: usize = 8;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TaskStore>,
    pub users: Arc<UserStore>,
    pub signer: Arc<TokenSigner>,
    pub agent: Arc<ChatAgent>,
}

/// Build the application router.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/tasks", post(create_task).get(list_tasks))
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/tasks/:id/toggle", patch(toggle_task))
        .route("/api/chat", post(chat))
        .with_state(state)
}

// --- Errors ---

/// An error rendered as a JSON body plus the right status code.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Invalid or missing credentials".to_string(),
            ),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Access denied".to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Task not found".to_string()),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m),
            ApiError::Internal(m) => {
                error!(message = m.as_str(), "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailTaken => ApiError::Conflict("Email is already registered".into()),
            AuthError::InvalidCredentials | AuthError::InvalidToken => ApiError::Unauthorized,
            AuthError::Database { message } => ApiError::Internal(message),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::NotFound,
            StoreError::Database { message } => ApiError::Internal(message),
        }
    }
}

impl From<TaskflowError> for ApiError {
    fn from(err: TaskflowError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

// --- Auth extractor ---

/// The authenticated user's id, pulled from the bearer token.
pub struct AuthUser(pub Uuid);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;
        let user_id = state.signer.verify(token)?;
        Ok(AuthUser(user_id))
    }
}

// --- Request / response bodies ---

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

// --- Handlers ---

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "name": "TaskFlow API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn signup(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let email = body.email.trim();
    if !email.contains('@') || email.len() < 3 {
        return Err(ApiError::BadRequest("A valid email is required".into()));
    }
    if body.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }

    let user = state.users.create(email, &body.password).await?;
    let token = state.signer.issue(user.id);
    Ok((StatusCode::CREATED, Json(TokenResponse { token, user })))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state.users.verify(&body.email, &body.password).await?;
    let token = state.signer.issue(user.id);
    Ok(Json(TokenResponse { token, user }))
}

async fn create_task(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let title = body.title.trim().to_string();
    if title.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
        return Err(ApiError::BadRequest(
            "Title must be between 1 and 200 characters".into(),
        ));
    }
    if let Some(ref d) = body.description {
        if d.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(ApiError::BadRequest(
                "Description must be at most 1000 characters".into(),
            ));
        }
    }

    let task = state
        .store
        .create(
            owner,
            NewTask {
                title,
                description: body.description,
                priority: body.priority.unwrap_or_default(),
                due_date: body.due_date,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let status = match query.status.as_deref() {
        Some(raw) => StatusFilter::parse(raw).ok_or_else(|| {
            ApiError::BadRequest("status must be all, pending, or completed".into())
        })?,
        None => StatusFilter::All,
    };
    let priority = match query.priority.as_deref() {
        Some(raw) => Some(Priority::parse(raw).ok_or_else(|| {
            ApiError::BadRequest("priority must be high, medium, or low".into())
        })?),
        None => None,
    };
    let limit = query.limit.unwrap_or(100);
    if limit < 1 || limit > 100 {
        return Err(ApiError::BadRequest("limit must be between 1 and 100".into()));
    }

    let tasks = state.store.list(Some(owner), status, priority, limit).await?;
    Ok(Json(tasks))
}

async fn get_task(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    let task = fetch_owned(&state, id, owner).await?;
    Ok(Json(task))
}

async fn update_task(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    if let Some(ref title) = body.title {
        let title = title.trim();
        if title.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
            return Err(ApiError::BadRequest(
                "Title must be between 1 and 200 characters".into(),
            ));
        }
    }
    if let Some(ref d) = body.description {
        if d.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(ApiError::BadRequest(
                "Description must be at most 1000 characters".into(),
            ));
        }
    }
    let patch = TaskPatch {
        title: body.title.map(|t| t.trim().to_string()),
        description: body.description,
        status: body.status,
        priority: body.priority,
        due_date: body.due_date,
    };
    if patch.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".into()));
    }

    fetch_owned(&state, id, owner).await?;
    let task = state.store.update(id, patch).await?;
    Ok(Json(task))
}

async fn toggle_task(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    let task = fetch_owned(&state, id, owner).await?;
    let toggled = state
        .store
        .update(id, TaskPatch::status(task.status.toggled()))
        .await?;
    Ok(Json(toggled))
}

async fn delete_task(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    fetch_owned(&state, id, owner).await?;
    state.store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn chat(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if body.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message must not be empty".into()));
    }
    let reply = state.agent.handle_message(&body.message, owner).await?;
    Ok(Json(ChatResponse { reply }))
}

/// Fetch a task and verify ownership. A foreign task is a 403, a
/// missing one a 404.
async fn fetch_owned(state: &AppState, id: Uuid, owner: Uuid) -> Result<Task, ApiError> {
    let task = state.store.get(id).await?.ok_or(ApiError::NotFound)?;
    if task.owner_id != owner {
        return Err(ApiError::Forbidden);
    }
    Ok(task)
}
