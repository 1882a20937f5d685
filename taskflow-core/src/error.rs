//! Error types for the TaskFlow core library.
//!
//! Uses `thiserror` for structured error enums covering the task store,
//! tool dispatch, LLM provider, and configuration domains.

use uuid::Uuid;

/// Top-level error type for the TaskFlow core library.
#[derive(Debug, thiserror::Error)]
pub enum TaskflowError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the task store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Task {id} not found")]
    NotFound { id: Uuid },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database {
            message: err.to_string(),
        }
    }
}

/// Errors from validating and dispatching tool calls.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Task {id} not found")]
    NotFound { id: Uuid },

    #[error("Access denied: task {id} belongs to another user")]
    AccessDenied { id: Uuid },

    #[error("Store failure: {message}")]
    Store { message: String },
}

impl From<StoreError> for DispatchError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => DispatchError::NotFound { id },
            StoreError::Database { message } => DispatchError::Store { message },
        }
    }
}

/// Errors from LLM provider interactions.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// A type alias for results using the top-level `TaskflowError`.
pub type Result<T> = std::result::Result<T, TaskflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_store() {
        let id = Uuid::nil();
        let err = TaskflowError::Store(StoreError::NotFound { id });
        assert_eq!(
            err.to_string(),
            format!("Store error: Task {id} not found")
        );
    }

    #[test]
    fn test_error_display_dispatch() {
        let err = TaskflowError::Dispatch(DispatchError::InvalidArguments {
            tool: "create_task".into(),
            reason: "title cannot be empty".into(),
        });
        assert_eq!(
            err.to_string(),
            "Dispatch error: Invalid arguments for 'create_task': title cannot be empty"
        );
    }

    #[test]
    fn test_store_error_maps_to_dispatch() {
        let id = Uuid::new_v4();
        let err: DispatchError = StoreError::NotFound { id }.into();
        assert!(matches!(err, DispatchError::NotFound { id: got } if got == id));

        let err: DispatchError = StoreError::Database {
            message: "disk full".into(),
        }
        .into();
        assert!(matches!(err, DispatchError::Store { .. }));
    }

    #[test]
    fn test_access_denied_distinct_from_not_found() {
        let id = Uuid::new_v4();
        let denied = DispatchError::AccessDenied { id };
        let missing = DispatchError::NotFound { id };
        assert_ne!(denied.to_string(), missing.to_string());
    }

    #[test]
    fn test_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: TaskflowError = serde_err.into();
        assert!(matches!(err, TaskflowError::Serialization(_)));
    }
}
