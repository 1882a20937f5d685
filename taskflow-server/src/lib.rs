//! TaskFlow HTTP server library.
//!
//! Exposed as a library so integration tests can build the router
//! without binding a socket.

pub mod auth;
pub mod routes;

use std::sync::Arc;

use taskflow_core::agent::ChatAgent;
use taskflow_core::config::AppConfig;
use taskflow_core::error::Result;
use taskflow_core::lexicon::Lexicon;
use taskflow_core::llm::{LlmProvider, MockLlmProvider};
use taskflow_core::providers::OpenAiProvider;
use taskflow_core::store::{SqliteTaskStore, TaskStore};
use tracing::warn;

use auth::{TokenSigner, UserStore};
use routes::AppState;

/// Build the full application state from configuration.
///
/// Task and user tables share the SQLite file from `store.path`.
pub fn build_state(config: &AppConfig) -> Result<AppState> {
    let store: Arc<dyn TaskStore> = Arc::new(SqliteTaskStore::open(&config.store.path)?);
    let users = Arc::new(UserStore::open(&config.store.path).map_err(|e| {
        taskflow_core::error::StoreError::Database {
            message: e.to_string(),
        }
    })?);
    let signer = Arc::new(TokenSigner::new(&config.auth));
    let provider = build_provider(config);
    let agent = Arc::new(ChatAgent::new(
        provider,
        store.clone(),
        Lexicon::default(),
        config.chat.clone(),
    ));

    Ok(AppState {
        store,
        users,
        signer,
        agent,
    })
}

/// Pick the chat model backend named in the config.
///
/// Falls back to the mock provider when no API key can be resolved, so
/// the server still starts for local development; the chat endpoint then
/// answers from heuristics and canned mock text only.
fn build_provider(config: &AppConfig) -> Arc<dyn LlmProvider> {
    if config.llm.provider == "mock" {
        return Arc::new(MockLlmProvider::new());
    }
    match OpenAiProvider::new(&config.llm) {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            warn!(error = %e, "LLM provider unavailable, using mock");
            Arc::new(MockLlmProvider::new())
        }
    }
}
