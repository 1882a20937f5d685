//! TaskFlow core — a todo-list engine with a natural-language chat front.
//!
//! The library is organized around one flow: a chat message is
//! classified ([`classifier`]), either short-circuited by a heuristic
//! (view, update, gratitude, abuse) or handed to an LLM with a tool menu
//! ([`llm`], [`tools`]), and any resulting tool call is validated and run
//! against the task store ([`dispatch`], [`store`]). Replies are rendered
//! by [`formatter`]. The HTTP surface lives in the server crate.

pub mod agent;
pub mod classifier;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod formatter;
pub mod lexicon;
pub mod llm;
pub mod parser;
pub mod providers;
pub mod resolver;
pub mod store;
pub mod tools;
pub mod types;

pub use agent::ChatAgent;
pub use classifier::IntentClassifier;
pub use config::AppConfig;
pub use dispatch::{DispatchOutcome, ToolDispatcher};
pub use error::{DispatchError, LlmError, Result, StoreError, TaskflowError};
pub use lexicon::Lexicon;
pub use llm::{LlmProvider, MockLlmProvider};
pub use providers::OpenAiProvider;
pub use store::{SqliteTaskStore, TaskStore};
pub use types::{
    Intent, NewTask, Priority, StatusFilter, Task, TaskPatch, TaskStatus,
};
