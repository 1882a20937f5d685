//! Configuration system for TaskFlow.
//!
//! Uses `figment` for layered configuration: defaults -> `taskflow.toml`
//! -> `TASKFLOW_*` environment variables. Each section has sensible
//! defaults so a bare `AppConfig::default()` is fully usable in tests.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Top-level configuration for the TaskFlow service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub llm: LlmConfig,
    pub auth: AuthConfig,
    pub chat: ChatConfig,
}

/// HTTP server binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
        }
    }
}

/// Task store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path. The literal `:memory:` opens an in-memory store.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("taskflow.db"),
        }
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider kind: "openai" or "mock".
    pub provider: String,
    pub model: String,
    /// Base URL for OpenAI-compatible endpoints.
    pub base_url: String,
    /// API key; if unset, read from the env var named in `api_key_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            model: "gpt-4o-mini".into(),
            base_url: "https://api.openai.com/v1".into(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".into(),
            temperature: 0.2,
            request_timeout_secs: 30,
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from config or environment.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        std::env::var(&self.api_key_env).map_err(|_| ConfigError::MissingField {
            field: format!("llm.api_key (or env {})", self.api_key_env),
        })
    }
}

/// Token signing and password hashing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC signing secret for bearer tokens.
    pub secret: String,
    /// Token lifetime in minutes.
    pub token_ttl_mins: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // Overridden via TASKFLOW_AUTH__SECRET in any real deployment.
            secret: "dev-secret-change-me".into(),
            token_ttl_mins: 30,
        }
    }
}

/// Chat agent limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum accepted message length in characters.
    pub max_message_chars: usize,
    /// Default number of tasks fetched per listing.
    pub default_list_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_chars: 1000,
            default_list_limit: 100,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional TOML file, and env vars.
    ///
    /// Env vars use the `TASKFLOW_` prefix with `__` as the section
    /// separator, e.g. `TASKFLOW_SERVER__PORT=9000`.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        match config_path {
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => figment = figment.merge(Toml::file("taskflow.toml")),
        }

        figment
            .merge(Env::prefixed("TASKFLOW_").split("__"))
            .extract()
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.chat.max_message_chars, 1000);
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.auth.token_ttl_mins, 30);
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
[server]
host = "0.0.0.0"
port = 9001

[llm]
provider = "mock"
model = "test-model"
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.llm.provider, "mock");
        assert_eq!(config.llm.model, "test-model");
        // Unset sections keep their defaults.
        assert_eq!(config.chat.default_list_limit, 100);
    }

    #[test]
    fn test_resolve_api_key_from_config() {
        let config = LlmConfig {
            api_key: Some("sk-test".into()),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().unwrap(), "sk-test");
    }

    #[test]
    fn test_resolve_api_key_missing() {
        let config = LlmConfig {
            api_key: None,
            api_key_env: "TASKFLOW_TEST_KEY_THAT_DOES_NOT_EXIST".into(),
            ..Default::default()
        };
        assert!(config.resolve_api_key().is_err());
    }
}
