//! User accounts and bearer tokens.
//!
//! Passwords are stored as salted SHA-256 digests; bearer tokens are
//! HMAC-SHA256 signed `user_id:expiry` payloads, so no token state lives
//! in the database.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use taskflow_core::config::AuthConfig;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Email is already registered")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Database error: {message}")]
    Database { message: String },
}

impl From<rusqlite::Error> for AuthError {
    fn from(err: rusqlite::Error) -> Self {
        AuthError::Database {
            message: err.to_string(),
        }
    }
}

/// A registered user. The password hash never leaves this module.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    salt          TEXT NOT NULL,
    created_at    TEXT NOT NULL
);
";

/// SQLite-backed user accounts.
pub struct UserStore {
    conn: Arc<Mutex<Connection>>,
}

impl UserStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self, AuthError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Register a new user. The email is stored lowercased.
    pub async fn create(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = email.trim().to_lowercase();
        let salt = random_salt();
        let hash = hash_password(password, &salt);
        let user = User {
            id: Uuid::new_v4(),
            email: email.clone(),
            created_at: Utc::now(),
        };

        let conn = self.conn.lock().await;
        let result = conn.execute(
            "INSERT INTO users (id, email, password_hash, salt, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                user.id.to_string(),
                email,
                hash,
                salt,
                user.created_at.to_rfc3339(),
            ],
        );
        match result {
            Ok(_) => {
                info!(user_id = %user.id, "user registered");
                Ok(user)
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(AuthError::EmailTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Verify credentials and return the user.
    pub async fn verify(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = email.trim().to_lowercase();
        let conn = self.conn.lock().await;
        let row: Option<(String, String, String, String)> = conn
            .query_row(
                "SELECT id, password_hash, salt, created_at FROM users WHERE email = ?1",
                [&email],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        let (id, stored_hash, salt, created_at) = row.ok_or(AuthError::InvalidCredentials)?;
        if hash_password(password, &salt) != stored_hash {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(User {
            id: id.parse().map_err(|_| AuthError::InvalidCredentials)?,
            email,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

fn random_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Signs and verifies bearer tokens.
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            secret: config.secret.as_bytes().to_vec(),
            ttl: Duration::minutes(config.token_ttl_mins),
        }
    }

    /// Issue a token for `user_id`, valid until now + ttl.
    pub fn issue(&self, user_id: Uuid) -> String {
        let expiry = (Utc::now() + self.ttl).timestamp();
        let payload = format!("{user_id}:{expiry}");
        let mac = self.sign(payload.as_bytes());
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload.as_bytes()),
            URL_SAFE_NO_PAD.encode(mac)
        )
    }

    /// Verify a token and return the user id it names.
    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let (payload_b64, mac_b64) = token.split_once('.').ok_or(AuthError::InvalidToken)?;
        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| AuthError::InvalidToken)?;
        let mac = URL_SAFE_NO_PAD
            .decode(mac_b64)
            .map_err(|_| AuthError::InvalidToken)?;

        let mut verifier =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| AuthError::InvalidToken)?;
        verifier.update(&payload);
        verifier
            .verify_slice(&mac)
            .map_err(|_| AuthError::InvalidToken)?;

        let payload = String::from_utf8(payload).map_err(|_| AuthError::InvalidToken)?;
        let (user_id, expiry) = payload.split_once(':').ok_or(AuthError::InvalidToken)?;
        let expiry: i64 = expiry.parse().map_err(|_| AuthError::InvalidToken)?;
        if expiry < Utc::now().timestamp() {
            return Err(AuthError::InvalidToken);
        }
        user_id.parse().map_err(|_| AuthError::InvalidToken)
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(&AuthConfig::default())
    }

    #[tokio::test]
    async fn test_user_store_reopens_from_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.db");

        let store = UserStore::open(&path).unwrap();
        store.create("a@b.c", "hunter2secret").await.unwrap();
        drop(store);

        let reopened = UserStore::open(&path).unwrap();
        let user = reopened.verify("a@b.c", "hunter2secret").await.unwrap();
        assert_eq!(user.email, "a@b.c");
    }

    #[test]
    fn test_token_roundtrip() {
        let signer = signer();
        let user_id = Uuid::new_v4();
        let token = signer.issue(user_id);
        assert_eq!(signer.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let signer = signer();
        let token = signer.issue(Uuid::new_v4());
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(signer.verify(&tampered).is_err());
        assert!(signer.verify("not-a-token").is_err());
        assert!(signer.verify("").is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let signer_a = signer();
        let signer_b = TokenSigner::new(&AuthConfig {
            secret: "another-secret".into(),
            ..AuthConfig::default()
        });
        let token = signer_b.issue(Uuid::new_v4());
        assert!(signer_a.verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let signer = TokenSigner::new(&AuthConfig {
            token_ttl_mins: -5,
            ..AuthConfig::default()
        });
        let token = signer.issue(Uuid::new_v4());
        assert!(matches!(signer.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_signup_and_login() {
        let store = UserStore::open_in_memory().unwrap();
        let user = store.create("Alice@Example.com", "hunter2secret").await.unwrap();
        assert_eq!(user.email, "alice@example.com");

        let verified = store
            .verify("alice@example.com", "hunter2secret")
            .await
            .unwrap();
        assert_eq!(verified.id, user.id);

        let err = store.verify("alice@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        let err = store.verify("nobody@example.com", "x").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let store = UserStore::open_in_memory().unwrap();
        store.create("a@b.c", "password1").await.unwrap();
        let err = store.create("A@B.C", "password2").await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[test]
    fn test_same_password_hashes_differently_per_salt() {
        let h1 = hash_password("secret", &random_salt());
        let h2 = hash_password("secret", &random_salt());
        assert_ne!(h1, h2);
    }
}
