//! Per-user session state and pluggable storage
//!
//! A [`Session`] is a plain serde value holding everything the bot remembers
//! about one user: auth credentials, rate-limit counters, and the active
//! scene. Handlers load it at the start of an update, mutate it, and write
//! it back through a [`SessionStore`].
//!
//! Two backends: in-process [`MemoryStore`] (default) and [`RedisStore`]
//! for multi-instance deployments, selected via `SESSION_BACKEND`.

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::rate_limiter::RateLimits;
use crate::telegram::scenes::Scene;

/// Authenticated banking API credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: String,
    pub organization_id: Option<String>,
    pub email: String,
}

impl AuthSession {
    /// Token exists and has not passed its expiry
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Everything the bot remembers about one user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    /// Present after a completed /login, until expiry or /logout
    pub auth: Option<AuthSession>,
    /// Fixed-window counters, keyed by policy name
    #[serde(default)]
    pub rate_limits: RateLimits,
    /// Active conversation, if any
    pub scene: Option<Scene>,
}

impl Session {
    /// Bearer token when a valid authentication exists
    pub fn token(&self) -> Option<&str> {
        self.auth
            .as_ref()
            .filter(|a| a.is_valid())
            .map(|a| a.access_token.as_str())
    }
}

/// Storage abstraction over session backends
///
/// Implementations must be safe to share across handler tasks; all
/// mutation goes through whole-value put.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the session for a key, `None` when the user is new
    async fn get(&self, key: &str) -> AppResult<Option<Session>>;

    /// Stores the whole session under a key
    async fn put(&self, key: &str, session: &Session) -> AppResult<()>;

    /// Drops the session entirely
    async fn remove(&self, key: &str) -> AppResult<()>;
}

/// Derives the storage key for an update.
///
/// Keyed by Telegram user id so a user's session follows them across
/// chats; falls back to the chat id for channel-style updates that carry
/// no sender. `None` means the update cannot be attributed at all, and
/// callers skip session handling for it.
pub fn session_key(user_id: Option<u64>, chat_id: Option<i64>) -> Option<String> {
    match (user_id, chat_id) {
        (Some(uid), _) => Some(format!("user:{uid}")),
        (None, Some(cid)) => Some(format!("chat:{cid}")),
        (None, None) => None,
    }
}

/// Builds the store named by `SESSION_BACKEND`.
pub async fn create_session_store() -> AppResult<Arc<dyn SessionStore>> {
    match config::SESSION_BACKEND.as_str() {
        "memory" => {
            log::info!("Session backend: in-memory");
            Ok(Arc::new(MemoryStore::new()))
        }
        "redis" => {
            log::info!("Session backend: redis at {}", config::REDIS_URL.as_str());
            let store = RedisStore::connect(config::REDIS_URL.as_str()).await?;
            Ok(Arc::new(store))
        }
        other => Err(AppError::Config(format!(
            "Unknown SESSION_BACKEND '{other}' (expected 'memory' or 'redis')"
        ))),
    }
}
