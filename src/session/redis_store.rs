//! Redis-backed session storage
//!
//! Sessions are stored as JSON strings under a namespaced key, so multiple
//! bot instances can share state and sessions survive restarts. The
//! multiplexed connection is cheap to clone per operation.

use redis::AsyncCommands;

use crate::core::error::{AppError, AppResult};
use crate::session::{Session, SessionStore};

const KEY_PREFIX: &str = "copperbot:session:";

pub struct RedisStore {
    conn: redis::aio::MultiplexedConnection,
}

impl RedisStore {
    /// Opens a connection and verifies it with a ping.
    pub async fn connect(url: &str) -> AppResult<Self> {
        let client =
            redis::Client::open(url).map_err(|e| AppError::Session(format!("Invalid Redis URL: {e}")))?;
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Session(format!("Redis connection failed: {e}")))?;
        redis::cmd("PING")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| AppError::Session(format!("Redis ping failed: {e}")))?;
        Ok(Self { conn })
    }

    fn redis_key(key: &str) -> String {
        format!("{KEY_PREFIX}{key}")
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisStore {
    async fn get(&self, key: &str) -> AppResult<Option<Session>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(Self::redis_key(key))
            .await
            .map_err(|e| AppError::Session(format!("Redis GET failed: {e}")))?;
        match raw {
            Some(json) => {
                let session = serde_json::from_str(&json)
                    .map_err(|e| AppError::Session(format!("Corrupt session for {key}: {e}")))?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, session: &Session) -> AppResult<()> {
        let json = serde_json::to_string(session)
            .map_err(|e| AppError::Session(format!("Session serialization failed: {e}")))?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(Self::redis_key(key), json)
            .await
            .map_err(|e| AppError::Session(format!("Redis SET failed: {e}")))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(Self::redis_key(key))
            .await
            .map_err(|e| AppError::Session(format!("Redis DEL failed: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_key_is_namespaced() {
        assert_eq!(RedisStore::redis_key("user:42"), "copperbot:session:user:42");
    }
}
