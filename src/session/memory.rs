//! In-process session storage backed by DashMap
//!
//! Default backend. Sessions vanish on restart, which is acceptable for a
//! single-instance bot: users just /login again.

use dashmap::DashMap;

use crate::core::error::AppResult;
use crate::session::{Session, SessionStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: DashMap<String, Session>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<Session>> {
        Ok(self.sessions.get(key).map(|entry| entry.clone()))
    }

    async fn put(&self, key: &str, session: &Session) -> AppResult<()> {
        self.sessions.insert(key.to_string(), session.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.sessions.remove(key);
        Ok(())
    }
}
