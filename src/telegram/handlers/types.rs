//! Handler dependencies and shared helpers

use std::sync::Arc;

use teloxide::prelude::*;

use crate::api::BankingApi;
use crate::session::{Session, SessionStore};
use crate::telegram::keyboards;
use crate::telegram::scenes::Reply;
use crate::telegram::Bot;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type HandlerResult = Result<(), HandlerError>;

/// Dependencies required by handlers
///
/// The composition root in `main` builds one of these and clones it into
/// every branch of the dispatcher tree. Both fields are trait objects so
/// tests can substitute mocks.
#[derive(Clone)]
pub struct HandlerDeps {
    pub api: Arc<dyn BankingApi>,
    pub sessions: Arc<dyn SessionStore>,
}

impl HandlerDeps {
    pub fn new(api: Arc<dyn BankingApi>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { api, sessions }
    }

    /// Loads the session for a key, falling back to a fresh one.
    ///
    /// A broken store read is logged and treated as "new user": the bot
    /// stays usable, the user may just have to /login again.
    pub async fn load_session(&self, key: &str) -> Session {
        match self.sessions.get(key).await {
            Ok(Some(session)) => session,
            Ok(None) => Session::default(),
            Err(e) => {
                log::error!("Session load failed for {key}: {e}");
                Session::default()
            }
        }
    }

    /// Persists the session; failures are logged, never fatal.
    pub async fn save_session(&self, key: &str, session: &Session) {
        if let Err(e) = self.sessions.put(key, session).await {
            log::error!("Session save failed for {key}: {e}");
        }
    }
}

/// Sends a batch of scene replies to a chat.
pub async fn send_replies(bot: &Bot, chat_id: ChatId, replies: Vec<Reply>) -> HandlerResult {
    for reply in replies {
        let mut req = bot.send_message(chat_id, reply.text);
        if let Some(spec) = reply.keyboard {
            req = req.reply_markup(keyboards::to_markup(&spec));
        }
        req.await?;
    }
    Ok(())
}
