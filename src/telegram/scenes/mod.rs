//! Conversational scenes (multi-step wizards)
//!
//! Every multi-message flow is a scene: a named-state machine stored in the
//! session between updates. Each state names exactly the data collected so
//! far, so skipping a step is unrepresentable. Rules shared by all scenes:
//!
//! - cancel always works, from any state, before anything else runs
//! - invalid input re-prompts and stays in the same state
//! - a service failure aborts the scene with a generic message
//! - expired auth mid-scene aborts with a login prompt
//!
//! Scenes never touch teloxide: they consume [`SceneInput`] and produce
//! [`Reply`] values, which keeps every flow testable with a mock API.

pub mod batch;
pub mod login;
pub mod transfer;
pub mod withdraw;

use serde::{Deserialize, Serialize};

use crate::api::{ApiError, BankingApi};
use crate::core::config::rate_limit;
use crate::core::rate_limiter::{self, RateLimitConfig};
use crate::session::Session;
use crate::telegram::callback::CallbackAction;
use crate::telegram::format;
use crate::telegram::keyboards::KeyboardSpec;

pub use batch::BatchState;
pub use login::LoginState;
pub use transfer::TransferState;
pub use withdraw::WithdrawState;

/// The active conversation, persisted in the session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "scene", content = "state", rename_all = "snake_case")]
pub enum Scene {
    Login(LoginState),
    Transfer(TransferState),
    Withdraw(WithdrawState),
    Batch(BatchState),
}

/// One update's worth of user input, already normalized
#[derive(Debug, Clone)]
pub enum SceneInput {
    /// Plain message text
    Text(String),
    /// Parsed inline button press
    Action(CallbackAction),
}

/// One outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<KeyboardSpec>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), keyboard: None }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: KeyboardSpec) -> Self {
        Self { text: text.into(), keyboard: Some(keyboard) }
    }

    /// A lone cancel button
    pub fn with_cancel(text: impl Into<String>) -> Self {
        Self::with_keyboard(text, vec![vec![cancel_button()]])
    }
}

pub(crate) fn cancel_button() -> (String, String) {
    ("Cancel".to_string(), CallbackAction::Cancel.to_data())
}

/// Routes input into the active scene.
///
/// Cancellation is handled here so no individual state can forget it. The
/// scene is taken out of the session before dispatch; state handlers put
/// back whatever state the flow should be in afterwards (or nothing, to
/// leave the scene).
pub async fn handle_input(api: &dyn BankingApi, session: &mut Session, input: SceneInput) -> Vec<Reply> {
    if matches!(input, SceneInput::Action(CallbackAction::Cancel)) {
        return if session.scene.take().is_some() {
            vec![Reply::text(format::operation_cancelled())]
        } else {
            vec![Reply::text(format::nothing_to_cancel())]
        };
    }

    let Some(scene) = session.scene.take() else {
        return vec![Reply::text(format::unknown_input())];
    };

    match scene {
        Scene::Login(state) => login::handle(api, session, state, input).await,
        Scene::Transfer(state) => transfer::handle(api, session, state, input).await,
        Scene::Withdraw(state) => withdraw::handle(api, session, state, input).await,
        Scene::Batch(state) => batch::handle(api, session, state, input).await,
    }
}

/// Valid bearer token, or the reply that aborts the scene.
///
/// Used by every authenticated scene step; returning the error variant
/// leaves the scene (the caller already took it out of the session).
pub(crate) fn require_token(session: &mut Session) -> Result<String, Vec<Reply>> {
    match session.token() {
        Some(token) => Ok(token.to_string()),
        None => {
            session.auth = None;
            Err(vec![Reply::text(format::session_expired())])
        }
    }
}

/// Maps a scene-aborting API failure to its user-facing replies.
pub(crate) fn service_failure(session: &mut Session, context: &str, err: &ApiError) -> Vec<Reply> {
    if err.is_unauthorized() {
        session.auth = None;
        log::info!("Token rejected during {context}; cleared auth");
        return vec![Reply::text(format::session_expired())];
    }
    log::error!("{context} failed: {err}");
    vec![Reply::text(format::generic_failure())]
}

/// Refusal reply when a rate-limit window is exhausted, `None` otherwise.
pub(crate) fn rate_limit_refusal(session: &mut Session, config: &RateLimitConfig) -> Option<Reply> {
    if rate_limiter::is_limited(&mut session.rate_limits, config) {
        let wait = rate_limiter::time_remaining(&session.rate_limits, config);
        Some(Reply::text(format::rate_limited(config.message, wait)))
    } else {
        None
    }
}

/// Shared guard for the transfer-submission limit.
pub(crate) fn transfer_limit_refusal(session: &mut Session) -> Option<Reply> {
    rate_limit_refusal(session, &rate_limit::TRANSFER)
}

/// Currency every flow operates in
pub(crate) const CURRENCY: &str = "USDC";

/// Spendable balance across the user's wallets, in [`CURRENCY`].
///
/// `None` when the balance can't be determined (API error, unparseable
/// amounts). Callers treat that as "unknown" and let the transfer through;
/// the API enforces the real balance on submission.
pub(crate) async fn available_balance(api: &dyn BankingApi, token: &str) -> Option<f64> {
    let balances = match api.balances(token).await {
        Ok(b) => b,
        Err(e) => {
            log::warn!("Balance pre-check unavailable: {e}");
            return None;
        }
    };
    let mut total = 0.0;
    let mut found = false;
    for wallet in &balances {
        for token_balance in &wallet.balances {
            if token_balance.symbol.eq_ignore_ascii_case(CURRENCY) {
                if let Ok(value) = token_balance.balance.parse::<f64>() {
                    total += value;
                    found = true;
                }
            }
        }
    }
    found.then_some(total)
}
