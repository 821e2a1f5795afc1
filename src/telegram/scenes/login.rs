//! Login scene: email -> OTP -> authenticated session
//!
//! Two steps. The email step requests a one-time code (rate limited to stop
//! OTP spam); the code step verifies it (rate limited to stop brute force).
//! A rejected code re-prompts instead of aborting, bounded by the verify
//! limit.

use serde::{Deserialize, Serialize};

use crate::api::{ApiError, BankingApi};
use crate::core::config::rate_limit;
use crate::core::rate_limiter;
use crate::core::validation::validate_email;
use crate::session::{AuthSession, Session};
use crate::telegram::scenes::{rate_limit_refusal, service_failure, Reply, Scene, SceneInput};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum LoginState {
    /// Waiting for the user's email address
    Email,
    /// Code sent; `sid` must be echoed back on verification
    Otp { email: String, sid: String },
}

/// Starts the login flow (the /login command).
pub fn enter(session: &mut Session) -> Vec<Reply> {
    if let Some(auth) = session.auth.as_ref().filter(|a| a.is_valid()) {
        return vec![Reply::text(format!(
            "You're already signed in as {}. Use /logout first to switch accounts.",
            auth.email
        ))];
    }
    session.scene = Some(Scene::Login(LoginState::Email));
    vec![Reply::with_cancel(
        "Let's sign you in. What's the email address on your CopperX account?",
    )]
}

pub(super) async fn handle(
    api: &dyn BankingApi,
    session: &mut Session,
    state: LoginState,
    input: SceneInput,
) -> Vec<Reply> {
    match state {
        LoginState::Email => handle_email(api, session, input).await,
        LoginState::Otp { email, sid } => handle_otp(api, session, email, sid, input).await,
    }
}

async fn handle_email(api: &dyn BankingApi, session: &mut Session, input: SceneInput) -> Vec<Reply> {
    let SceneInput::Text(text) = input else {
        session.scene = Some(Scene::Login(LoginState::Email));
        return vec![Reply::with_cancel("Please type your email address.")];
    };
    let email = text.trim();

    if let Err(e) = validate_email(email) {
        session.scene = Some(Scene::Login(LoginState::Email));
        return vec![Reply::with_cancel(e.to_string())];
    }

    if let Some(refusal) = rate_limit_refusal(session, &rate_limit::OTP_REQUEST) {
        session.scene = Some(Scene::Login(LoginState::Email));
        return vec![refusal];
    }
    rate_limiter::increment(&mut session.rate_limits, &rate_limit::OTP_REQUEST);

    match api.request_otp(email).await {
        Ok(otp) => {
            session.scene = Some(Scene::Login(LoginState::Otp {
                email: otp.email,
                sid: otp.sid,
            }));
            vec![Reply::with_cancel(format!(
                "I've sent a one-time code to {email}. Enter it here."
            ))]
        }
        Err(e) => service_failure(session, "OTP request", &e),
    }
}

async fn handle_otp(
    api: &dyn BankingApi,
    session: &mut Session,
    email: String,
    sid: String,
    input: SceneInput,
) -> Vec<Reply> {
    let SceneInput::Text(text) = input else {
        session.scene = Some(Scene::Login(LoginState::Otp { email, sid }));
        return vec![Reply::with_cancel("Please type the code from your email.")];
    };
    let code = text.trim();

    if let Some(refusal) = rate_limit_refusal(session, &rate_limit::OTP_VERIFY) {
        session.scene = Some(Scene::Login(LoginState::Otp { email, sid }));
        return vec![refusal];
    }
    rate_limiter::increment(&mut session.rate_limits, &rate_limit::OTP_VERIFY);

    match api.authenticate_otp(&email, code, &sid).await {
        Ok(payload) => {
            session.auth = Some(AuthSession {
                access_token: payload.access_token,
                expires_at: payload.expire_at,
                user_id: payload.user.id,
                organization_id: payload.user.organization_id,
                email: payload.user.email.clone(),
            });
            rate_limiter::clear(&mut session.rate_limits, &rate_limit::OTP_REQUEST);
            rate_limiter::clear(&mut session.rate_limits, &rate_limit::OTP_VERIFY);
            vec![Reply::text(format!(
                "Signed in as {}. Use /help to see what you can do.",
                payload.user.email
            ))]
        }
        // A rejected code is a user mistake, not a failure: stay and retry
        Err(ApiError::Api { status, .. }) if status < 500 => {
            session.scene = Some(Scene::Login(LoginState::Otp { email, sid }));
            vec![Reply::with_cancel("That code didn't work. Check your email and try again.")]
        }
        Err(e) => service_failure(session, "OTP verification", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::scenes::testing::MockApi;
    use crate::telegram::scenes::{handle_input, SceneInput};
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_full_login_flow() {
        let api = MockApi::default();
        let mut session = Session::default();

        let replies = enter(&mut session);
        assert!(replies[0].text.contains("email"));
        assert!(matches!(session.scene, Some(Scene::Login(LoginState::Email))));

        let replies = handle_input(&api, &mut session, SceneInput::Text("me@example.com".to_string())).await;
        assert!(replies[0].text.contains("one-time code"));
        assert!(matches!(session.scene, Some(Scene::Login(LoginState::Otp { .. }))));

        let replies = handle_input(&api, &mut session, SceneInput::Text("123456".to_string())).await;
        assert!(replies[0].text.contains("Signed in"));
        assert!(session.scene.is_none());
        assert!(session.token().is_some());
        // Login counters are reset on success
        assert!(session.rate_limits.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_email_reprompts_without_api_call() {
        let api = MockApi::default();
        let mut session = Session::default();
        enter(&mut session);

        let replies = handle_input(&api, &mut session, SceneInput::Text("not-an-email".to_string())).await;
        assert!(replies[0].text.contains("email"));
        assert!(matches!(session.scene, Some(Scene::Login(LoginState::Email))));
        assert_eq!(api.otp_request_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wrong_otp_reprompts() {
        let api = MockApi::default();
        let mut session = Session::default();
        enter(&mut session);
        handle_input(&api, &mut session, SceneInput::Text("me@example.com".to_string())).await;

        let replies = handle_input(&api, &mut session, SceneInput::Text("000000".to_string())).await;
        assert!(replies[0].text.contains("didn't work"));
        assert!(matches!(session.scene, Some(Scene::Login(LoginState::Otp { .. }))));
        assert!(session.auth.is_none());
    }

    #[tokio::test]
    async fn test_otp_attempts_are_rate_limited() {
        let api = MockApi::default();
        let mut session = Session::default();
        enter(&mut session);
        handle_input(&api, &mut session, SceneInput::Text("me@example.com".to_string())).await;

        for _ in 0..rate_limit::OTP_VERIFY.max_attempts {
            handle_input(&api, &mut session, SceneInput::Text("000000".to_string())).await;
        }
        let replies = handle_input(&api, &mut session, SceneInput::Text("123456".to_string())).await;
        assert!(replies[0].text.contains("try again in"));
        // The correct code was never forwarded once the limit was hit
        assert!(session.auth.is_none());
        assert!(matches!(session.scene, Some(Scene::Login(LoginState::Otp { .. }))));
    }

    #[tokio::test]
    async fn test_enter_when_already_signed_in() {
        let mut session = crate::telegram::scenes::testing::authed_session();
        let replies = enter(&mut session);
        assert!(replies[0].text.contains("already signed in"));
        assert!(session.scene.is_none());
    }

    #[tokio::test]
    async fn test_otp_request_failure_aborts_scene() {
        let api = MockApi { fail_all: true, ..MockApi::default() };
        let mut session = Session::default();
        enter(&mut session);

        let replies = handle_input(&api, &mut session, SceneInput::Text("me@example.com".to_string())).await;
        assert!(replies[0].text.contains("went wrong"));
        assert!(session.scene.is_none());
    }
}
