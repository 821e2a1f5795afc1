//! Send-to-email scene: recipient -> amount -> purpose -> confirm
//!
//! The recipient step offers saved payees as buttons; a manually typed
//! address gets an optional "save as payee?" detour. The amount step runs a
//! balance pre-check that fails open: an unreadable balance never blocks a
//! transfer, the API is the authority on submission.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::api::types::{CreatePayeeRequest, PurposeCode, SendToEmailRequest};
use crate::api::BankingApi;
use crate::core::config::rate_limit;
use crate::core::rate_limiter;
use crate::core::validation::{validate_amount, validate_email};
use crate::session::Session;
use crate::telegram::callback::CallbackAction;
use crate::telegram::format;
use crate::telegram::scenes::{
    available_balance, cancel_button, require_token, service_failure, transfer_limit_refusal, Reply,
    Scene, SceneInput, CURRENCY,
};

/// A saved payee offered on the recipient keyboard
///
/// The keyboard carries only the list index (callback data is capped at 64
/// bytes), so the list itself rides along in the state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayeeChoice {
    pub email: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum TransferState {
    /// Waiting for a payee pick or a typed email
    Recipient { payees: Vec<PayeeChoice> },
    /// Manual recipient entered; offer to save them
    SavePayee { recipient: String },
    Amount { recipient: String },
    Purpose { recipient: String, amount: String },
    Confirm {
        recipient: String,
        amount: String,
        purpose: PurposeCode,
    },
}

/// Starts the send flow (the /send command).
pub async fn enter(api: &dyn BankingApi, session: &mut Session) -> Vec<Reply> {
    let token = match require_token(session) {
        Ok(t) => t,
        Err(replies) => return replies,
    };

    // Payees are a convenience; an unavailable list degrades to manual entry
    let payees = match api.payees(&token).await {
        Ok(page) => page
            .data
            .into_iter()
            .map(|p| PayeeChoice {
                label: p.nick_name.unwrap_or_else(|| p.email.clone()),
                email: p.email,
            })
            .collect(),
        Err(e) => {
            log::warn!("Payee list unavailable: {e}");
            Vec::new()
        }
    };

    let reply = recipient_prompt(&payees);
    session.scene = Some(Scene::Transfer(TransferState::Recipient { payees }));
    vec![reply]
}

fn recipient_prompt(payees: &[PayeeChoice]) -> Reply {
    let mut keyboard: Vec<Vec<(String, String)>> = payees
        .iter()
        .enumerate()
        .map(|(idx, p)| vec![(p.label.clone(), CallbackAction::Payee(idx).to_data())])
        .collect();
    if !payees.is_empty() {
        keyboard.push(vec![(
            "Type an email instead".to_string(),
            CallbackAction::ManualRecipient.to_data(),
        )]);
    }
    keyboard.push(vec![cancel_button()]);

    let text = if payees.is_empty() {
        "Who do you want to send to? Type their email address.".to_string()
    } else {
        "Who do you want to send to? Pick a saved payee or type an email address.".to_string()
    };
    Reply::with_keyboard(text, keyboard)
}

pub(super) async fn handle(
    api: &dyn BankingApi,
    session: &mut Session,
    state: TransferState,
    input: SceneInput,
) -> Vec<Reply> {
    match state {
        TransferState::Recipient { payees } => handle_recipient(session, payees, input),
        TransferState::SavePayee { recipient } => handle_save_payee(api, session, recipient, input).await,
        TransferState::Amount { recipient } => handle_amount(api, session, recipient, input).await,
        TransferState::Purpose { recipient, amount } => handle_purpose(session, recipient, amount, input),
        TransferState::Confirm { recipient, amount, purpose } => {
            handle_confirm(api, session, recipient, amount, purpose, input).await
        }
    }
}

fn handle_recipient(session: &mut Session, payees: Vec<PayeeChoice>, input: SceneInput) -> Vec<Reply> {
    match input {
        SceneInput::Action(CallbackAction::Payee(idx)) => match payees.get(idx) {
            Some(choice) => {
                let recipient = choice.email.clone();
                session.scene = Some(Scene::Transfer(TransferState::Amount { recipient: recipient.clone() }));
                vec![amount_prompt(&recipient)]
            }
            None => {
                // Stale button from an old message
                let reply = recipient_prompt(&payees);
                session.scene = Some(Scene::Transfer(TransferState::Recipient { payees }));
                vec![reply]
            }
        },
        SceneInput::Action(CallbackAction::ManualRecipient) => {
            session.scene = Some(Scene::Transfer(TransferState::Recipient { payees }));
            vec![Reply::with_cancel("Type the recipient's email address.")]
        }
        SceneInput::Text(text) => {
            let email = text.trim().to_string();
            if let Err(e) = validate_email(&email) {
                let reply = Reply::with_cancel(e.to_string());
                session.scene = Some(Scene::Transfer(TransferState::Recipient { payees }));
                return vec![reply];
            }
            if payees.iter().any(|p| p.email.eq_ignore_ascii_case(&email)) {
                session.scene = Some(Scene::Transfer(TransferState::Amount { recipient: email.clone() }));
                return vec![amount_prompt(&email)];
            }
            let reply = Reply::with_keyboard(
                format!("Save {email} as a payee for next time?"),
                vec![
                    vec![
                        ("Yes".to_string(), CallbackAction::SavePayee(true).to_data()),
                        ("No".to_string(), CallbackAction::SavePayee(false).to_data()),
                    ],
                    vec![cancel_button()],
                ],
            );
            session.scene = Some(Scene::Transfer(TransferState::SavePayee { recipient: email }));
            vec![reply]
        }
        SceneInput::Action(_) => {
            let reply = recipient_prompt(&payees);
            session.scene = Some(Scene::Transfer(TransferState::Recipient { payees }));
            vec![reply]
        }
    }
}

async fn handle_save_payee(
    api: &dyn BankingApi,
    session: &mut Session,
    recipient: String,
    input: SceneInput,
) -> Vec<Reply> {
    match input {
        SceneInput::Action(CallbackAction::SavePayee(save)) => {
            let mut replies = Vec::new();
            if save {
                // Saving is best-effort; a failure must not derail the transfer
                if let Ok(token) = require_token(session) {
                    let nick = recipient.split('@').next().unwrap_or(&recipient).to_string();
                    let req = CreatePayeeRequest { email: recipient.clone(), nick_name: nick };
                    match api.create_payee(&token, &req).await {
                        Ok(_) => replies.push(Reply::text("Saved.")),
                        Err(e) => {
                            log::warn!("Failed to save payee: {e}");
                            replies.push(Reply::text("Couldn't save the payee, continuing anyway."));
                        }
                    }
                }
            }
            replies.push(amount_prompt(&recipient));
            session.scene = Some(Scene::Transfer(TransferState::Amount { recipient }));
            replies
        }
        _ => {
            session.scene = Some(Scene::Transfer(TransferState::SavePayee { recipient }));
            vec![Reply::text("Please answer with the buttons above, or press Cancel.")]
        }
    }
}

fn amount_prompt(recipient: &str) -> Reply {
    Reply::with_cancel(format!("How much {CURRENCY} do you want to send to {recipient}?"))
}

async fn handle_amount(
    api: &dyn BankingApi,
    session: &mut Session,
    recipient: String,
    input: SceneInput,
) -> Vec<Reply> {
    let SceneInput::Text(text) = input else {
        let reply = amount_prompt(&recipient);
        session.scene = Some(Scene::Transfer(TransferState::Amount { recipient }));
        return vec![reply];
    };
    let amount = match validate_amount(text.trim()) {
        Ok(a) => a.to_string(),
        Err(e) => {
            session.scene = Some(Scene::Transfer(TransferState::Amount { recipient }));
            return vec![Reply::with_cancel(e.to_string())];
        }
    };

    let token = match require_token(session) {
        Ok(t) => t,
        Err(replies) => return replies,
    };
    if let (Some(balance), Ok(requested)) = (available_balance(api, &token).await, amount.parse::<f64>()) {
        if requested > balance {
            session.scene = Some(Scene::Transfer(TransferState::Amount { recipient }));
            return vec![Reply::with_cancel(format!(
                "That's more than your available balance ({balance} {CURRENCY}). Enter a smaller amount."
            ))];
        }
    }

    let reply = purpose_prompt();
    session.scene = Some(Scene::Transfer(TransferState::Purpose { recipient, amount }));
    vec![reply]
}

fn purpose_prompt() -> Reply {
    let mut keyboard: Vec<Vec<(String, String)>> = PurposeCode::iter()
        .map(|code| vec![(code.label().to_string(), CallbackAction::Purpose(code).to_data())])
        .collect();
    keyboard.push(vec![cancel_button()]);
    Reply::with_keyboard("What's the purpose of this transfer?", keyboard)
}

fn handle_purpose(session: &mut Session, recipient: String, amount: String, input: SceneInput) -> Vec<Reply> {
    match input {
        SceneInput::Action(CallbackAction::Purpose(purpose)) => {
            let reply = Reply::with_keyboard(
                format!(
                    "Please confirm:\n\nSend {amount} {CURRENCY} to {recipient}\nPurpose: {}",
                    purpose.label()
                ),
                vec![vec![
                    ("Confirm".to_string(), CallbackAction::Confirm.to_data()),
                    cancel_button(),
                ]],
            );
            session.scene = Some(Scene::Transfer(TransferState::Confirm { recipient, amount, purpose }));
            vec![reply]
        }
        _ => {
            session.scene = Some(Scene::Transfer(TransferState::Purpose { recipient, amount }));
            vec![purpose_prompt()]
        }
    }
}

async fn handle_confirm(
    api: &dyn BankingApi,
    session: &mut Session,
    recipient: String,
    amount: String,
    purpose: PurposeCode,
    input: SceneInput,
) -> Vec<Reply> {
    if !matches!(input, SceneInput::Action(CallbackAction::Confirm)) {
        session.scene = Some(Scene::Transfer(TransferState::Confirm { recipient, amount, purpose }));
        return vec![Reply::text("Press Confirm to send, or Cancel to abort.")];
    }

    let token = match require_token(session) {
        Ok(t) => t,
        Err(replies) => return replies,
    };
    if let Some(refusal) = transfer_limit_refusal(session) {
        session.scene = Some(Scene::Transfer(TransferState::Confirm { recipient, amount, purpose }));
        return vec![refusal];
    }
    rate_limiter::increment(&mut session.rate_limits, &rate_limit::TRANSFER);

    let req = SendToEmailRequest {
        email: recipient,
        amount,
        purpose_code: purpose,
        currency: CURRENCY.to_string(),
    };
    match api.send_to_email(&token, &req).await {
        Ok(transfer) => vec![Reply::text(format::transfer_submitted(&transfer))],
        Err(e) => service_failure(session, "send to email", &e),
    }
}
