//! Batch send scene: one message of `email,amount` lines -> confirm
//!
//! The whole recipient list arrives in a single message. Every line must
//! validate before anything is sent; one bad line re-prompts with its line
//! number. Submission is all-at-once through the batch endpoint, and the
//! result is reported per recipient.

use serde::{Deserialize, Serialize};

use crate::api::types::{BatchSendItem, BatchSendRequest, PurposeCode, SendToEmailRequest};
use crate::api::BankingApi;
use crate::core::config::display::BATCH_MAX_RECIPIENTS;
use crate::core::config::rate_limit;
use crate::core::rate_limiter;
use crate::core::validation::parse_batch_line;
use crate::session::Session;
use crate::telegram::callback::CallbackAction;
use crate::telegram::scenes::{
    cancel_button, require_token, service_failure, transfer_limit_refusal, Reply, Scene, SceneInput,
    CURRENCY,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchItem {
    pub email: String,
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum BatchState {
    /// Waiting for the recipient list message
    Entries,
    Confirm { items: Vec<BatchItem> },
}

/// Starts the batch flow (the /batch command).
pub fn enter(session: &mut Session) -> Vec<Reply> {
    if let Err(replies) = require_token(session) {
        return replies;
    }
    session.scene = Some(Scene::Batch(BatchState::Entries));
    vec![Reply::with_cancel(format!(
        "Send me one message with up to {BATCH_MAX_RECIPIENTS} lines, one recipient per line:\n\n\
         email,amount\n\nFor example:\nalice@example.com,10\nbob@example.com,2.50"
    ))]
}

pub(super) async fn handle(
    api: &dyn BankingApi,
    session: &mut Session,
    state: BatchState,
    input: SceneInput,
) -> Vec<Reply> {
    match state {
        BatchState::Entries => handle_entries(session, input),
        BatchState::Confirm { items } => handle_confirm(api, session, items, input).await,
    }
}

fn handle_entries(session: &mut Session, input: SceneInput) -> Vec<Reply> {
    let SceneInput::Text(text) = input else {
        session.scene = Some(Scene::Batch(BatchState::Entries));
        return vec![Reply::with_cancel("Please send the recipient list as a message.")];
    };

    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        session.scene = Some(Scene::Batch(BatchState::Entries));
        return vec![Reply::with_cancel("I couldn't find any `email,amount` lines in that message.")];
    }
    if lines.len() > BATCH_MAX_RECIPIENTS {
        session.scene = Some(Scene::Batch(BatchState::Entries));
        return vec![Reply::with_cancel(format!(
            "That's {} recipients; the maximum per batch is {BATCH_MAX_RECIPIENTS}.",
            lines.len()
        ))];
    }

    let mut items = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        match parse_batch_line(line, idx + 1) {
            Ok((email, amount)) => items.push(BatchItem { email, amount }),
            Err(e) => {
                session.scene = Some(Scene::Batch(BatchState::Entries));
                return vec![Reply::with_cancel(format!("{e}\n\nFix the list and send it again."))];
            }
        }
    }

    let total: f64 = items.iter().filter_map(|i| i.amount.parse::<f64>().ok()).sum();
    let mut summary = format!("Please confirm {} transfers:\n", items.len());
    for item in &items {
        summary.push_str(&format!("\n{}  {} {CURRENCY}", item.email, item.amount));
    }
    summary.push_str(&format!("\n\nTotal: {total} {CURRENCY}"));

    let reply = Reply::with_keyboard(
        summary,
        vec![vec![
            ("Confirm".to_string(), CallbackAction::Confirm.to_data()),
            cancel_button(),
        ]],
    );
    session.scene = Some(Scene::Batch(BatchState::Confirm { items }));
    vec![reply]
}

async fn handle_confirm(
    api: &dyn BankingApi,
    session: &mut Session,
    items: Vec<BatchItem>,
    input: SceneInput,
) -> Vec<Reply> {
    if !matches!(input, SceneInput::Action(CallbackAction::Confirm)) {
        session.scene = Some(Scene::Batch(BatchState::Confirm { items }));
        return vec![Reply::text("Press Confirm to send the batch, or Cancel to abort.")];
    }

    let token = match require_token(session) {
        Ok(t) => t,
        Err(replies) => return replies,
    };
    if let Some(refusal) = transfer_limit_refusal(session) {
        session.scene = Some(Scene::Batch(BatchState::Confirm { items }));
        return vec![refusal];
    }
    rate_limiter::increment(&mut session.rate_limits, &rate_limit::TRANSFER);

    let req = BatchSendRequest {
        requests: items
            .iter()
            .enumerate()
            .map(|(idx, item)| BatchSendItem {
                request_id: idx.to_string(),
                request: SendToEmailRequest {
                    email: item.email.clone(),
                    amount: item.amount.clone(),
                    purpose_code: PurposeCode::Self_,
                    currency: CURRENCY.to_string(),
                },
            })
            .collect(),
    };

    match api.send_batch(&token, &req).await {
        Ok(response) => {
            let mut sent = 0;
            let mut failed: Vec<&str> = Vec::new();
            for result in &response.responses {
                if result.succeeded() {
                    sent += 1;
                } else if let Some(item) = result
                    .request_id
                    .parse::<usize>()
                    .ok()
                    .and_then(|idx| items.get(idx))
                {
                    failed.push(&item.email);
                }
            }
            let mut text = format!("Batch complete: {sent} of {} sent.", items.len());
            if !failed.is_empty() {
                text.push_str("\n\nFailed:");
                for email in failed {
                    text.push_str(&format!("\n{email}"));
                }
            }
            vec![Reply::text(text)]
        }
        Err(e) => service_failure(session, "batch send", &e),
    }
}
