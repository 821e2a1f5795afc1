//! Wallet withdrawal scene: address -> amount -> quote -> confirm
//!
//! The network is detected from the address format, never asked. Before
//! confirmation the flow fetches a fee quote; a provider-side refusal in the
//! quote (minimum amount, unsupported route) is shown to the user word for
//! word and re-prompts the amount.

use serde::{Deserialize, Serialize};

use crate::api::types::{PurposeCode, WalletWithdrawRequest, WithdrawQuoteRequest};
use crate::api::BankingApi;
use crate::core::config::rate_limit;
use crate::core::rate_limiter;
use crate::core::validation::{detect_network, validate_amount, Network};
use crate::session::Session;
use crate::telegram::callback::CallbackAction;
use crate::telegram::format;
use crate::telegram::scenes::{
    available_balance, cancel_button, require_token, service_failure, transfer_limit_refusal, Reply,
    Scene, SceneInput, CURRENCY,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum WithdrawState {
    /// Waiting for the destination address
    Address,
    Amount { address: String, network: Network },
    Confirm {
        address: String,
        network: Network,
        amount: String,
        fee: String,
    },
}

/// Starts the withdrawal flow (the /withdraw command).
pub fn enter(session: &mut Session) -> Vec<Reply> {
    if let Err(replies) = require_token(session) {
        return replies;
    }
    session.scene = Some(Scene::Withdraw(WithdrawState::Address));
    vec![Reply::with_cancel(
        "Where should I send the funds? Paste the destination wallet address (EVM or Solana).",
    )]
}

pub(super) async fn handle(
    api: &dyn BankingApi,
    session: &mut Session,
    state: WithdrawState,
    input: SceneInput,
) -> Vec<Reply> {
    match state {
        WithdrawState::Address => handle_address(session, input),
        WithdrawState::Amount { address, network } => {
            handle_amount(api, session, address, network, input).await
        }
        WithdrawState::Confirm { address, network, amount, fee } => {
            handle_confirm(api, session, address, network, amount, fee, input).await
        }
    }
}

fn handle_address(session: &mut Session, input: SceneInput) -> Vec<Reply> {
    let SceneInput::Text(text) = input else {
        session.scene = Some(Scene::Withdraw(WithdrawState::Address));
        return vec![Reply::with_cancel("Please paste the destination wallet address.")];
    };
    let address = text.trim().to_string();

    match detect_network(&address) {
        Ok(network) => {
            session.scene = Some(Scene::Withdraw(WithdrawState::Amount { address, network }));
            vec![Reply::with_cancel(format!(
                "{network} address detected. How much {CURRENCY} do you want to withdraw?"
            ))]
        }
        Err(e) => {
            session.scene = Some(Scene::Withdraw(WithdrawState::Address));
            vec![Reply::with_cancel(e.to_string())]
        }
    }
}

async fn handle_amount(
    api: &dyn BankingApi,
    session: &mut Session,
    address: String,
    network: Network,
    input: SceneInput,
) -> Vec<Reply> {
    let SceneInput::Text(text) = input else {
        session.scene = Some(Scene::Withdraw(WithdrawState::Amount { address, network }));
        return vec![Reply::with_cancel(format!("How much {CURRENCY} do you want to withdraw?"))];
    };
    let amount = match validate_amount(text.trim()) {
        Ok(a) => a.to_string(),
        Err(e) => {
            session.scene = Some(Scene::Withdraw(WithdrawState::Amount { address, network }));
            return vec![Reply::with_cancel(e.to_string())];
        }
    };

    let token = match require_token(session) {
        Ok(t) => t,
        Err(replies) => return replies,
    };
    if let (Some(balance), Ok(requested)) = (available_balance(api, &token).await, amount.parse::<f64>()) {
        if requested > balance {
            session.scene = Some(Scene::Withdraw(WithdrawState::Amount { address, network }));
            return vec![Reply::with_cancel(format!(
                "That's more than your available balance ({balance} {CURRENCY}). Enter a smaller amount."
            ))];
        }
    }

    let quote_req = WithdrawQuoteRequest {
        wallet_address: address.clone(),
        network: network.as_api_str().to_string(),
        amount: amount.clone(),
        currency: CURRENCY.to_string(),
    };
    let quote = match api.withdraw_quote(&token, &quote_req).await {
        Ok(q) => q,
        Err(e) => return service_failure(session, "withdraw quote", &e),
    };

    // Provider refusal: their message is more precise than anything we could
    // write, show it verbatim and let the user adjust the amount
    if let Some(refusal) = quote.error {
        session.scene = Some(Scene::Withdraw(WithdrawState::Amount { address, network }));
        return vec![Reply::with_cancel(refusal)];
    }

    let fee = quote.fee.unwrap_or_else(|| "0".to_string());
    let reply = Reply::with_keyboard(
        format!(
            "Please confirm:\n\nWithdraw {amount} {CURRENCY}\nTo: {address} ({network})\nFee: {fee} {CURRENCY}"
        ),
        vec![vec![
            ("Confirm".to_string(), CallbackAction::Confirm.to_data()),
            cancel_button(),
        ]],
    );
    session.scene = Some(Scene::Withdraw(WithdrawState::Confirm { address, network, amount, fee }));
    vec![reply]
}

async fn handle_confirm(
    api: &dyn BankingApi,
    session: &mut Session,
    address: String,
    network: Network,
    amount: String,
    fee: String,
    input: SceneInput,
) -> Vec<Reply> {
    if !matches!(input, SceneInput::Action(CallbackAction::Confirm)) {
        session.scene = Some(Scene::Withdraw(WithdrawState::Confirm { address, network, amount, fee }));
        return vec![Reply::text("Press Confirm to withdraw, or Cancel to abort.")];
    }

    let token = match require_token(session) {
        Ok(t) => t,
        Err(replies) => return replies,
    };
    if let Some(refusal) = transfer_limit_refusal(session) {
        session.scene = Some(Scene::Withdraw(WithdrawState::Confirm { address, network, amount, fee }));
        return vec![refusal];
    }
    rate_limiter::increment(&mut session.rate_limits, &rate_limit::TRANSFER);

    let req = WalletWithdrawRequest {
        wallet_address: address,
        network: network.as_api_str().to_string(),
        amount,
        purpose_code: PurposeCode::Self_,
        currency: CURRENCY.to_string(),
    };
    match api.wallet_withdraw(&token, &req).await {
        Ok(transfer) => vec![Reply::text(format::transfer_submitted(&transfer))],
        Err(e) => service_failure(session, "wallet withdraw", &e),
    }
}
