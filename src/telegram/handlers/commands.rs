//! Command endpoint implementations
//!
//! One function per slash command. Each takes the loaded session, talks to
//! the banking API, sends its messages, and leaves the session in the state
//! it should be persisted in (the schema endpoint does the actual save).

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use super::types::{send_replies, HandlerDeps, HandlerResult};
use crate::api::ApiError;
use crate::core::config::display::TRANSFERS_PAGE_SIZE;
use crate::core::rate_limiter;
use crate::session::Session;
use crate::telegram::callback::CallbackAction;
use crate::telegram::commands::Command;
use crate::telegram::scenes::{self, SceneInput};
use crate::telegram::{format, keyboards, Bot};

pub async fn handle_start(bot: &Bot, chat_id: ChatId) -> HandlerResult {
    bot.send_message(chat_id, format::welcome()).await?;
    Ok(())
}

pub async fn handle_help(bot: &Bot, chat_id: ChatId) -> HandlerResult {
    bot.send_message(chat_id, Command::descriptions().to_string()).await?;
    Ok(())
}

pub async fn handle_login(bot: &Bot, chat_id: ChatId, session: &mut Session) -> HandlerResult {
    let replies = scenes::login::enter(session);
    send_replies(bot, chat_id, replies).await
}

pub async fn handle_logout(bot: &Bot, chat_id: ChatId, session: &mut Session) -> HandlerResult {
    let was_signed_in = session.auth.is_some();
    session.auth = None;
    session.scene = None;
    rate_limiter::clear_all(&mut session.rate_limits);

    let text = if was_signed_in {
        "You've been signed out."
    } else {
        "You weren't signed in."
    };
    bot.send_message(chat_id, text).await?;
    Ok(())
}

pub async fn handle_cancel(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    session: &mut Session,
) -> HandlerResult {
    let replies =
        scenes::handle_input(deps.api.as_ref(), session, SceneInput::Action(CallbackAction::Cancel)).await;
    send_replies(bot, chat_id, replies).await
}

pub async fn handle_profile(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    session: &mut Session,
    token: &str,
) -> HandlerResult {
    match deps.api.profile(token).await {
        Ok(profile) => {
            bot.send_message(chat_id, format::profile(&profile)).await?;
        }
        Err(e) => send_api_failure(bot, chat_id, session, "profile", &e).await?,
    }
    Ok(())
}

pub async fn handle_kyc(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    session: &mut Session,
    token: &str,
) -> HandlerResult {
    match deps.api.kyc_status(token).await {
        Ok(page) => {
            bot.send_message(chat_id, format::kyc_status(&page)).await?;
        }
        Err(e) => send_api_failure(bot, chat_id, session, "kyc status", &e).await?,
    }
    Ok(())
}

pub async fn handle_balance(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    session: &mut Session,
    token: &str,
) -> HandlerResult {
    match deps.api.balances(token).await {
        Ok(balances) => {
            bot.send_message(chat_id, format::balances(&balances)).await?;
        }
        Err(e) => send_api_failure(bot, chat_id, session, "balances", &e).await?,
    }
    Ok(())
}

pub async fn handle_wallets(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    session: &mut Session,
    token: &str,
) -> HandlerResult {
    match deps.api.wallets(token).await {
        Ok(wallets) => {
            let mut req = bot.send_message(chat_id, format::wallets_header(&wallets));
            if !wallets.is_empty() {
                req = req.reply_markup(keyboards::wallet_picker(&wallets));
            }
            req.await?;
        }
        Err(e) => send_api_failure(bot, chat_id, session, "wallets", &e).await?,
    }
    Ok(())
}

pub async fn handle_send(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    session: &mut Session,
) -> HandlerResult {
    let replies = scenes::transfer::enter(deps.api.as_ref(), session).await;
    send_replies(bot, chat_id, replies).await
}

pub async fn handle_withdraw(bot: &Bot, chat_id: ChatId, session: &mut Session) -> HandlerResult {
    let replies = scenes::withdraw::enter(session);
    send_replies(bot, chat_id, replies).await
}

pub async fn handle_batch(bot: &Bot, chat_id: ChatId, session: &mut Session) -> HandlerResult {
    let replies = scenes::batch::enter(session);
    send_replies(bot, chat_id, replies).await
}

pub async fn handle_transfers(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    session: &mut Session,
    token: &str,
    page: u32,
) -> HandlerResult {
    match deps.api.transfers(token, page, TRANSFERS_PAGE_SIZE).await {
        Ok(result) => {
            let has_more = result
                .has_more
                .unwrap_or(result.data.len() as u32 >= TRANSFERS_PAGE_SIZE);
            let mut req = bot.send_message(chat_id, format::transfers_page(&result.data, page));
            if let Some(markup) = keyboards::transfers_pager(page, has_more) {
                req = req.reply_markup(markup);
            }
            req.await?;
        }
        Err(e) => send_api_failure(bot, chat_id, session, "transfers", &e).await?,
    }
    Ok(())
}

/// Reports a direct-command API failure, clearing auth on a rejected token.
pub(super) async fn send_api_failure(
    bot: &Bot,
    chat_id: ChatId,
    session: &mut Session,
    context: &str,
    err: &ApiError,
) -> HandlerResult {
    if err.is_unauthorized() {
        session.auth = None;
        log::info!("Token rejected during {context}; cleared auth");
        bot.send_message(chat_id, format::session_expired()).await?;
    } else {
        log::error!("{context} failed: {err}");
        bot.send_message(chat_id, format::generic_failure()).await?;
    }
    Ok(())
}
