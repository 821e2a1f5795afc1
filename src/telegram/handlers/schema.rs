//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::commands::{
    handle_balance, handle_batch, handle_cancel, handle_help, handle_kyc, handle_login, handle_logout,
    handle_profile, handle_send, handle_start, handle_transfers, handle_wallets, handle_withdraw,
    send_api_failure,
};
use super::types::{send_replies, HandlerDeps, HandlerError};
use crate::session::session_key;
use crate::telegram::callback::CallbackAction;
use crate::telegram::commands::{is_protected_command, Command};
use crate::telegram::scenes::{self, Reply, SceneInput};
use crate::telegram::{format, Bot};

/// Creates the main dispatcher schema for the Telegram bot.
///
/// The same handler tree is used in production and in integration tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_callbacks = deps;

    dptree::entry()
        // Commands first so "/send" never reaches the free-text handler
        .branch(command_handler(deps_commands))
        // Free text feeds the active scene
        .branch(message_handler(deps_messages))
        // Inline button presses
        .branch(callback_handler(deps_callbacks))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command: {:?} from chat {}", cmd, msg.chat.id);

                let Some(key) = session_key(msg.from.as_ref().map(|u| u.id.0), Some(msg.chat.id.0)) else {
                    log::warn!("Command without an attributable sender; ignoring");
                    return Ok(());
                };
                let mut session = deps.load_session(&key).await;

                // Auth gate: protected commands never dispatch without a
                // valid token, and a stale token is cleared on the spot
                if is_protected_command(&cmd) && session.token().is_none() {
                    let text = if session.auth.take().is_some() {
                        format::session_expired()
                    } else {
                        format::auth_required()
                    };
                    bot.send_message(msg.chat.id, text).await?;
                    deps.save_session(&key, &session).await;
                    return Ok(());
                }
                let token = session.token().map(str::to_string).unwrap_or_default();

                let result = match cmd {
                    Command::Start => handle_start(&bot, msg.chat.id).await,
                    Command::Help => handle_help(&bot, msg.chat.id).await,
                    Command::Login => handle_login(&bot, msg.chat.id, &mut session).await,
                    Command::Logout => handle_logout(&bot, msg.chat.id, &mut session).await,
                    Command::Cancel => handle_cancel(&bot, msg.chat.id, &deps, &mut session).await,
                    Command::Profile => {
                        handle_profile(&bot, msg.chat.id, &deps, &mut session, &token).await
                    }
                    Command::Kyc => handle_kyc(&bot, msg.chat.id, &deps, &mut session, &token).await,
                    Command::Balance => {
                        handle_balance(&bot, msg.chat.id, &deps, &mut session, &token).await
                    }
                    Command::Wallets => {
                        handle_wallets(&bot, msg.chat.id, &deps, &mut session, &token).await
                    }
                    Command::Send => handle_send(&bot, msg.chat.id, &deps, &mut session).await,
                    Command::Withdraw => handle_withdraw(&bot, msg.chat.id, &mut session).await,
                    Command::Batch => handle_batch(&bot, msg.chat.id, &mut session).await,
                    Command::Transfers => {
                        handle_transfers(&bot, msg.chat.id, &deps, &mut session, &token, 1).await
                    }
                };

                deps.save_session(&key, &session).await;
                result
            }
        },
    ))
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let text = msg.text().unwrap_or_default().to_string();
                let Some(key) = session_key(msg.from.as_ref().map(|u| u.id.0), Some(msg.chat.id.0)) else {
                    return Ok(());
                };
                let mut session = deps.load_session(&key).await;

                let replies = if session.scene.is_some() {
                    scenes::handle_input(deps.api.as_ref(), &mut session, SceneInput::Text(text)).await
                } else {
                    vec![Reply::text(format::unknown_input())]
                };
                send_replies(&bot, msg.chat.id, replies).await?;

                deps.save_session(&key, &session).await;
                Ok(())
            }
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            // Acknowledge first so the button never spins, even on refusal
            bot.answer_callback_query(q.id.clone()).await?;

            let Some(action) = q.data.as_deref().and_then(CallbackAction::parse) else {
                log::debug!("Ignoring unknown callback data: {:?}", q.data);
                return Ok(());
            };
            let Some(chat_id) = q.message.as_ref().map(|m| m.chat().id) else {
                return Ok(());
            };
            let Some(key) = session_key(Some(q.from.id.0), Some(chat_id.0)) else {
                return Ok(());
            };
            let mut session = deps.load_session(&key).await;

            if action.is_protected() && session.token().is_none() {
                session.auth = None;
                session.scene = None;
                bot.send_message(chat_id, format::auth_required()).await?;
                deps.save_session(&key, &session).await;
                return Ok(());
            }
            let token = session.token().map(str::to_string).unwrap_or_default();

            match action {
                CallbackAction::DefaultWallet(wallet_id) => {
                    match deps.api.set_default_wallet(&token, &wallet_id).await {
                        Ok(wallet) => {
                            bot.send_message(chat_id, format!("{} is now your default wallet.", wallet.network))
                                .await?;
                        }
                        Err(e) => {
                            send_api_failure(&bot, chat_id, &mut session, "set default wallet", &e).await?;
                        }
                    }
                }
                CallbackAction::TransfersPage(page) => {
                    handle_transfers(&bot, chat_id, &deps, &mut session, &token, page).await?;
                }
                // Everything else belongs to the active scene
                scene_action => {
                    let replies =
                        scenes::handle_input(deps.api.as_ref(), &mut session, SceneInput::Action(scene_action))
                            .await;
                    send_replies(&bot, chat_id, replies).await?;
                }
            }

            deps.save_session(&key, &session).await;
            Ok(())
        }
    })
}
