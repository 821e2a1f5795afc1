//! Bot construction and command registration

use reqwest::ClientBuilder;
use teloxide::prelude::Requester;
use teloxide::utils::command::BotCommands;

use crate::core::config;
use crate::telegram::commands::Command;
use crate::telegram::Bot;

/// Creates the bot instance with a request timeout on the HTTP client.
pub fn create_bot() -> anyhow::Result<Bot> {
    if config::BOT_TOKEN.is_empty() {
        anyhow::bail!("BOT_TOKEN (or TELOXIDE_TOKEN) is not set");
    }
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    Ok(Bot::with_client(config::BOT_TOKEN.clone(), client))
}

/// Registers the command list shown in the Telegram UI.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}
