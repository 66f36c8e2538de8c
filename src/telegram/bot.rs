//! Bot initialization
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation (token, proxy, custom Bot API server)
//! - Command registration in the Telegram UI

use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "how to use the bot")]
    Start,
    #[command(description = "show usage instructions")]
    Help,
}

/// Creates a Bot instance from the configured token
///
/// Honors `PROXY_URL` for the Telegram HTTP client and `BOT_API_URL` for a
/// self-hosted Bot API server.
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Missing token, invalid URL or proxy
pub fn create_bot() -> anyhow::Result<Bot> {
    let token = config::BOT_TOKEN
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Bot token is not set (TELEGRAM_API, BOT_TOKEN or TELOXIDE_TOKEN)"))?;

    let mut client_builder = ClientBuilder::new().timeout(config::network::telegram_timeout());
    if let Some(ref proxy_url) = *config::PROXY_URL {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| anyhow::anyhow!("Invalid PROXY_URL: {}", e))?;
        log::info!("Using proxy for Telegram Bot API");
        client_builder = client_builder.proxy(proxy);
    }

    let bot = Bot::with_client(token.expose_secret(), client_builder.build()?);

    let bot = if let Some(ref bot_api_url) = *config::BOT_API_URL {
        log::info!("Using custom Bot API URL: {}", bot_api_url);
        let url = url::Url::parse(bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
        bot.set_api_url(url)
    } else {
        bot
    };

    Ok(bot)
}

/// Sets up bot commands in Telegram UI
///
/// # Returns
/// * `Ok(())` - Commands set successfully
/// * `Err(RequestError)` - Failed to set commands
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}
