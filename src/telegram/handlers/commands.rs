//! Command handlers

use teloxide::prelude::*;
use teloxide::types::Message;

use super::types::{HandlerDeps, HandlerError};
use crate::telegram::messages;

/// `/start` and `/help`: usage instructions.
pub(super) async fn handle_start_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    bot.send_message(msg.chat.id, messages::start(deps.bot_username.as_deref()))
        .await?;
    Ok(())
}
