//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{ChatKind, Message};

use super::commands::handle_start_command;
use super::types::{HandlerDeps, HandlerError};
use crate::core::config;
use crate::extract::link::mentions_instagram;
use crate::extract::InstagramLink;
use crate::relay::{inline_results, relay_retry, relay_text};
use crate::telegram::bot::Command;
use crate::telegram::messages;
use crate::telegram::transport::TelegramTransport;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// # Arguments
/// * `deps` - Handler dependencies (relay service, bot username)
///
/// # Returns
/// The complete handler tree for the bot
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_inline = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(message_handler(deps_messages))
        .branch(inline_query_handler(deps_inline))
        .branch(callback_handler(deps_callback))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command: {:?} from chat {}", cmd, msg.chat.id);

                match cmd {
                    Command::Start | Command::Help => {
                        handle_start_command(&bot, &msg, &deps).await?;
                    }
                }
                Ok(())
            }
        },
    ))
}

/// Text messages: relays Instagram links, hints in private chats, ignores the rest.
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let text = msg.text().unwrap_or_default();
                let is_private = matches!(msg.chat.kind, ChatKind::Private(_));

                if !mentions_instagram(text) {
                    if is_private {
                        bot.send_message(msg.chat.id, messages::NO_LINK_HINT).await?;
                    }
                    return Ok(());
                }

                let user = msg.from.as_ref().map(|u| ChatId::from(u.id)).unwrap_or(msg.chat.id);
                let transport = TelegramTransport::new(bot);

                if let Err(e) = relay_text(&deps.service, &transport, msg.chat.id, user, text).await {
                    log::info!("Direct relay for chat {} ended with {}: {}", msg.chat.id, e.category(), e);
                }
                Ok(())
            }
        })
}

fn inline_query_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_inline_query().endpoint(move |bot: Bot, q: InlineQuery| {
        let deps = deps.clone();
        async move {
            let user = ChatId::from(q.from.id);
            let results = inline_results(&deps.service, user, &q.query).await;

            bot.answer_inline_query(q.id.clone(), results)
                .cache_time(config::inline::CACHE_TIME_SECS)
                .is_personal(true)
                .await?;
            Ok(())
        }
    })
}

/// "Try again" button presses (`retry:<kind>:<shortcode>`).
fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            bot.answer_callback_query(q.id.clone()).await?;

            let Some(link) = q.data.as_deref().and_then(InstagramLink::from_callback_data) else {
                log::debug!("Ignoring callback with unknown data: {:?}", q.data);
                return Ok(());
            };
            let Some(chat_id) = q.message.as_ref().map(|m| m.chat().id) else {
                return Ok(());
            };

            let user = ChatId::from(q.from.id);
            let transport = TelegramTransport::new(bot);
            if let Err(e) = relay_retry(&deps.service, &transport, chat_id, user, &link).await {
                log::info!("Retry relay for chat {} ended with {}: {}", chat_id, e.category(), e);
            }
            Ok(())
        }
    })
}
