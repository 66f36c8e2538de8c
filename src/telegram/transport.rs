//! Outbound chat operations used by the relay.
//!
//! The relay only talks to Telegram through [`ChatTransport`], which keeps
//! the delivery logic testable with a recording fake.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, InputMedia, InputMediaPhoto, InputMediaVideo, MessageId,
};

use crate::core::error::AppResult;
use crate::core::metrics;
use crate::extract::{InstagramLink, MediaItem, MediaKind};
use crate::telegram::messages;

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends a text message, optionally with a "Try again" button for `retry`.
    async fn send_text(&self, chat_id: ChatId, text: &str, retry: Option<&InstagramLink>) -> AppResult<MessageId>;

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> AppResult<()>;

    /// Sends one photo or video by URL.
    async fn send_media(&self, chat_id: ChatId, item: &MediaItem) -> AppResult<()>;

    /// Sends 2..=10 items as one album.
    async fn send_album(&self, chat_id: ChatId, items: &[MediaItem]) -> AppResult<()>;
}

/// Inline keyboard with a single "Try again" button for `link`.
pub fn retry_keyboard(link: &InstagramLink) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        messages::RETRY_BUTTON,
        link.callback_data(),
    )]])
}

fn input_media(item: &MediaItem) -> InputMedia {
    let file = InputFile::url(item.source_url.clone());
    match item.kind {
        MediaKind::Image => InputMedia::Photo(InputMediaPhoto::new(file)),
        MediaKind::Video => InputMedia::Video(InputMediaVideo::new(file)),
    }
}

/// [`ChatTransport`] backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, chat_id: ChatId, text: &str, retry: Option<&InstagramLink>) -> AppResult<MessageId> {
        let request = self.bot.send_message(chat_id, text);
        let sent = match retry {
            Some(link) => request.reply_markup(retry_keyboard(link)).await,
            None => request.await,
        };

        match sent {
            Ok(message) => Ok(message.id),
            Err(e) => {
                metrics::record_send_failure("text");
                Err(e.into())
            }
        }
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> AppResult<()> {
        self.bot.delete_message(chat_id, message_id).await?;
        Ok(())
    }

    async fn send_media(&self, chat_id: ChatId, item: &MediaItem) -> AppResult<()> {
        let file = InputFile::url(item.source_url.clone());
        let result = match item.kind {
            MediaKind::Image => self.bot.send_photo(chat_id, file).await.map(|_| ()),
            MediaKind::Video => self.bot.send_video(chat_id, file).await.map(|_| ()),
        };

        if let Err(ref e) = result {
            let operation = if item.is_video() { "video" } else { "photo" };
            metrics::record_send_failure(operation);
            log::warn!("Failed to send {} to chat {}: {}", operation, chat_id, e);
        }
        Ok(result?)
    }

    async fn send_album(&self, chat_id: ChatId, items: &[MediaItem]) -> AppResult<()> {
        let media_group: Vec<InputMedia> = items.iter().map(input_media).collect();
        match self.bot.send_media_group(chat_id, media_group).await {
            Ok(_) => Ok(()),
            Err(e) => {
                metrics::record_send_failure("album");
                log::warn!("Failed to send album of {} items to chat {}: {}", items.len(), chat_id, e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::link::parse_instagram_link;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn test_retry_keyboard_carries_callback_data() {
        let link = parse_instagram_link("https://www.instagram.com/reel/ABC123/").unwrap();
        let keyboard = retry_keyboard(&link);

        assert_eq!(keyboard.inline_keyboard.len(), 1);
        let button = &keyboard.inline_keyboard[0][0];
        assert_eq!(button.text, messages::RETRY_BUTTON);
        match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => assert_eq!(data, "retry:reel:ABC123"),
            other => panic!("unexpected button kind: {:?}", other),
        }
    }
}
