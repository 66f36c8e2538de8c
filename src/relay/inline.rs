//! Inline-query relay: maps extraction results to inline results.

use mime::Mime;
use once_cell::sync::Lazy;
use teloxide::types::{
    ChatId, InlineQueryResult, InlineQueryResultArticle, InlineQueryResultPhoto, InlineQueryResultVideo,
    InputMessageContent, InputMessageContentText,
};

use crate::core::config;
use crate::core::error::AppError;
use crate::extract::{ExtractError, MediaItem, MediaKind};
use crate::relay::service::{RelayService, RequestSource};
use crate::telegram::messages;

/// Inline video results point at MP4 files served by the CDN.
static VIDEO_MP4: Lazy<Mime> = Lazy::new(|| "video/mp4".parse().expect("Failed to parse video/mp4 MIME type"));

/// Builds the answer to an inline query from `user`.
///
/// Never fails: every error becomes an informational article.
pub async fn inline_results(service: &RelayService, user: ChatId, query: &str) -> Vec<InlineQueryResult> {
    let query = query.trim();
    if query.is_empty() {
        return vec![info_article("help", messages::inline::HELP_TITLE, messages::inline::HELP_TEXT)];
    }

    let link = match service.admit(user, query, RequestSource::Inline).await {
        Ok(link) => link,
        Err(e) => return vec![error_article(&e)],
    };

    let fetched = match service.slot().await {
        Ok(_slot) => service.fetch(&link).await,
        Err(e) => Err(e),
    };

    match fetched {
        Ok(items) => {
            log::info!("Inline query from {} resolved {} item(s) for {}", user, items.len(), link);
            media_results(&items)
        }
        Err(e) => {
            log::warn!("Inline query from {} for {} failed: {}", user, link, e);
            vec![error_article(&e)]
        }
    }
}

/// Maps media items to photo/video inline results, up to the Telegram limit.
pub fn media_results(items: &[MediaItem]) -> Vec<InlineQueryResult> {
    items
        .iter()
        .take(config::inline::MAX_RESULTS)
        .enumerate()
        .map(|(index, item)| match item.kind {
            MediaKind::Image => InlineQueryResult::Photo(
                InlineQueryResultPhoto::new(
                    format!("photo_{}", index),
                    item.source_url.clone(),
                    item.thumbnail_url().clone(),
                )
                .caption(messages::inline::PHOTO_CAPTION),
            ),
            MediaKind::Video => InlineQueryResult::Video(InlineQueryResultVideo::new(
                format!("video_{}", index),
                item.source_url.clone(),
                VIDEO_MP4.clone(),
                item.thumbnail_url().clone(),
                messages::inline::VIDEO_TITLE,
            )),
        })
        .collect()
}

/// A text article shown when there is no media to offer.
pub fn info_article(id: &str, title: &str, text: &str) -> InlineQueryResult {
    InlineQueryResult::Article(
        InlineQueryResultArticle::new(
            id,
            title,
            InputMessageContent::Text(InputMessageContentText::new(text)),
        )
        .description(text),
    )
}

fn error_article(error: &AppError) -> InlineQueryResult {
    use messages::inline::*;

    match error {
        AppError::Extract(ExtractError::InvalidLink(_)) => info_article("invalid", INVALID_TITLE, INVALID_TEXT),
        AppError::Extract(ExtractError::EmptyResult) => info_article("not_found", NOT_FOUND_TITLE, NOT_FOUND_TEXT),
        AppError::RateLimited { .. } => info_article("rate_limited", RATE_LIMITED_TITLE, &error.user_message()),
        _ => info_article("error", ERROR_TITLE, ERROR_TEXT),
    }
}
