//! Direct-message relay: placeholder, extraction, delivery.

use teloxide::types::ChatId;

use crate::core::error::{AppError, AppResult};
use crate::extract::{InstagramLink, MediaItem};
use crate::relay::service::{RelayService, RequestSource};
use crate::telegram::messages;
use crate::telegram::transport::ChatTransport;

/// Telegram accepts at most 10 items per album.
pub const MAX_ALBUM_SIZE: usize = 10;

/// Outcome of delivering a post's media to a chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Items that reached the chat
    pub sent: usize,
    /// Items that could not be sent
    pub failed: usize,
}

impl DeliveryReport {
    fn merge(&mut self, other: DeliveryReport) {
        self.sent += other.sent;
        self.failed += other.failed;
    }
}

/// Handles a text message from `user` in `chat_id` that may contain a link.
///
/// Every failure is reported to the chat before it is returned; the returned
/// error is only for logging.
pub async fn relay_text(
    service: &RelayService,
    transport: &dyn ChatTransport,
    chat_id: ChatId,
    user: ChatId,
    text: &str,
) -> AppResult<DeliveryReport> {
    let link = match service.admit(user, text, RequestSource::Direct).await {
        Ok(link) => link,
        Err(e) => {
            report_failure(transport, chat_id, &e, None).await;
            return Err(e);
        }
    };

    relay_admitted(service, transport, chat_id, &link).await
}

/// Re-runs the relay for a link from a "Try again" button press.
pub async fn relay_retry(
    service: &RelayService,
    transport: &dyn ChatTransport,
    chat_id: ChatId,
    user: ChatId,
    link: &InstagramLink,
) -> AppResult<DeliveryReport> {
    if let Err(e) = service.admit_link(user, link, RequestSource::Callback).await {
        report_failure(transport, chat_id, &e, None).await;
        return Err(e);
    }

    relay_admitted(service, transport, chat_id, link).await
}

/// Runs an admitted relay while holding a queue slot.
pub async fn relay_admitted(
    service: &RelayService,
    transport: &dyn ChatTransport,
    chat_id: ChatId,
    link: &InstagramLink,
) -> AppResult<DeliveryReport> {
    let _slot = service.slot().await?;

    let placeholder = match transport.send_text(chat_id, messages::PROCESSING, None).await {
        Ok(id) => Some(id),
        Err(e) => {
            log::warn!("Failed to send processing message to {}: {}", chat_id, e);
            None
        }
    };

    let fetched = service.fetch(link).await;

    if let Some(message_id) = placeholder {
        if let Err(e) = transport.delete_message(chat_id, message_id).await {
            log::debug!("Failed to delete processing message in {}: {}", chat_id, e);
        }
    }

    let items = match fetched {
        Ok(items) => items,
        Err(e) => {
            log::warn!("Relay of {} to {} failed: {}", link, chat_id, e);
            report_failure(transport, chat_id, &e, Some(link)).await;
            return Err(e);
        }
    };

    let report = deliver(transport, chat_id, &items).await;
    log::info!(
        "Relayed {} to {}: {} sent, {} failed",
        link,
        chat_id,
        report.sent,
        report.failed
    );

    if report.sent == 0 {
        if let Err(e) = transport
            .send_text(chat_id, messages::GENERIC_ERROR, Some(link))
            .await
        {
            log::error!("Failed to report undelivered media to {}: {}", chat_id, e);
        }
    }

    Ok(report)
}

/// Sends `items` to the chat: one item as a single message, several as albums
/// of at most [`MAX_ALBUM_SIZE`]. A failed album is retried item by item.
pub async fn deliver(transport: &dyn ChatTransport, chat_id: ChatId, items: &[MediaItem]) -> DeliveryReport {
    let mut report = DeliveryReport::default();

    for chunk in items.chunks(MAX_ALBUM_SIZE) {
        if chunk.len() == 1 {
            report.merge(send_individually(transport, chat_id, chunk).await);
            continue;
        }

        match transport.send_album(chat_id, chunk).await {
            Ok(()) => report.sent += chunk.len(),
            Err(e) => {
                log::warn!("Album send to {} failed ({}), falling back to single sends", chat_id, e);
                report.merge(send_individually(transport, chat_id, chunk).await);
            }
        }
    }

    report
}

async fn send_individually(transport: &dyn ChatTransport, chat_id: ChatId, items: &[MediaItem]) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    for item in items {
        match transport.send_media(chat_id, item).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                log::warn!("Failed to send {} to {}: {}", item.source_url, chat_id, e);
                report.failed += 1;
            }
        }
    }
    report
}

async fn report_failure(
    transport: &dyn ChatTransport,
    chat_id: ChatId,
    error: &AppError,
    link: Option<&InstagramLink>,
) {
    let retry = link.filter(|_| error.is_retryable());
    if let Err(e) = transport.send_text(chat_id, &error.user_message(), retry).await {
        log::error!("Failed to report error to {}: {}", chat_id, e);
    }
}
