//! Test doubles shared by the integration tests
//!
//! - `CountingExtractor` - scripted extraction backend that counts outbound calls
//! - `RecordingTransport` - `ChatTransport` that records everything the relay sends

#![allow(dead_code)]

use async_trait::async_trait;
use igrelay::core::error::{AppError, AppResult};
use igrelay::extract::{ExtractError, InstagramLink, MediaItem, MediaKind};
use igrelay::telegram::ChatTransport;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use teloxide::types::{ChatId, MessageId};
use url::Url;

/// Builds `count` image items with distinct CDN URLs.
pub fn images(count: usize) -> Vec<MediaItem> {
    (0..count)
        .map(|i| MediaItem::image(Url::parse(&format!("https://cdn.example.com/{}.jpg", i)).unwrap()))
        .collect()
}

pub fn video(name: &str) -> MediaItem {
    MediaItem::video(Url::parse(&format!("https://cdn.example.com/{}.mp4", name)).unwrap())
}

/// Extraction backend returning a fixed result.
///
/// Tracks the number of calls and the peak number of concurrent calls.
pub struct CountingExtractor {
    result: Result<Vec<MediaItem>, ExtractError>,
    delay: Duration,
    calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl CountingExtractor {
    pub fn returning(items: Vec<MediaItem>) -> Self {
        Self::with_result(Ok(items))
    }

    pub fn failing(error: ExtractError) -> Self {
        Self::with_result(Err(error))
    }

    fn with_result(result: Result<Vec<MediaItem>, ExtractError>) -> Self {
        Self {
            result,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl igrelay::extract::MediaExtractor for CountingExtractor {
    fn name(&self) -> &str {
        "counting"
    }

    async fn extract(&self, _link: &InstagramLink) -> Result<Vec<MediaItem>, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_active, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// One outbound chat operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        chat: ChatId,
        text: String,
        retry: Option<String>,
    },
    Deleted {
        chat: ChatId,
        message_id: MessageId,
    },
    Media {
        chat: ChatId,
        kind: MediaKind,
        url: String,
    },
    Album {
        chat: ChatId,
        urls: Vec<String>,
    },
}

/// Records outbound operations instead of calling Telegram.
#[derive(Default)]
pub struct RecordingTransport {
    log: Mutex<Vec<Sent>>,
    next_id: AtomicI32,
    fail_albums: bool,
    failing_urls: HashSet<String>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `send_album` call fails.
    pub fn failing_albums(mut self) -> Self {
        self.fail_albums = true;
        self
    }

    /// `send_media` fails for this URL.
    pub fn failing_url(mut self, url: &str) -> Self {
        self.failing_urls.insert(url.to_string());
        self
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.log.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Last text message that was not the processing placeholder.
    pub fn last_reply(&self) -> Option<(String, Option<String>)> {
        self.sent().into_iter().rev().find_map(|s| match s {
            Sent::Text { text, retry, .. } if text != igrelay::telegram::messages::PROCESSING => Some((text, retry)),
            _ => None,
        })
    }

    pub fn media_count(&self) -> usize {
        self.sent().iter().filter(|s| matches!(s, Sent::Media { .. })).count()
    }

    pub fn album_sizes(&self) -> Vec<usize> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Album { urls, .. } => Some(urls.len()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, sent: Sent) {
        self.log.lock().unwrap().push(sent);
    }

    fn failure() -> AppError {
        AppError::Io(std::io::Error::other("simulated send failure"))
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, chat_id: ChatId, text: &str, retry: Option<&InstagramLink>) -> AppResult<MessageId> {
        self.push(Sent::Text {
            chat: chat_id,
            text: text.to_string(),
            retry: retry.map(InstagramLink::callback_data),
        });
        Ok(MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> AppResult<()> {
        self.push(Sent::Deleted {
            chat: chat_id,
            message_id,
        });
        Ok(())
    }

    async fn send_media(&self, chat_id: ChatId, item: &MediaItem) -> AppResult<()> {
        let url = item.source_url.to_string();
        if self.failing_urls.contains(&url) {
            return Err(Self::failure());
        }
        self.push(Sent::Media {
            chat: chat_id,
            kind: item.kind,
            url,
        });
        Ok(())
    }

    async fn send_album(&self, chat_id: ChatId, items: &[MediaItem]) -> AppResult<()> {
        if self.fail_albums {
            return Err(Self::failure());
        }
        self.push(Sent::Album {
            chat: chat_id,
            urls: items.iter().map(|i| i.source_url.to_string()).collect(),
        });
        Ok(())
    }
}
