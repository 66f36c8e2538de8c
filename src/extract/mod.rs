//! Media extraction abstraction layer.
//!
//! Provides the `MediaExtractor` trait for backends that turn a validated
//! Instagram link into a list of downloadable media URLs, plus the TTL cache
//! that sits in front of them.
//!
//! Built-in backends:
//! - `LooterClient`: RapidAPI "Instagram Looter" `post-dl` endpoint

pub mod cache;
pub mod error;
pub mod link;
pub mod looter;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

pub use cache::{CacheStats, MediaCache};
pub use error::ExtractError;
pub use link::{parse_instagram_link, InstagramLink, PostKind};
pub use looter::{LooterClient, LooterConfig};

/// Kind of a single media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// One downloadable media file of a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaItem {
    pub kind: MediaKind,
    /// Direct CDN URL of the file
    pub source_url: Url,
    /// Thumbnail, when the API provides one
    pub preview_url: Option<Url>,
}

impl MediaItem {
    pub fn image(source_url: Url) -> Self {
        Self {
            kind: MediaKind::Image,
            source_url,
            preview_url: None,
        }
    }

    pub fn video(source_url: Url) -> Self {
        Self {
            kind: MediaKind::Video,
            source_url,
            preview_url: None,
        }
    }

    pub fn with_preview(mut self, preview_url: Url) -> Self {
        self.preview_url = Some(preview_url);
        self
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    /// Thumbnail to show for this item: the preview if present, otherwise the file itself.
    pub fn thumbnail_url(&self) -> &Url {
        self.preview_url.as_ref().unwrap_or(&self.source_url)
    }
}

/// Trait for extraction backends.
///
/// Implementations perform exactly one outbound request per call; caching and
/// admission control live outside of them.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Human-readable name of this backend (e.g., "instagram-looter")
    fn name(&self) -> &str;

    /// Resolve the media of a post. An empty list is reported as `ExtractError::EmptyResult`.
    async fn extract(&self, link: &InstagramLink) -> Result<Vec<MediaItem>, ExtractError>;
}
