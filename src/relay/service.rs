use std::sync::Arc;
use std::time::Duration;

use teloxide::types::ChatId;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::metrics;
use crate::core::rate_limiter::RateLimiter;
use crate::extract::link::parse_instagram_link;
use crate::extract::{InstagramLink, MediaCache, MediaExtractor, MediaItem};
use crate::relay::queue::{RelayQueue, RelaySlot};

/// Where a relay request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestSource {
    Direct,
    Inline,
    Callback,
}

impl RequestSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestSource::Direct => "direct",
            RequestSource::Inline => "inline",
            RequestSource::Callback => "callback",
        }
    }
}

/// Shared state of the relay: media cache, per-user limiter and relay queue.
///
/// Admission order is validation first, then rate limiting, so that text
/// without a usable link never costs the user a token and never reaches the
/// extraction API.
pub struct RelayService {
    cache: MediaCache,
    rate_limiter: RateLimiter,
    queue: RelayQueue,
}

impl RelayService {
    pub fn new(cache: MediaCache, rate_limiter: RateLimiter, queue: RelayQueue) -> Self {
        Self {
            cache,
            rate_limiter,
            queue,
        }
    }

    /// Builds the service around `extractor` with limits read from the environment.
    pub fn from_config(extractor: Arc<dyn MediaExtractor>) -> Self {
        Self::new(
            MediaCache::new(extractor, config::cache::ttl(), config::cache::MAX_ENTRIES),
            RateLimiter::new(),
            RelayQueue::new(*config::queue::MAX_CONCURRENT_RELAYS),
        )
    }

    /// Validates `text` and takes a token from `user`'s bucket.
    pub async fn admit(&self, user: ChatId, text: &str, source: RequestSource) -> AppResult<InstagramLink> {
        let link = parse_instagram_link(text)?;
        self.admit_link(user, &link, source).await?;
        Ok(link)
    }

    /// Takes a token for an already validated link (e.g. a retry button press).
    pub async fn admit_link(&self, user: ChatId, link: &InstagramLink, source: RequestSource) -> AppResult<()> {
        metrics::record_request(source.as_str());

        if let Err(retry_after) = self.rate_limiter.check(user).await {
            metrics::record_rate_limited(source.as_str());
            log::info!(
                "Rate limited {} request from {} for {} (retry in {:?})",
                source.as_str(),
                user,
                link,
                retry_after
            );
            return Err(AppError::RateLimited { retry_after });
        }
        Ok(())
    }

    /// Waits for a relay slot.
    pub async fn slot(&self) -> AppResult<RelaySlot> {
        self.queue.acquire().await
    }

    /// Returns the media of `link`, from the cache when possible.
    pub async fn fetch(&self, link: &InstagramLink) -> AppResult<Arc<Vec<MediaItem>>> {
        Ok(self.cache.get_or_extract(link).await?)
    }

    pub fn cache(&self) -> &MediaCache {
        &self.cache
    }

    pub fn queue(&self) -> &RelayQueue {
        &self.queue
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }
}

/// Builds a service for tests and tools with explicit limits.
pub fn service_with_limits(
    extractor: Arc<dyn MediaExtractor>,
    requests_per_minute: u32,
    max_concurrent: usize,
) -> RelayService {
    RelayService::new(
        MediaCache::new(extractor, Duration::from_secs(3600), config::cache::MAX_ENTRIES),
        RateLimiter::with_limits(requests_per_minute, Duration::from_secs(60)),
        RelayQueue::new(max_concurrent),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    #[derive(Default)]
    struct StubExtractor {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MediaExtractor for StubExtractor {
        fn name(&self) -> &str {
            "stub"
        }

        async fn extract(&self, _link: &InstagramLink) -> Result<Vec<MediaItem>, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![MediaItem::video(Url::parse("https://cdn.example.com/v.mp4").unwrap())])
        }
    }

    #[tokio::test]
    async fn test_invalid_text_does_not_consume_tokens() {
        let service = service_with_limits(Arc::new(StubExtractor::default()), 1, 5);
        let user = ChatId(10);

        for _ in 0..3 {
            let err = service.admit(user, "hello", RequestSource::Direct).await.unwrap_err();
            assert!(matches!(err, AppError::Extract(ExtractError::InvalidLink(_))));
        }
        assert!(service
            .admit(user, "https://www.instagram.com/p/ABC/", RequestSource::Direct)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_excess_requests_are_rate_limited() {
        let service = service_with_limits(Arc::new(StubExtractor::default()), 2, 5);
        let user = ChatId(11);
        let text = "https://www.instagram.com/p/ABC/";

        service.admit(user, text, RequestSource::Inline).await.unwrap();
        service.admit(user, text, RequestSource::Inline).await.unwrap();
        let err = service.admit(user, text, RequestSource::Inline).await.unwrap_err();
        assert!(matches!(err, AppError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn test_fetch_goes_through_cache() {
        let extractor = Arc::new(StubExtractor::default());
        let service = service_with_limits(extractor.clone(), 5, 5);
        let link = parse_instagram_link("https://www.instagram.com/reel/XYZ/").unwrap();

        service.fetch(&link).await.unwrap();
        service.fetch(&link).await.unwrap();
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }
}
