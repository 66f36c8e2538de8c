use std::sync::Arc;

use moka::future::Cache;
use teloxide::types::ChatId;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::core::config;

/// Token bucket of a single user.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn full(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_refill: Instant::now(),
        }
    }

    /// Adds the tokens earned since the last refill, never exceeding `capacity`.
    fn refill(&mut self, capacity: f64, per_second: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * per_second).min(capacity);
        self.last_refill = now;
    }
}

/// Per-user token bucket rate limiter.
///
/// Every user owns a bucket of `capacity` tokens that refills continuously at
/// `capacity` tokens per `period`. A request takes one token; a request that
/// finds the bucket empty is refused.
///
/// Buckets live in an expiring map: once a bucket has been idle for a full
/// `period` it would be full again, so it is dropped and recreated on demand.
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Cache<ChatId, Arc<Mutex<TokenBucket>>>,
    capacity: f64,
    per_second: f64,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    /// Creates a limiter with `RATE_LIMIT_PER_MINUTE` requests per minute.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use igrelay::core::rate_limiter::RateLimiter;
    ///
    /// let limiter = RateLimiter::new();
    /// ```
    pub fn new() -> Self {
        Self::with_limits(*config::rate_limit::REQUESTS_PER_MINUTE, Duration::from_secs(60))
    }

    /// Creates a limiter allowing `capacity` requests per `period`.
    pub fn with_limits(capacity: u32, period: Duration) -> Self {
        let capacity = f64::from(capacity.max(1));
        let period = period.max(Duration::from_millis(1));

        Self {
            buckets: Cache::builder().time_to_idle(period).build(),
            capacity,
            per_second: capacity / period.as_secs_f64(),
        }
    }

    /// Takes one token from the user's bucket.
    ///
    /// # Returns
    ///
    /// `Ok(())` when the request may proceed, otherwise `Err(retry_after)` with
    /// the time until the next token becomes available.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use teloxide::types::ChatId;
    /// use igrelay::core::rate_limiter::RateLimiter;
    ///
    /// # async fn example() {
    /// let limiter = RateLimiter::new();
    /// if let Err(wait) = limiter.check(ChatId(123456789)).await {
    ///     println!("Try again in {}s", wait.as_secs());
    /// }
    /// # }
    /// ```
    pub async fn check(&self, chat_id: ChatId) -> Result<(), Duration> {
        let capacity = self.capacity;
        let bucket = self
            .buckets
            .get_with(chat_id, async move { Arc::new(Mutex::new(TokenBucket::full(capacity))) })
            .await;

        let mut bucket = bucket.lock().await;
        bucket.refill(self.capacity, self.per_second);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            let missing = 1.0 - bucket.tokens;
            Err(Duration::from_secs_f64(missing / self.per_second))
        }
    }

    /// Tokens currently available to the user (a full bucket for unknown users).
    pub async fn remaining(&self, chat_id: ChatId) -> u32 {
        match self.buckets.get(&chat_id).await {
            Some(bucket) => {
                let mut bucket = bucket.lock().await;
                bucket.refill(self.capacity, self.per_second);
                bucket.tokens.floor() as u32
            }
            None => self.capacity as u32,
        }
    }

    /// Number of users with a live bucket, after dropping the idle ones.
    pub async fn tracked_users(&self) -> u64 {
        self.buckets.run_pending_tasks().await;
        self.buckets.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_allows_capacity_then_refuses() {
        let limiter = RateLimiter::with_limits(5, Duration::from_secs(60));
        let chat = ChatId(1);

        for _ in 0..5 {
            assert!(limiter.check(chat).await.is_ok());
        }
        let wait = limiter.check(chat).await.unwrap_err();
        assert!(wait > Duration::from_secs(11) && wait <= Duration::from_millis(12_001));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refills_over_time() {
        let limiter = RateLimiter::with_limits(5, Duration::from_secs(60));
        let chat = ChatId(1);

        for _ in 0..5 {
            limiter.check(chat).await.unwrap();
        }
        assert!(limiter.check(chat).await.is_err());

        tokio::time::advance(Duration::from_secs(13)).await;
        assert!(limiter.check(chat).await.is_ok());
        assert!(limiter.check(chat).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_is_capped() {
        let limiter = RateLimiter::with_limits(3, Duration::from_secs(60));
        let chat = ChatId(7);

        limiter.check(chat).await.unwrap();
        tokio::time::advance(Duration::from_secs(600)).await;
        assert_eq!(limiter.remaining(chat).await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_users_are_independent() {
        let limiter = RateLimiter::with_limits(1, Duration::from_secs(60));

        assert!(limiter.check(ChatId(1)).await.is_ok());
        assert!(limiter.check(ChatId(1)).await.is_err());
        assert!(limiter.check(ChatId(2)).await.is_ok());
    }

    // Real time: moka expires entries on its own clock, not tokio's.
    #[tokio::test]
    async fn test_idle_buckets_are_evicted() {
        let limiter = RateLimiter::with_limits(2, Duration::from_millis(200));

        limiter.check(ChatId(1)).await.unwrap();
        limiter.check(ChatId(2)).await.unwrap();
        assert_eq!(limiter.tracked_users().await, 2);

        std::thread::sleep(std::time::Duration::from_millis(400));
        assert_eq!(limiter.tracked_users().await, 0);

        // An evicted user starts again with a full bucket
        assert_eq!(limiter.remaining(ChatId(1)).await, 2);
    }

    #[tokio::test]
    async fn test_unknown_user_has_full_bucket() {
        let limiter = RateLimiter::with_limits(4, Duration::from_secs(60));
        assert_eq!(limiter.remaining(ChatId(99)).await, 4);
    }
}
