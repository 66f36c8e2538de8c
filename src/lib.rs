//! igrelay - Telegram bot that relays Instagram posts and reels as media
//!
//! Users send a post/reel link in a chat or through inline mode; the bot asks
//! a third-party extraction API for the media URLs and sends them back.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging, metrics, rate limiting, liveness server
//! - `extract`: Link validation, extraction API client and result cache
//! - `relay`: Admission, concurrency queue, direct and inline relay
//! - `telegram`: Telegram bot integration and handlers

pub mod cli;
pub mod core;
pub mod extract;
pub mod relay;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use extract::{parse_instagram_link, InstagramLink, MediaItem, MediaKind};
pub use relay::RelayService;
