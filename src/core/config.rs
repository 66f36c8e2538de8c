use once_cell::sync::Lazy;
use secrecy::SecretString;
use std::env;
use std::time::Duration;

/// Reads an environment variable, treating empty values as unset.
fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parses a numeric environment variable, falling back to `default` when unset or invalid.
fn parsed_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    non_empty_env(name).and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Default RapidAPI host of the post-dl endpoint
pub const DEFAULT_RAPID_API_HOST: &str = "instagram-looter2.p.rapidapi.com";

/// Bot token
/// Read from TELEGRAM_API, BOT_TOKEN or TELOXIDE_TOKEN (first set wins)
pub static BOT_TOKEN: Lazy<Option<SecretString>> = Lazy::new(|| {
    ["TELEGRAM_API", "BOT_TOKEN", "TELOXIDE_TOKEN"]
        .iter()
        .find_map(|name| non_empty_env(name))
        .map(SecretString::from)
});

/// RapidAPI key for the extraction API
/// Read from RAPID_API_KEY environment variable
pub static RAPID_API_KEY: Lazy<Option<SecretString>> =
    Lazy::new(|| non_empty_env("RAPID_API_KEY").map(SecretString::from));

/// Value of the X-RapidAPI-Host header
/// Default: instagram-looter2.p.rapidapi.com
pub static RAPID_API_HOST: Lazy<String> =
    Lazy::new(|| non_empty_env("RAPID_API_HOST").unwrap_or_else(|| DEFAULT_RAPID_API_HOST.to_string()));

/// Base URL of the extraction API (without /post-dl)
/// Read from RAPID_API_BASE_URL, defaults to https://<RAPID_API_HOST>
pub static RAPID_API_BASE_URL: Lazy<String> =
    Lazy::new(|| non_empty_env("RAPID_API_BASE_URL").unwrap_or_else(|| format!("https://{}", *RAPID_API_HOST)));

/// Outbound proxy for both HTTP clients (http, https or socks5)
pub static PROXY_URL: Lazy<Option<String>> = Lazy::new(|| non_empty_env("PROXY_URL"));

/// Custom Bot API server URL
/// Read from BOT_API_URL environment variable
pub static BOT_API_URL: Lazy<Option<String>> = Lazy::new(|| non_empty_env("BOT_API_URL"));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: igrelay.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| non_empty_env("LOG_FILE_PATH").unwrap_or_else(|| "igrelay.log".to_string()));

/// Minimum level written to the terminal and the log file
/// Read from LOG_LEVEL environment variable (error, warn, info, debug, trace)
/// Default: info
pub static LOG_LEVEL: Lazy<log::LevelFilter> = Lazy::new(|| parsed_env("LOG_LEVEL", log::LevelFilter::Info));

/// Liveness server configuration
pub mod server {
    use once_cell::sync::Lazy;

    /// Port for the liveness HTTP server
    /// Read from PORT environment variable
    /// Default: 8080
    pub static PORT: Lazy<u16> = Lazy::new(|| super::parsed_env("PORT", 8080));
}

/// Per-user rate limiting configuration
pub mod rate_limit {
    use once_cell::sync::Lazy;

    /// Bucket capacity and refill rate per minute
    /// Read from RATE_LIMIT_PER_MINUTE environment variable
    /// Default: 5
    pub static REQUESTS_PER_MINUTE: Lazy<u32> =
        Lazy::new(|| super::parsed_env("RATE_LIMIT_PER_MINUTE", 5u32).max(1));
}

/// Relay queue configuration
pub mod queue {
    use once_cell::sync::Lazy;

    /// Maximum number of relays running at once
    /// Read from MAX_CONCURRENT_RELAYS environment variable
    /// Default: 5
    pub static MAX_CONCURRENT_RELAYS: Lazy<usize> =
        Lazy::new(|| super::parsed_env("MAX_CONCURRENT_RELAYS", 5usize).max(1));
}

/// Media cache configuration
pub mod cache {
    use super::Duration;
    use once_cell::sync::Lazy;

    /// Lifetime of a cached extraction result (in seconds)
    /// Read from CACHE_TTL_SECS environment variable
    /// Default: 3600 (1 hour)
    pub static TTL_SECS: Lazy<u64> = Lazy::new(|| super::parsed_env("CACHE_TTL_SECS", 3600u64));

    /// Maximum number of cached posts
    pub const MAX_ENTRIES: u64 = 10_000;

    pub fn ttl() -> Duration {
        Duration::from_secs(*TTL_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Timeout of a single extraction API request (in seconds)
    pub const EXTRACT_TIMEOUT_SECS: u64 = 10;

    /// Request timeout for Telegram API calls (in seconds)
    /// Large enough for Telegram to fetch remote videos by URL
    pub const TELEGRAM_TIMEOUT_SECS: u64 = 120;

    pub fn telegram_timeout() -> Duration {
        Duration::from_secs(TELEGRAM_TIMEOUT_SECS)
    }
}

/// Inline mode configuration
pub mod inline {
    /// How long Telegram may cache an inline answer (in seconds)
    pub const CACHE_TIME_SECS: u32 = 30;

    /// Maximum number of results in one inline answer (Telegram limit)
    pub const MAX_RESULTS: usize = 50;
}

/// Bot startup retry configuration
pub mod retry {
    /// Attempts of the initial get_me call before giving up
    pub const STARTUP_ATTEMPTS: u32 = 5;

    /// Base delay between startup attempts (in seconds), doubled every attempt
    pub const STARTUP_DELAY_SECS: u64 = 2;
}
