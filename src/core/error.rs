use std::time::Duration;

use thiserror::Error;

use crate::extract::ExtractError;
use crate::telegram::messages;

/// Centralized error types for the application
///
/// Every failure of a relay ends up here and is turned into a chat message by
/// [`AppError::user_message`]; none of them terminate the process.
///
/// # Example
///
/// ```no_run
/// use igrelay::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Link validation and extraction errors
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The user exhausted their request budget
    #[error("Rate limited, retry after {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// HTTP client construction/transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The relay queue was shut down while waiting for a slot
    #[error("Relay queue closed")]
    QueueClosed,

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Human-readable text shown to the user in the chat.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Extract(ExtractError::InvalidLink(_)) => messages::INVALID_LINK.to_string(),
            AppError::Extract(ExtractError::EmptyResult) => messages::MEDIA_NOT_FOUND.to_string(),
            AppError::RateLimited { retry_after } => messages::rate_limited(*retry_after),
            _ => messages::GENERIC_ERROR.to_string(),
        }
    }

    /// Whether pressing "Try again" could plausibly help.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Extract(e) => e.is_upstream(),
            AppError::Telegram(_) | AppError::Http(_) => true,
            _ => false,
        }
    }

    /// Short category for logs and metrics
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Extract(e) => e.subcategory(),
            AppError::RateLimited { .. } => "rate_limited",
            AppError::Telegram(_) => "telegram",
            AppError::Http(_) => "http",
            AppError::Io(_) => "io",
            AppError::QueueClosed => "queue",
            AppError::Config(_) => "config",
        }
    }
}
