use thiserror::Error;

/// Structured error type for link validation and media extraction.
///
/// The type is `Clone` because a single upstream failure may be shared by every
/// caller waiting on the same cache key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// The text does not contain an Instagram post/reel link
    #[error("Not an Instagram post or reel link: {0}")]
    InvalidLink(String),

    /// The API answered but returned no usable media
    #[error("No media found for this link")]
    EmptyResult,

    /// The API did not answer within the request timeout
    #[error("Extraction API timed out")]
    UpstreamTimeout,

    /// Connection failed or no response was received
    #[error("No response from extraction API: {0}")]
    UpstreamNoResponse(String),

    /// The API answered with a non-2xx status
    #[error("Extraction API error: {status}{}", api_message_suffix(.message))]
    UpstreamStatus { status: u16, message: Option<String> },

    /// The API answered 2xx but the payload does not have the expected shape
    #[error("Invalid extraction API response: {0}")]
    UpstreamMalformed(String),
}

fn api_message_suffix(message: &Option<String>) -> String {
    message.as_ref().map(|m| format!(" ({})", m)).unwrap_or_default()
}

impl ExtractError {
    /// Returns subcategory for metrics
    pub fn subcategory(&self) -> &'static str {
        match self {
            ExtractError::InvalidLink(_) => "invalid_link",
            ExtractError::EmptyResult => "empty_result",
            ExtractError::UpstreamTimeout => "timeout",
            ExtractError::UpstreamNoResponse(_) => "no_response",
            ExtractError::UpstreamStatus { .. } => "http_status",
            ExtractError::UpstreamMalformed(_) => "malformed",
        }
    }

    /// Whether the failure came from the upstream API (as opposed to the user's input).
    pub fn is_upstream(&self) -> bool {
        !matches!(self, ExtractError::InvalidLink(_) | ExtractError::EmptyResult)
    }
}
