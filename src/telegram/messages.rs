//! User-facing texts.

use std::time::Duration;

pub const START: &str = "Send me any Instagram link (except for stories) below and I'll send it back to you as a media file. \
Or, use inline mode by typing @{bot} followed by the Instagram link!";

pub const PROCESSING: &str = "Processing your link, please wait...";

pub const NO_LINK_HINT: &str = "Send me a link to an Instagram post or reel, e.g. https://www.instagram.com/p/...";

pub const INVALID_LINK: &str =
    "That doesn't look like a post or reel link. Stories and profiles are not supported.";

pub const MEDIA_NOT_FOUND: &str = "Could not find the media for that link.";

pub const GENERIC_ERROR: &str = "An error occurred while processing the link. Try again!";

pub const RETRY_BUTTON: &str = "🔄 Try again";

/// Inline mode article titles and texts
pub mod inline {
    pub const HELP_TITLE: &str = "Paste an Instagram post or reel link";
    pub const HELP_TEXT: &str = "Type the bot's username followed by an Instagram link to share its media here.";

    pub const INVALID_TITLE: &str = "Enter a valid Instagram Reel URL";
    pub const INVALID_TEXT: &str = "Please provide a valid Instagram link (e.g., https://www.instagram.com/p/...)";

    pub const NOT_FOUND_TITLE: &str = "Media not found";
    pub const NOT_FOUND_TEXT: &str = "Could not retrieve media from the provided Instagram link.";

    pub const RATE_LIMITED_TITLE: &str = "Slow down";

    pub const ERROR_TITLE: &str = "Error processing the link";
    pub const ERROR_TEXT: &str = "An error occurred while processing the link. Please try again later.";

    pub const PHOTO_CAPTION: &str = "Instagram Media";
    pub const VIDEO_TITLE: &str = "Instagram Reel";
}

/// `/start` text with the bot's username filled in.
pub fn start(bot_username: Option<&str>) -> String {
    START.replace("{bot}", bot_username.unwrap_or("YourBotUsername"))
}

/// Rate-limit notice; `retry_after` is rounded up to whole seconds.
pub fn rate_limited(retry_after: Duration) -> String {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    format!("Too many requests. Please try again in {}s.", secs.max(1))
}
