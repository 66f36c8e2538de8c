//! Instagram link validation
//!
//! Finds the first Instagram URL in a message and accepts it only when it points
//! at a post, reel or IGTV video. Profiles and stories are rejected.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::error::ExtractError;

/// Cached regex for Instagram URLs inside free text (scheme optional).
static INSTAGRAM_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:https?://)?\b(?:[a-z0-9-]+\.)*instagram\.com/[^\s]*").expect("Failed to compile Instagram URL regex")
});

static SHORTCODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Failed to compile shortcode regex"));

/// Characters that end a sentence rather than a URL when they trail a link in text.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '>', '\'', '"'];

/// First path segments that look like a username but are Instagram routes.
/// `/share/reel/<token>/` carries a redirect token, not a shortcode.
const RESERVED_PREFIXES: &[&str] = &["share", "stories", "explore"];

/// Prefix of the callback data used by the "try again" button.
const RETRY_CALLBACK_PREFIX: &str = "retry";

/// Kind of Instagram content a link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostKind {
    /// `/p/<code>`: photo, video or carousel post
    Post,
    /// `/reel/<code>` and `/reels/<code>`
    Reel,
    /// `/tv/<code>`: legacy IGTV
    Tv,
}

impl PostKind {
    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "p" => Some(PostKind::Post),
            "reel" | "reels" => Some(PostKind::Reel),
            "tv" => Some(PostKind::Tv),
            _ => None,
        }
    }

    /// Path segment used in the canonical URL.
    pub fn as_segment(&self) -> &'static str {
        match self {
            PostKind::Post => "p",
            PostKind::Reel => "reel",
            PostKind::Tv => "tv",
        }
    }
}

/// A validated Instagram post/reel link.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstagramLink {
    kind: PostKind,
    shortcode: String,
}

impl InstagramLink {
    pub fn kind(&self) -> PostKind {
        self.kind
    }

    pub fn shortcode(&self) -> &str {
        &self.shortcode
    }

    /// `https://www.instagram.com/<kind>/<shortcode>/`, sent upstream and used as cache key.
    pub fn canonical_url(&self) -> String {
        format!(
            "https://www.instagram.com/{}/{}/",
            self.kind.as_segment(),
            self.shortcode
        )
    }

    /// Callback data for the retry button: `retry:<kind>:<shortcode>`.
    pub fn callback_data(&self) -> String {
        format!("{}:{}:{}", RETRY_CALLBACK_PREFIX, self.kind.as_segment(), self.shortcode)
    }

    /// Parses callback data produced by [`InstagramLink::callback_data`].
    pub fn from_callback_data(data: &str) -> Option<Self> {
        let mut parts = data.splitn(3, ':');
        if parts.next()? != RETRY_CALLBACK_PREFIX {
            return None;
        }
        let kind = PostKind::from_segment(parts.next()?)?;
        let shortcode = parts.next()?;
        if !SHORTCODE_REGEX.is_match(shortcode) {
            return None;
        }
        Some(Self {
            kind,
            shortcode: shortcode.to_string(),
        })
    }

    /// Builds a link from a parsed URL, returning `None` unless it is a post/reel URL.
    pub fn from_url(url: &Url) -> Option<Self> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return None;
        }
        let host = url.host_str()?.to_lowercase();
        if host != "instagram.com" && host != "www.instagram.com" && host != "m.instagram.com" {
            return None;
        }

        let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
        // Format: /reel/<code>/ or /<username>/reel/<code>/
        let (kind, shortcode) = match segments.as_slice() {
            [kind, code, ..] if PostKind::from_segment(kind).is_some() => (PostKind::from_segment(kind)?, *code),
            [user, kind, code, ..] if !RESERVED_PREFIXES.iter().any(|r| user.eq_ignore_ascii_case(r)) => {
                (PostKind::from_segment(kind)?, *code)
            }
            _ => return None,
        };

        if !SHORTCODE_REGEX.is_match(shortcode) {
            return None;
        }

        Some(Self {
            kind,
            shortcode: shortcode.to_string(),
        })
    }
}

impl fmt::Display for InstagramLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_url())
    }
}

/// Returns true if the text contains anything that looks like an Instagram URL.
///
/// Used to tell "not a link at all" apart from "an Instagram link we can't handle".
pub fn mentions_instagram(text: &str) -> bool {
    INSTAGRAM_URL_REGEX.is_match(text)
}

/// Validates the first Instagram URL in `text`.
///
/// # Returns
/// * `Ok(InstagramLink)` for post, reel and IGTV URLs (with or without a username prefix)
/// * `Err(ExtractError::InvalidLink)` otherwise
///
/// # Examples
/// ```
/// use igrelay::extract::link::parse_instagram_link;
///
/// let link = parse_instagram_link("look https://www.instagram.com/reel/C8xYz_1-ab/?igsh=abc").unwrap();
/// assert_eq!(link.canonical_url(), "https://www.instagram.com/reel/C8xYz_1-ab/");
///
/// assert!(parse_instagram_link("https://www.instagram.com/stories/someone/123/").is_err());
/// assert!(parse_instagram_link("hello").is_err());
/// ```
pub fn parse_instagram_link(text: &str) -> Result<InstagramLink, ExtractError> {
    let found = INSTAGRAM_URL_REGEX
        .find(text)
        .ok_or_else(|| ExtractError::InvalidLink(truncate_for_error(text)))?
        .as_str()
        .trim_end_matches(TRAILING_PUNCTUATION);

    let candidate = if found.to_ascii_lowercase().starts_with("http") {
        found.to_string()
    } else {
        format!("https://{}", found)
    };

    let url = Url::parse(&candidate).map_err(|_| ExtractError::InvalidLink(truncate_for_error(found)))?;
    InstagramLink::from_url(&url).ok_or_else(|| ExtractError::InvalidLink(truncate_for_error(found)))
}

fn truncate_for_error(text: &str) -> String {
    const MAX_CHARS: usize = 100;
    if text.chars().count() > MAX_CHARS {
        format!("{}...", text.chars().take(MAX_CHARS).collect::<String>())
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_post() {
        let link = parse_instagram_link("https://www.instagram.com/p/DEF456/").unwrap();
        assert_eq!(link.kind(), PostKind::Post);
        assert_eq!(link.shortcode(), "DEF456");
    }

    #[test]
    fn test_parse_reel_with_query() {
        let link = parse_instagram_link("https://www.instagram.com/reel/ABC123/?igsh=xxx").unwrap();
        assert_eq!(link.kind(), PostKind::Reel);
        assert_eq!(link.canonical_url(), "https://www.instagram.com/reel/ABC123/");
    }

    #[test]
    fn test_reels_normalized_to_reel() {
        let a = parse_instagram_link("https://instagram.com/reels/GHI789").unwrap();
        let b = parse_instagram_link("https://www.instagram.com/reel/GHI789/").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.canonical_url(), b.canonical_url());
    }

    #[test]
    fn test_parse_tv() {
        let link = parse_instagram_link("https://www.instagram.com/tv/JKL012/").unwrap();
        assert_eq!(link.kind(), PostKind::Tv);
    }

    #[test]
    fn test_parse_with_username_prefix() {
        let link = parse_instagram_link("https://www.instagram.com/kologoidaa/reel/B58TfHTnY2u/").unwrap();
        assert_eq!(link.shortcode(), "B58TfHTnY2u");
        assert_eq!(link.canonical_url(), "https://www.instagram.com/reel/B58TfHTnY2u/");
    }

    #[test]
    fn test_parse_link_inside_text() {
        let link = parse_instagram_link("check this out: https://www.instagram.com/p/Cabc_-1/ lol").unwrap();
        assert_eq!(link.shortcode(), "Cabc_-1");
    }

    #[test]
    fn test_parse_without_scheme_and_mobile_host() {
        let link = parse_instagram_link("m.instagram.com/p/XYZ/").unwrap();
        assert_eq!(link.canonical_url(), "https://www.instagram.com/p/XYZ/");
    }

    #[test]
    fn test_rejects_stories() {
        let err = parse_instagram_link("https://www.instagram.com/stories/someone/3141592653/").unwrap_err();
        assert!(matches!(err, ExtractError::InvalidLink(_)));
    }

    #[test]
    fn test_rejects_profile() {
        assert!(parse_instagram_link("https://www.instagram.com/username/").is_err());
    }

    #[test]
    fn test_rejects_non_instagram() {
        assert!(parse_instagram_link("https://www.youtube.com/watch?v=abc").is_err());
        assert!(parse_instagram_link("https://evilinstagram.com.example.org/p/ABC/").is_err());
        assert!(parse_instagram_link("https://notinstagram.com/p/ABC/").is_err());
        assert!(parse_instagram_link("https://cdn.instagram.com/p/ABC/").is_err());
    }

    #[test]
    fn test_rejects_plain_text() {
        assert!(parse_instagram_link("").is_err());
        assert!(parse_instagram_link("hello there").is_err());
    }

    #[test]
    fn test_rejects_missing_shortcode() {
        assert!(parse_instagram_link("https://www.instagram.com/p/").is_err());
    }

    #[test]
    fn test_trailing_punctuation_is_not_part_of_link() {
        for text in [
            "(https://www.instagram.com/p/ABC123)",
            "see https://www.instagram.com/p/ABC123, thanks",
            "https://www.instagram.com/p/ABC123.",
            "look: \"instagram.com/p/ABC123/\"!",
        ] {
            let link = parse_instagram_link(text).unwrap_or_else(|e| panic!("{:?} rejected: {}", text, e));
            assert_eq!(link.canonical_url(), "https://www.instagram.com/p/ABC123/");
        }
    }

    #[test]
    fn test_rejects_share_links() {
        assert!(parse_instagram_link("https://www.instagram.com/share/reel/BAXyz12/").is_err());
        assert!(parse_instagram_link("https://www.instagram.com/share/p/BAXyz12/").is_err());
    }

    #[test]
    fn test_mentions_instagram() {
        assert!(mentions_instagram("https://www.instagram.com/username/"));
        assert!(!mentions_instagram("https://example.com"));
    }

    #[test]
    fn test_callback_data_roundtrip() {
        let link = parse_instagram_link("https://www.instagram.com/reels/ABC123/").unwrap();
        assert_eq!(link.callback_data(), "retry:reel:ABC123");
        assert_eq!(InstagramLink::from_callback_data("retry:reel:ABC123"), Some(link));
    }

    #[test]
    fn test_callback_data_rejects_garbage() {
        assert_eq!(InstagramLink::from_callback_data("menu:info"), None);
        assert_eq!(InstagramLink::from_callback_data("retry:story:ABC"), None);
        assert_eq!(InstagramLink::from_callback_data("retry:p:AB/C"), None);
    }

    #[test]
    fn test_long_text_truncated_in_error() {
        let text = "x".repeat(500);
        match parse_instagram_link(&text) {
            Err(ExtractError::InvalidLink(shown)) => assert!(shown.len() < 120),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
