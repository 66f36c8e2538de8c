//! RapidAPI "Instagram Looter" extraction backend.
//!
//! One `GET {base}/post-dl?link=<canonical url>` per call. The response is
//! expected to look like `{"data": {"medias": [{"type": "image", "link": "..."}]}}`.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use super::error::ExtractError;
use super::link::InstagramLink;
use super::{MediaExtractor, MediaItem, MediaKind};
use crate::core::config;

/// Connection settings for [`LooterClient`].
#[derive(Debug, Clone)]
pub struct LooterConfig {
    /// Base URL without the `/post-dl` path
    pub base_url: String,
    pub api_key: SecretString,
    /// Value of the `X-RapidAPI-Host` header
    pub api_host: String,
    pub timeout: Duration,
    pub proxy: Option<String>,
}

impl LooterConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            base_url: format!("https://{}", config::DEFAULT_RAPID_API_HOST),
            api_key,
            api_host: config::DEFAULT_RAPID_API_HOST.to_string(),
            timeout: Duration::from_secs(config::network::EXTRACT_TIMEOUT_SECS),
            proxy: None,
        }
    }

    /// Builds the configuration from environment variables.
    ///
    /// Fails when `RAPID_API_KEY` is not set.
    pub fn from_env() -> Result<Self, crate::core::error::AppError> {
        let api_key = config::RAPID_API_KEY
            .clone()
            .ok_or_else(|| crate::core::error::AppError::Config("RAPID_API_KEY is not set".to_string()))?;

        Ok(Self {
            base_url: config::RAPID_API_BASE_URL.clone(),
            api_key,
            api_host: config::RAPID_API_HOST.clone(),
            timeout: Duration::from_secs(config::network::EXTRACT_TIMEOUT_SECS),
            proxy: config::PROXY_URL.clone(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct PostDlResponse {
    data: Option<PostDlData>,
}

#[derive(Debug, Deserialize)]
struct PostDlData {
    medias: Option<Vec<PostDlMedia>>,
}

#[derive(Debug, Deserialize)]
struct PostDlMedia {
    #[serde(rename = "type", default)]
    media_type: String,
    link: Option<String>,
    thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Extraction backend backed by the RapidAPI `post-dl` endpoint.
pub struct LooterClient {
    client: reqwest::Client,
    config: LooterConfig,
}

impl LooterClient {
    pub fn new(config: LooterConfig) -> Result<Self, reqwest::Error> {
        let mut client_builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout);

        if let Some(ref proxy_url) = config.proxy {
            let trimmed = proxy_url.trim();
            if !trimmed.is_empty() {
                match reqwest::Proxy::all(trimmed) {
                    Ok(proxy) => {
                        log::info!("LooterClient: using proxy for extraction API");
                        client_builder = client_builder.proxy(proxy);
                    }
                    Err(e) => {
                        log::warn!("LooterClient: failed to configure proxy: {}", e);
                    }
                }
            }
        }

        Ok(Self {
            client: client_builder.build()?,
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/post-dl", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl MediaExtractor for LooterClient {
    fn name(&self) -> &str {
        "instagram-looter"
    }

    async fn extract(&self, link: &InstagramLink) -> Result<Vec<MediaItem>, ExtractError> {
        let canonical = link.canonical_url();
        log::debug!("LooterClient: requesting {}", canonical);

        let response = self
            .client
            .get(self.endpoint())
            .query(&[("link", canonical.as_str())])
            .header("X-RapidAPI-Key", self.config.api_key.expose_secret())
            .header("X-RapidAPI-Host", &self.config.api_host)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.trim().is_empty());
            log::warn!("LooterClient: {} returned HTTP {} for {}", self.name(), status.as_u16(), canonical);
            return Err(ExtractError::UpstreamStatus {
                status: status.as_u16(),
                message,
            });
        }

        let items = parse_medias(&body)?;
        log::info!("LooterClient: {} media item(s) for {}", items.len(), canonical);
        Ok(items)
    }
}

fn map_transport_error(e: reqwest::Error) -> ExtractError {
    if e.is_timeout() {
        ExtractError::UpstreamTimeout
    } else {
        ExtractError::UpstreamNoResponse(e.without_url().to_string())
    }
}

/// Maps a `post-dl` response body into media items.
///
/// `type == "image"` becomes an image, every other type a video. Entries
/// without a parseable `link` are skipped.
pub fn parse_medias(body: &str) -> Result<Vec<MediaItem>, ExtractError> {
    let parsed: PostDlResponse =
        serde_json::from_str(body).map_err(|e| ExtractError::UpstreamMalformed(format!("invalid JSON: {}", e)))?;

    let medias = parsed
        .data
        .and_then(|d| d.medias)
        .ok_or_else(|| ExtractError::UpstreamMalformed("missing data.medias".to_string()))?;

    let items: Vec<MediaItem> = medias
        .into_iter()
        .filter_map(|m| {
            let source_url = m.link.as_deref().and_then(|l| Url::parse(l).ok())?;
            let kind = if m.media_type.eq_ignore_ascii_case("image") {
                MediaKind::Image
            } else {
                MediaKind::Video
            };
            Some(MediaItem {
                kind,
                source_url,
                preview_url: m.thumbnail.as_deref().and_then(|t| Url::parse(t).ok()),
            })
        })
        .collect();

    if items.is_empty() {
        return Err(ExtractError::EmptyResult);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_carousel() {
        let body = r#"{"data":{"medias":[
            {"type":"image","link":"https://cdn.example.com/1.jpg"},
            {"type":"video","link":"https://cdn.example.com/2.mp4","thumbnail":"https://cdn.example.com/2.jpg"}
        ]}}"#;
        let items = parse_medias(body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, MediaKind::Image);
        assert_eq!(items[1].kind, MediaKind::Video);
        assert_eq!(
            items[1].preview_url.as_ref().map(Url::as_str),
            Some("https://cdn.example.com/2.jpg")
        );
    }

    #[test]
    fn test_unknown_type_is_video() {
        let body = r#"{"data":{"medias":[{"type":"reel","link":"https://cdn.example.com/a.mp4"}]}}"#;
        assert_eq!(parse_medias(body).unwrap()[0].kind, MediaKind::Video);
    }

    #[test]
    fn test_missing_medias_is_malformed() {
        assert!(matches!(
            parse_medias(r#"{"data":{}}"#),
            Err(ExtractError::UpstreamMalformed(_))
        ));
        assert!(matches!(
            parse_medias(r#"{"status":false}"#),
            Err(ExtractError::UpstreamMalformed(_))
        ));
    }

    #[test]
    fn test_not_json_is_malformed() {
        assert!(matches!(parse_medias("<html>"), Err(ExtractError::UpstreamMalformed(_))));
    }

    #[test]
    fn test_empty_medias() {
        assert_eq!(parse_medias(r#"{"data":{"medias":[]}}"#), Err(ExtractError::EmptyResult));
    }

    #[test]
    fn test_unparseable_links_skipped() {
        let body = r#"{"data":{"medias":[
            {"type":"image","link":"not a url"},
            {"type":"image"},
            {"type":"image","link":"https://cdn.example.com/ok.jpg"}
        ]}}"#;
        let items = parse_medias(body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source_url.as_str(), "https://cdn.example.com/ok.jpg");
    }

    #[test]
    fn test_only_unparseable_links_is_empty() {
        let body = r#"{"data":{"medias":[{"type":"image","link":""}]}}"#;
        assert_eq!(parse_medias(body), Err(ExtractError::EmptyResult));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = LooterConfig::new(SecretString::from("k".to_string())).with_base_url("http://localhost:9999/");
        let client = LooterClient::new(config).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:9999/post-dl");
    }
}
