//! Instagram reel metadata over the private mobile API, authenticated with a
//! `sessionid` cookie.
//!
//! The reel shortcode in the link is decoded to the numeric media id, then
//! `GET {api_url}/media/{id}/info/` yields the caption and the first video
//! rendition.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{check_status, http_client};
use crate::config::InstagramSettings;
use crate::recipe::{MetadataFetcher, ReelLink, ReelMetadata, ServiceError};

const SHORTCODE_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
/// Private posts append a 28-char suffix to the shortcode.
const PRIVATE_SUFFIX_LEN: usize = 28;
const APP_ID: &str = "936619743392459";
const MOBILE_USER_AGENT: &str = "Instagram 269.0.0.18.75 Android (26/8.0.0; 480dpi; 1080x1920; \
     OnePlus; 6T Dev; devitron; qcom; en_US; 314665256)";

fn shortcode_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"instagram\.com/(?:[\w.]+/)?(?:reel|reels|p|tv)/([A-Za-z0-9_-]+)")
            .expect("valid regex")
    })
}

/// Extracts the shortcode from a reel link.
pub fn shortcode(link: &str) -> Option<&str> {
    shortcode_regex()
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Decodes a shortcode (base64url digits, most significant first) into the
/// numeric media id. `None` on foreign characters or overflow.
pub fn media_id_from_shortcode(code: &str) -> Option<u128> {
    let code = if code.len() > PRIVATE_SUFFIX_LEN {
        &code[..code.len() - PRIVATE_SUFFIX_LEN]
    } else {
        code
    };
    if code.is_empty() {
        return None;
    }
    code.bytes().try_fold(0u128, |id, byte| {
        let digit = SHORTCODE_ALPHABET.iter().position(|&c| c == byte)?;
        id.checked_mul(64)?.checked_add(digit as u128)
    })
}

pub struct InstagramClient {
    http: reqwest::Client,
    api_url: String,
    headers: HeaderMap,
}

impl InstagramClient {
    pub fn new(settings: &InstagramSettings) -> Result<Self, ServiceError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(MOBILE_USER_AGENT));
        headers.insert("X-IG-App-ID", HeaderValue::from_static(APP_ID));
        let cookie = HeaderValue::from_str(&format!("sessionid={}", settings.session_id))
            .map_err(|_| ServiceError::InvalidInput("session id is not a valid header".into()))?;
        headers.insert(COOKIE, cookie);

        Ok(Self {
            http: http_client(settings.timeout)?,
            api_url: settings.api_url.clone(),
            headers,
        })
    }
}

#[async_trait]
impl MetadataFetcher for InstagramClient {
    async fn fetch_reel(&self, link: &ReelLink) -> Result<Option<ReelMetadata>, ServiceError> {
        let Some(media_id) = shortcode(link.as_str()).and_then(media_id_from_shortcode) else {
            warn!(link = %link, "no decodable shortcode in link");
            return Ok(None);
        };

        let response = self
            .http
            .get(format!("{}/media/{media_id}/info/", self.api_url))
            .headers(self.headers.clone())
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(media_id = %media_id, "reel not found");
            return Ok(None);
        }
        let raw = check_status(response).await?.text().await?;
        parse_media_info(&raw)
    }
}

fn parse_media_info(raw: &str) -> Result<Option<ReelMetadata>, ServiceError> {
    let info: MediaInfo =
        serde_json::from_str(raw).map_err(|e| ServiceError::Parse(e.to_string()))?;
    let Some(item) = info.items.into_iter().next() else {
        return Ok(None);
    };
    let Some(video_url) = item
        .video_versions
        .into_iter()
        .map(|v| v.url)
        .find(|url| !url.is_empty())
    else {
        return Ok(None);
    };
    let description = item.caption.map(|c| c.text).unwrap_or_default();
    Ok(Some(ReelMetadata {
        description,
        video_url,
    }))
}

// --- Response types ---

#[derive(Deserialize)]
struct MediaInfo {
    #[serde(default)]
    items: Vec<MediaItem>,
}

#[derive(Deserialize)]
struct MediaItem {
    caption: Option<Caption>,
    #[serde(default)]
    video_versions: Vec<VideoVersion>,
}

#[derive(Deserialize)]
struct Caption {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct VideoVersion {
    url: String,
}
