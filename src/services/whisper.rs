//! Whisper transcription over an OpenAI-compatible `/audio/transcriptions`
//! endpoint.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::multipart;
use tracing::{debug, info};

use super::{check_status, http_client};
use crate::config::OpenAiSettings;
use crate::recipe::{Locale, ServiceError, Transcriber};

/// Downloads the reel video and sends it to the Whisper transcription
/// endpoint. Whisper accepts mp4 directly, so no audio extraction happens.
pub struct WhisperTranscriber {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl WhisperTranscriber {
    pub fn new(settings: &OpenAiSettings) -> Result<Self, ServiceError> {
        Ok(Self {
            http: http_client(settings.timeout)?,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.clone(),
            model: settings.transcribe_model.clone(),
        })
    }

    async fn download(&self, video_url: &str) -> Result<Vec<u8>, ServiceError> {
        let response = self.http.get(video_url).send().await?;
        let bytes = check_status(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(
        &self,
        video_url: &str,
        locale: Locale,
    ) -> Result<Option<String>, ServiceError> {
        let start = Instant::now();
        let video = self.download(video_url).await?;
        if video.is_empty() {
            return Ok(None);
        }
        debug!(bytes = video.len(), "reel video downloaded");

        let file_part = multipart::Part::bytes(video)
            .file_name("reel.mp4")
            .mime_str("video/mp4")
            .map_err(|e| ServiceError::InvalidInput(format!("mime: {e}")))?;

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("language", locale.code())
            .text("response_format", "text")
            .part("file", file_part);

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let transcript = check_status(response).await?.text().await?;
        let transcript = transcript.trim();

        info!(
            chars = transcript.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "whisper transcription completed"
        );

        Ok((!transcript.is_empty()).then(|| transcript.to_string()))
    }
}
