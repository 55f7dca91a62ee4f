//! Production adapters for the external services: Instagram metadata,
//! Whisper transcription, and OpenAI-compatible chat completions.

pub mod instagram;
pub mod openai;
pub mod prompt;
pub mod whisper;

use std::time::Duration;

use crate::recipe::ServiceError;

pub use instagram::InstagramClient;
pub use openai::OpenAiChatClient;
pub use whisper::WhisperTranscriber;

/// Pooled HTTP client shared by one adapter.
fn http_client(timeout: Duration) -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(timeout)
        .build()
        .map_err(|e| ServiceError::Request(e.to_string()))
}

/// Turns a non-success response into `ServiceError::Status` with a short
/// body excerpt.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        body: body.chars().take(200).collect(),
    })
}
