use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{api_error, build_client, ProviderError};
use crate::config::SpeechConfig;

/// Text-to-speech.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Returns encoded audio bytes (MP3 for ElevenLabs).
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError>;

    fn name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

#[derive(Debug, Clone)]
pub struct ElevenLabsSpeechClient {
    client: Client,
    api_key: String,
    model: String,
    url: String,
}

impl ElevenLabsSpeechClient {
    pub fn new(config: &SpeechConfig, api_key: &str) -> Result<Self, ProviderError> {
        if api_key.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        Ok(Self {
            client: build_client(config.timeout_seconds)?,
            api_key: api_key.to_string(),
            model: config.model.clone(),
            url: format!(
                "{}/v1/text-to-speech/{}",
                config.base_url.trim_end_matches('/'),
                config.voice_id
            ),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSpeechClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError> {
        let request = SpeechRequest {
            text,
            model_id: &self.model,
        };

        let response = self
            .client
            .post(&self.url)
            .header("xi-api-key", &self.api_key)
            .header("accept", "audio/mpeg")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        Ok(audio.to_vec())
    }

    fn name(&self) -> &str {
        "elevenlabs"
    }
}
