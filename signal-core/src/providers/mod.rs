//! Clients for the external AI collaborators.
//!
//! - **Generation** — Gemini `generateContent` text completion
//! - **Sentiment** — Hugging Face inference text classification
//! - **Speech** — ElevenLabs text-to-speech
//!
//! Every call returns an explicit `Result`; none of the clients retry.

pub mod generation;
pub mod sentiment;
pub mod speech;

use std::time::Duration;

use reqwest::{Client, Response};
use thiserror::Error;

pub use generation::{select_model, GeminiGenerator, ResponseGenerator};
pub use sentiment::{HuggingFaceSentimentClient, SentimentClassifier};
pub use speech::{ElevenLabsSpeechClient, SpeechSynthesizer};

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Empty response from provider")]
    EmptyResponse,

    #[error("Missing API key")]
    MissingApiKey,
}

fn build_client(timeout_seconds: u64) -> Result<Client, ProviderError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()?)
}

/// Turn a non-success response into `ProviderError::Api`, pulling the message
/// out of the usual provider error shapes when the body is JSON.
async fn api_error(response: Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v["error"]["message"]
                .as_str()
                .or_else(|| v["error"].as_str())
                .or_else(|| v["detail"]["message"].as_str())
                .or_else(|| v["detail"].as_str())
                .map(str::to_string)
        })
        .unwrap_or(body);

    ProviderError::Api {
        code: status.as_u16(),
        message,
    }
}
