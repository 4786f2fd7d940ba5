//! Startup wiring — builds the store and the external collaborators from config.
//!
//! A collaborator without credentials (or explicitly disabled) is absent for
//! the whole process lifetime; the orchestrator degrades around it.

use std::sync::Arc;

use signal_core::config::{DatabaseConfig, GenerationConfig, SentimentConfig, SpeechConfig};
use signal_core::providers::select_model;
use signal_core::{
    ElevenLabsSpeechClient, HuggingFaceSentimentClient, MemoryVitalsStore, PgVitalsStore,
    ResponseGenerator, SentimentClassifier, SignalConfig, SpeechSynthesizer, VitalsStore,
};

#[derive(Default, Clone)]
pub struct Collaborators {
    pub generator: Option<Arc<dyn ResponseGenerator>>,
    pub sentiment: Option<Arc<dyn SentimentClassifier>>,
    pub speech: Option<Arc<dyn SpeechSynthesizer>>,
}

pub async fn create_collaborators(config: &SignalConfig) -> Collaborators {
    Collaborators {
        generator: create_generator(&config.generation).await,
        sentiment: create_sentiment(&config.sentiment),
        speech: create_speech(&config.speech),
    }
}

/// Probe the candidate models once and keep the selected handle.
pub async fn create_generator(config: &GenerationConfig) -> Option<Arc<dyn ResponseGenerator>> {
    let api_key = match SignalConfig::api_key(&config.api_key_env) {
        Some(k) => k,
        None => {
            tracing::warn!(
                env = %config.api_key_env,
                "Generative provider absent: no API key; chat will reply in offline mode"
            );
            return None;
        }
    };

    match select_model(config, &api_key).await {
        Ok(generator) => Some(Arc::new(generator)),
        Err(e) => {
            tracing::warn!(error = %e, "Generative provider absent");
            None
        }
    }
}

pub fn create_sentiment(config: &SentimentConfig) -> Option<Arc<dyn SentimentClassifier>> {
    if !config.enabled {
        tracing::info!("Sentiment provider disabled");
        return None;
    }

    let api_key = match SignalConfig::api_key(&config.api_key_env) {
        Some(k) => k,
        None => {
            tracing::warn!(env = %config.api_key_env, "Sentiment provider absent: no API key");
            return None;
        }
    };

    match HuggingFaceSentimentClient::new(config, &api_key) {
        Ok(client) => {
            tracing::info!(model = %config.model, "Sentiment provider ready");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Sentiment provider absent");
            None
        }
    }
}

pub fn create_speech(config: &SpeechConfig) -> Option<Arc<dyn SpeechSynthesizer>> {
    if !config.enabled {
        tracing::info!("Speech provider disabled");
        return None;
    }

    let api_key = match SignalConfig::api_key(&config.api_key_env) {
        Some(k) => k,
        None => {
            tracing::warn!(env = %config.api_key_env, "Speech provider absent: no API key");
            return None;
        }
    };

    match ElevenLabsSpeechClient::new(config, &api_key) {
        Ok(client) => {
            tracing::info!(voice = %config.voice_id, "Speech provider ready");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Speech provider absent");
            None
        }
    }
}

/// Connect to Postgres and bootstrap the schema, or fall back to memory when
/// no database URL is configured.
pub async fn create_store(config: &DatabaseConfig) -> anyhow::Result<Arc<dyn VitalsStore>> {
    match &config.url {
        Some(url) => {
            let pool = signal_core::db::create_pool(url, config.max_connections).await?;
            signal_core::db::init_schema(&pool).await?;
            tracing::info!("Using Postgres store");
            Ok(Arc::new(PgVitalsStore::new(pool)))
        }
        None => {
            tracing::warn!("No database.url configured; records are kept in memory only");
            Ok(Arc::new(MemoryVitalsStore::new()))
        }
    }
}
