pub mod config;
pub mod db;
pub mod error;
pub mod intent;
pub mod models;
pub mod providers;
pub mod store;

pub use config::SignalConfig;
pub use error::SignalError;
pub use intent::{Action, Intent, IntentProfile, IntentTable};
pub use providers::{
    ElevenLabsSpeechClient, GeminiGenerator, HuggingFaceSentimentClient, ProviderError,
    ResponseGenerator, SentimentClassifier, SpeechSynthesizer,
};
pub use store::{MemoryVitalsStore, PgVitalsStore, VitalsStore};
