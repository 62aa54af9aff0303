//! Builds the configured providers.

use std::sync::Arc;

use briefly_config::AppConfig;
use briefly_core::error::ProviderError;
use briefly_core::provider::Provider;
use briefly_core::speech::SpeechSynthesizer;
use tracing::debug;

use crate::openai_responses::OpenAiResponsesProvider;
use crate::openai_speech::OpenAiSpeechProvider;

/// The upstreams a running gateway talks to.
#[derive(Clone)]
pub struct ProviderSet {
    pub completion: Arc<dyn Provider>,
    pub speech: Arc<dyn SpeechSynthesizer>,
}

/// Build providers from configuration.
///
/// Both providers share the API key and base URL; a missing key is reported
/// here rather than on the first request.
pub fn build_from_config(config: &AppConfig) -> Result<ProviderSet, ProviderError> {
    let api_key = config
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            ProviderError::NotConfigured(
                "no API key; set OPEN_AI_KEY or api_key in config.toml".into(),
            )
        })?;

    debug!(api_url = %config.api_url, model = %config.model, "Building providers");

    let completion = OpenAiResponsesProvider::new("openai", &config.api_url, api_key);
    let speech = OpenAiSpeechProvider::new(&config.api_url, api_key)
        .with_model(&config.speech.model)
        .with_voice(&config.speech.voice)
        .with_format(&config.speech.format);

    Ok(ProviderSet {
        completion: Arc::new(completion),
        speech: Arc::new(speech),
    })
}
