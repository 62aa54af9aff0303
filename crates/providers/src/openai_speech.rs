//! OpenAI text-to-speech provider (`/audio/speech`).

use async_trait::async_trait;
use briefly_core::error::ProviderError;
use briefly_core::speech::SpeechSynthesizer;
use tracing::debug;

use crate::status::check_status;

/// Synthesizes speech through the OpenAI audio API.
pub struct OpenAiSpeechProvider {
    base_url: String,
    api_key: String,
    model: String,
    voice: String,
    format: String,
    client: reqwest::Client,
}

impl OpenAiSpeechProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: "tts-1".into(),
            voice: "shimmer".into(),
            format: "mp3".into(),
            client,
        }
    }

    /// Set the speech model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the voice.
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Set the audio encoding (`mp3`, `opus`, `aac`, `flac`, `wav`, `pcm`).
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }
}

/// MIME type for an OpenAI `response_format`.
fn mime_for_format(format: &str) -> &'static str {
    match format {
        "opus" => "audio/opus",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "pcm" => "audio/pcm",
        _ => "audio/mpeg",
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeechProvider {
    fn content_type(&self) -> &str {
        mime_for_format(&self.format)
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError> {
        let url = format!("{}/audio/speech", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "voice": self.voice,
            "input": text,
            "response_format": self.format,
        });

        debug!(model = %self.model, voice = %self.voice, chars = text.chars().count(), "Requesting speech synthesis");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let response = check_status(response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::StreamInterrupted(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}
