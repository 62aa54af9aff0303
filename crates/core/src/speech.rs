//! Speech synthesis seam.

use async_trait::async_trait;

use crate::error::ProviderError;

/// Turns finished reply text into encoded audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// MIME type of the audio this synthesizer returns.
    fn content_type(&self) -> &str {
        "audio/mpeg"
    }

    /// Synthesize `text` and return the full encoded payload.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError>;
}
