//! Upstream provider implementations for Briefly.
//!
//! The completion provider implements `briefly_core::Provider` over the
//! OpenAI Responses API; the speech provider implements
//! `briefly_core::SpeechSynthesizer` over the audio API.

pub mod factory;
pub mod openai_responses;
pub mod openai_speech;
mod status;

pub use factory::{ProviderSet, build_from_config};
pub use openai_responses::OpenAiResponsesProvider;
pub use openai_speech::OpenAiSpeechProvider;
