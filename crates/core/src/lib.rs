//! # Briefly Core
//!
//! Domain types, traits, and error definitions for the Briefly news
//! summarizer. This crate has **no HTTP framework dependencies**: it defines
//! the conversation model, the tool protocol and the provider seams that the
//! other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every outbound collaborator is a trait here:
//! - [`Provider`] streams completion rounds from a language model
//! - [`SpeechSynthesizer`] turns finished text into audio
//! - [`Tool`] is a capability the model may invoke
//!
//! Implementations live in their respective crates, so tests can swap in
//! scripted stand-ins without touching the network.

pub mod error;
pub mod message;
pub mod provider;
pub mod speech;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Conversation, ConversationItem, Message, Role};
pub use provider::{
    CompletedResponse, CompletionRequest, OutputItem, Provider, StreamEvent, ToolDefinition,
};
pub use speech::SpeechSynthesizer;
pub use tool::{Tool, ToolInvocation, ToolRegistry, ToolResult};
