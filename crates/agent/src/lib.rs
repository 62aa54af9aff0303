//! The completion loop, the heart of Briefly.
//!
//! Each chat request runs one loop:
//!
//! 1. **Seed** the working conversation with the system prompt and history
//! 2. **Stream** one completion round, forwarding text deltas as they arrive
//! 3. **If tool calls**: execute them, append each invocation and its result,
//!    loop back to step 2
//! 4. **Otherwise**: close the output stream
//!
//! The loop stops after a bounded number of rounds, and stops early when the
//! caller drops the output receiver.

pub mod loop_runner;
pub mod prompt;

pub use loop_runner::{ChunkReceiver, CompletionLoop};
pub use prompt::SYSTEM_PROMPT;
