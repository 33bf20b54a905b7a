//! Answer generation.
//!
//! A generative backend answers when one is available; otherwise a fixed
//! template summarizes the context.

mod client;
mod generator;
mod prompts;

pub use client::{ChatBackend, ChatOptions, GenerationError, OllamaBackend};
pub use generator::{fallback_response, ResponseGenerator};
pub use prompts::{format_question, render_context, ASSISTANT_SYSTEM_PROMPT, NO_CONTEXT};
