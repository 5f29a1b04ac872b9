//! OpenAI-compatible chat-completions provider.

mod client;
mod config;
mod convert;

pub use client::OpenAIClient;
pub use config::{OPENAI_API_BASE, OpenAIConfig};
