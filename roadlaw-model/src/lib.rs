//! # roadlaw-model
//!
//! LLM provider integrations for roadlaw.
//!
//! - [`OpenAIClient`] - OpenAI chat completions and OpenAI-compatible servers
//!   (tool calling, JSON-object mode, fixed seed, SSE streaming)
//! - [`MockLlm`] - scripted model for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use roadlaw_model::openai::{OpenAIClient, OpenAIConfig};
//!
//! let model = OpenAIClient::new(OpenAIConfig::new(
//!     std::env::var("OPENAI_API_KEY").unwrap(),
//!     "gpt-4.1-mini",
//! ))?;
//! ```

pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;

pub use mock::{MockLlm, MockTurn};
#[cfg(feature = "openai")]
pub use openai::{OpenAIClient, OpenAIConfig};
