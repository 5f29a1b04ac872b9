//! # roadlaw-core
//!
//! Types shared by every roadlaw crate at the language-model boundary: the
//! role-tagged [`Content`] conversation model, [`LlmRequest`] /
//! [`LlmResponse`], tool declarations, and the [`Llm`] trait implemented by
//! `roadlaw-model`.

pub mod content;
pub mod error;
pub mod model;

pub use content::{Content, FunctionCallRef, Part, ROLE_MODEL, ROLE_SYSTEM, ROLE_TOOL, ROLE_USER};
pub use error::{CoreError, Result};
pub use model::{
    FinishReason, GenerateConfig, Llm, LlmRequest, LlmResponse, LlmResponseStream, ResponseFormat,
    ToolDeclaration, collect_response,
};
