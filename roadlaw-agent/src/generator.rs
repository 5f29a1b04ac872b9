//! Streaming answer generation grounded in reranked documents.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::{Stream, StreamExt};
use roadlaw_core::{Content, CoreError, GenerateConfig, Llm, LlmRequest};
use roadlaw_rag::ScoredDocument;
use tracing::{debug, warn};

use crate::event::ConversationTurn;
use crate::prompt::{GENERATOR_SYSTEM_PROMPT, format_context, history_contents, user_prompt};

/// Lazily produced answer text increments.
pub type TextStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Prefix of the fragment emitted when generation fails part-way.
pub const GENERATION_APOLOGY: &str = "Xin lỗi, đã có lỗi xảy ra khi xử lý yêu cầu của bạn";

/// Streams an answer to a question from a fixed document set.
///
/// Provider failures never escape: the stream ends with one apology fragment
/// carrying the error detail.
#[derive(Clone)]
pub struct AnswerGenerator {
    llm: Arc<dyn Llm>,
    temperature: f32,
    timeout: Duration,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm, temperature: 0.0, timeout: Duration::from_secs(60) }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Bound on opening the stream and on the wait for each increment.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// System instruction, replayed history, then the question with its documents.
    pub fn build_request(
        &self,
        query: &str,
        history: &[ConversationTurn],
        documents: &[ScoredDocument],
    ) -> LlmRequest {
        let mut contents = vec![Content::system(GENERATOR_SYSTEM_PROMPT)];
        contents.extend(history_contents(history));
        contents.push(Content::user(user_prompt(query, &format_context(documents))));

        let config = GenerateConfig { temperature: Some(self.temperature), ..GenerateConfig::default() };
        LlmRequest::new(contents).with_config(config)
    }

    /// Stream the answer. Nothing is sent to the provider until the stream is
    /// first polled, and dropping it abandons the provider stream.
    pub fn generate(
        &self,
        query: &str,
        history: &[ConversationTurn],
        documents: &[ScoredDocument],
    ) -> TextStream {
        let request = self.build_request(query, history, documents);
        let llm = Arc::clone(&self.llm);
        let timeout = self.timeout;

        let output = stream! {
            let opened = match tokio::time::timeout(timeout, llm.generate_content(request, true)).await {
                Ok(result) => result,
                Err(_) => Err(timeout_error("answer stream", timeout)),
            };
            let mut upstream = match opened {
                Ok(upstream) => upstream,
                Err(e) => {
                    warn!(error = %e, "answer generation failed to start");
                    yield apology(&e);
                    return;
                }
            };

            let mut fragments = 0usize;
            loop {
                let next = match tokio::time::timeout(timeout, upstream.next()).await {
                    Ok(next) => next,
                    Err(_) => Some(Err(timeout_error("next answer chunk", timeout))),
                };
                match next {
                    None => break,
                    Some(Ok(response)) => {
                        let text = response.text_content();
                        if !text.is_empty() {
                            fragments += 1;
                            yield text;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, fragments, "answer generation failed mid-stream");
                        yield apology(&e);
                        return;
                    }
                }
            }
            debug!(fragments, "answer generation finished");
        };
        Box::pin(output)
    }
}

fn timeout_error(operation: &str, limit: Duration) -> CoreError {
    CoreError::Timeout { operation: operation.to_string(), seconds: limit.as_secs() }
}

fn apology(error: &CoreError) -> String {
    format!("{GENERATION_APOLOGY}: {error}")
}
