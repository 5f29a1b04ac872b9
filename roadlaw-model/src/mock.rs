//! Scripted LLM for tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;
use roadlaw_core::{CoreError, Llm, LlmRequest, LlmResponse, LlmResponseStream};
use tokio::sync::Mutex;

/// One scripted reaction to a `generate_content` call.
#[derive(Debug, Clone)]
pub enum MockTurn {
    /// Yield these items in order.
    Respond(Vec<LlmResponse>),
    /// Fail the call before anything is produced.
    Fail(String),
    /// Yield these items, then fail the stream.
    FailAfter(Vec<LlmResponse>, String),
}

type Responder = dyn Fn(&LlmRequest) -> MockTurn + Send + Sync;

/// A mock [`Llm`] that replays scripted turns and counts what it produced.
///
/// Turns queued with the `with_*` builders are consumed first; afterwards the
/// optional responder closure decides. A call with nothing left to replay fails.
///
/// # Example
///
/// ```rust,ignore
/// let llm = MockLlm::new("mock")
///     .with_response(LlmResponse::function_call("call_1", "search_traffic_law_db", json!({"query": "q"})))
///     .with_response(LlmResponse::text("done"));
/// ```
pub struct MockLlm {
    name: String,
    script: Mutex<VecDeque<MockTurn>>,
    responder: Option<Box<Responder>>,
    chunk_delay: Option<Duration>,
    calls: AtomicUsize,
    chunks: Arc<AtomicUsize>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            responder: None,
            chunk_delay: None,
            calls: AtomicUsize::new(0),
            chunks: Arc::new(AtomicUsize::new(0)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a turn producing a single response.
    pub fn with_response(self, response: LlmResponse) -> Self {
        self.with_turn(MockTurn::Respond(vec![response]))
    }

    /// Queue a turn streaming `chunks` as text increments.
    pub fn with_stream<I, S>(self, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = chunks.into_iter().map(LlmResponse::delta).collect();
        self.with_turn(MockTurn::Respond(items))
    }

    /// Queue a turn that fails immediately.
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.with_turn(MockTurn::Fail(message.into()))
    }

    pub fn with_turn(mut self, turn: MockTurn) -> Self {
        self.script.get_mut().push_back(turn);
        self
    }

    /// Decide turns from the request once the queued script is exhausted.
    pub fn with_responder(
        mut self,
        responder: impl Fn(&LlmRequest) -> MockTurn + Send + Sync + 'static,
    ) -> Self {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Sleep before producing each item, to simulate a slow provider.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    /// Number of `generate_content` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of stream items actually produced to consumers so far.
    pub fn chunks_emitted(&self) -> usize {
        self.chunks.load(Ordering::SeqCst)
    }

    /// Every request received, in call order.
    pub async fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_content(
        &self,
        request: LlmRequest,
        _stream: bool,
    ) -> Result<LlmResponseStream, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let queued = self.script.lock().await.pop_front();
        let turn = match (queued, &self.responder) {
            (Some(turn), _) => turn,
            (None, Some(responder)) => responder(&request),
            (None, None) => MockTurn::Fail(format!("mock '{}' has no scripted turn left", self.name)),
        };
        self.requests.lock().await.push(request);

        let (items, failure) = match turn {
            MockTurn::Fail(message) => return Err(CoreError::Model(message)),
            MockTurn::Respond(items) => (items, None),
            MockTurn::FailAfter(items, message) => (items, Some(message)),
        };

        let delay = self.chunk_delay;
        let chunks = Arc::clone(&self.chunks);
        let output = stream! {
            for item in items {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                chunks.fetch_add(1, Ordering::SeqCst);
                yield Ok(item);
            }
            if let Some(message) = failure {
                yield Err(CoreError::Model(message));
            }
        };
        Ok(Box::pin(output))
    }
}
