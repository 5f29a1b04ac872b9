//! The red-light question answered end to end over a ten-passage collection,
//! with the answer citing whatever the retrieval tool returned.

mod common;

use std::sync::Arc;

use roadlaw_agent::{
    Components, PipelineConfig, PipelineMode, SEARCH_TOOL_NAME, StreamEvent, build_orchestrator,
};
use roadlaw_core::{LlmRequest, LlmResponse, ROLE_TOOL};
use roadlaw_model::{MockLlm, MockTurn};
use serde_json::json;

use common::*;

const QUESTION: &str = "Lái xe vượt đèn đỏ phạt bao nhiêu tiền";

/// First value of a `label: value` line in `text`.
fn field<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    text.lines().find_map(|line| line.strip_prefix(label)).map(str::trim)
}

fn cite(context: &str) -> String {
    let article = field(context, "Điều:").unwrap_or("?");
    let year = field(context, "Năm:").unwrap_or("?");
    format!("Theo Điều {article} (năm {year}), người lái xe vượt đèn đỏ bị phạt tiền từ 18 đến 20 triệu đồng.")
}

/// Searches once, then answers from the tool result.
fn agent_turn(request: &LlmRequest) -> MockTurn {
    let last = request.contents.last();
    match last.filter(|c| c.role == ROLE_TOOL).and_then(tool_response) {
        Some((_, body)) => MockTurn::Respond(vec![LlmResponse::text(cite(&body))]),
        None => MockTurn::Respond(vec![LlmResponse::function_call(
            "call_1",
            SEARCH_TOOL_NAME,
            json!({"query": "vượt đèn đỏ mức phạt"}),
        )]),
    }
}

/// Streams a citation of the first reference document in the prompt.
fn writer_turn(request: &LlmRequest) -> MockTurn {
    let prompt = request.contents.last().map(|c| c.text()).unwrap_or_default();
    let answer = cite(&prompt);
    let (head, tail) = answer.split_at(answer.find(',').unwrap_or(answer.len()));
    MockTurn::Respond(vec![LlmResponse::delta(head), LlmResponse::delta(tail)])
}

fn final_answer(events: &[StreamEvent]) -> &str {
    answers(events).last().copied().unwrap_or_default()
}

#[tokio::test]
async fn agentic_answer_cites_the_red_light_article() {
    let components = Components {
        llm: Arc::new(MockLlm::new("agent").with_responder(agent_turn)),
        retriever: fixture_retriever().await,
        reranker: reranker(judge()),
    };
    let pipeline = build_orchestrator(components, PipelineConfig::default());

    let events = collect(pipeline.process(QUESTION.into(), vec![])).await;

    assert_eq!(answers(&events).len(), 1);
    let answer = final_answer(&events);
    assert!(answer.contains(&format!("Điều {MATCHING_ARTICLE}")), "{answer}");
    assert!(answer.contains(&format!("năm {MATCHING_YEAR}")), "{answer}");
    assert_eq!(events.iter().filter(|e| matches!(e, StreamEvent::ToolName(_))).count(), 2);
}

#[tokio::test]
async fn fixed_answer_cites_the_red_light_article() {
    let components = Components {
        llm: Arc::new(MockLlm::new("writer").with_responder(writer_turn)),
        retriever: fixture_retriever().await,
        reranker: reranker(judge()),
    };
    let config = PipelineConfig { mode: PipelineMode::Fixed, ..PipelineConfig::default() };
    let pipeline = build_orchestrator(components, config);

    let events = collect(pipeline.process(QUESTION.into(), vec![])).await;

    let answers = answers(&events);
    assert_eq!(answers.len(), 2);
    assert!(answers[1].starts_with(answers[0]));
    assert!(answers[1].contains(&format!("Điều {MATCHING_ARTICLE} (năm {MATCHING_YEAR})")), "{}", answers[1]);
}
