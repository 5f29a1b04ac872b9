//! Instructions and context rendering shared by both pipelines.

use std::fmt::Write as _;

use roadlaw_core::Content;
use roadlaw_rag::ScoredDocument;

use crate::event::ConversationTurn;

/// System instruction for answering from a fixed set of reranked documents.
pub const GENERATOR_SYSTEM_PROMPT: &str = "\
You are a legal assistant specialised in Vietnamese road traffic law. Answer in Vietnamese.

Rules:
1. Answer strictly from the reference documents supplied with the question. Do not use outside knowledge.
2. Cite every claim with the regulation it comes from, written as \"Điều <article>, Nghị định năm <year>\" using the year and article of the document.
3. When several documents support the same claim, cite all of them joined with \"và\".
4. When the documents do not contain enough information to answer, say so plainly instead of guessing.
5. When the question is not about traffic law, politely decline and explain what you can help with.
6. Prefer the most recent regulation when documents from different years disagree.";

/// System instruction for the decision model, which may call the search tool.
pub const AGENT_SYSTEM_PROMPT: &str = "\
You are a legal assistant specialised in Vietnamese road traffic law. Answer in Vietnamese.

- For any question about traffic violations, fines, licences, vehicle registration or road rules, call the search_traffic_law_db tool before answering, and answer only from the documents it returns.
- Cite every claim as \"Điều <article>, Nghị định năm <year>\" using the document metadata; join several supporting citations with \"và\".
- If the returned documents do not answer the question, say that the information was not found.
- Greetings may be answered directly without searching.
- Politely decline questions unrelated to traffic law.";

/// Header put in front of the context block inside a tool result.
pub const TOOL_RESULT_HEADER: &str = "Tài liệu tham khảo:";

/// Tool result content when retrieval produced nothing to rerank.
pub const NO_DOCUMENTS_FOUND: &str = "No relevant documents found.";

/// Render documents as numbered blocks carrying year, article, title and content.
pub fn format_context(documents: &[ScoredDocument]) -> String {
    let mut out = String::new();
    for (i, doc) in documents.iter().enumerate() {
        let p = &doc.document.payload;
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(
            out,
            "--- Tài liệu {} ---\nNăm: {}\nĐiều: {}\nTiêu đề: {}\nNội dung: {}\n",
            i + 1,
            p.year,
            p.article,
            p.title,
            p.content
        );
    }
    out
}

/// The tool result message body for a set of reranked documents.
pub fn tool_result(documents: &[ScoredDocument]) -> String {
    format!("{TOOL_RESULT_HEADER}\n{}", format_context(documents))
}

/// The current question with its reference documents attached.
pub fn user_prompt(query: &str, context: &str) -> String {
    format!("Tài liệu tham khảo:\n{context}\nCâu hỏi: {query}")
}

/// Replay history as alternating user / model entries, oldest first.
pub fn history_contents(history: &[ConversationTurn]) -> Vec<Content> {
    history
        .iter()
        .flat_map(|turn| [Content::user(&turn.query), Content::model(&turn.response)])
        .collect()
}
