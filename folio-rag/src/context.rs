//! Grounding-context assembly.

use serde::Serialize;

use crate::document::SearchResult;

/// Text used when retrieval found nothing.
pub const FALLBACK_CONTEXT: &str = "No specific context is available for this question.";

/// Placed between rendered passages.
pub const PASSAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Grounding text handed to the completion dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssembledContext {
    text: String,
    passages: usize,
}

impl AssembledContext {
    /// The rendered context. Never empty.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// True when no passages were retrieved and the text is [`FALLBACK_CONTEXT`].
    pub fn is_fallback(&self) -> bool {
        self.passages == 0
    }

    /// Number of passages rendered into the context.
    pub fn passage_count(&self) -> usize {
        self.passages
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Render one result as `[Source: {source}]` followed by its text.
pub fn render_passage(result: &SearchResult) -> String {
    format!("[Source: {}]\n{}", result.chunk.source, result.chunk.text)
}

/// Concatenate results in the order given.
///
/// Results are neither re-sorted nor truncated; callers that need a size cap
/// apply [`truncate_to_budget`] first.
pub fn assemble(results: &[SearchResult]) -> AssembledContext {
    if results.is_empty() {
        return AssembledContext { text: FALLBACK_CONTEXT.to_string(), passages: 0 };
    }

    let text = results.iter().map(render_passage).collect::<Vec<_>>().join(PASSAGE_SEPARATOR);
    AssembledContext { text, passages: results.len() }
}

/// Longest prefix of `results` whose assembled context fits in `max_chars`.
///
/// The first result is always kept, even when it alone exceeds the budget,
/// so a non-empty retrieval never degrades to the fallback text.
pub fn truncate_to_budget(results: &[SearchResult], max_chars: usize) -> &[SearchResult] {
    let mut used = 0;
    for (i, result) in results.iter().enumerate() {
        let separator = if i == 0 { 0 } else { PASSAGE_SEPARATOR.len() };
        used += separator + render_passage(result).len();
        if used > max_chars {
            return &results[..i.max(1)];
        }
    }
    results
}
