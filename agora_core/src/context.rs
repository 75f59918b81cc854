//! Packing ranked results into a bounded text context for synthesis.

use crate::domains::config::ContextRules;
use crate::types::CanonicalResult;
use serde::{Deserialize, Serialize};

/// Characters of content kept per result before the excerpt is cut.
pub const EXCERPT_CHARS: usize = 500;

const BLOCK_SEPARATOR: &str = "\n\n";

/// Context text ready to hand to a language model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynthesisContext {
    pub text: String,

    /// Number of results packed into `text`
    pub included: usize,

    /// Whether any result was left out to respect the length budget
    pub truncated: bool,
}

/// Pack `results`, in order, into at most `rules.max_context_length`
/// characters. Blocks that do not fit are skipped, not cut.
pub fn build_context(results: &[CanonicalResult], rules: &ContextRules) -> SynthesisContext {
    let mut context = SynthesisContext::default();
    let mut length = 0usize;

    for result in results {
        let block = format_block(result, rules.include_metadata);
        let block_len = block.chars().count();
        let separator_len = if context.included == 0 {
            0
        } else {
            BLOCK_SEPARATOR.len()
        };

        if length + separator_len + block_len > rules.max_context_length {
            context.truncated = true;
            continue;
        }

        if separator_len > 0 {
            context.text.push_str(BLOCK_SEPARATOR);
        }
        context.text.push_str(&block);
        length += separator_len + block_len;
        context.included += 1;
    }

    context
}

fn format_block(result: &CanonicalResult, include_metadata: bool) -> String {
    let mut block = format!(
        "Source: {}\nTitle: {}\nContent: {}",
        result.source,
        result.title,
        excerpt(&result.content, EXCERPT_CHARS)
    );
    if include_metadata {
        if let Some(url) = &result.url {
            block.push_str("\nURL: ");
            block.push_str(url);
        }
        block.push_str(&format!("\nRelevance: {:.2}", result.relevance_score));
    }
    block
}

/// First `max_chars` characters of `text`, with "..." appended when cut.
fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
