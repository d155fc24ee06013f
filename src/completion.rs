//! Completion Bridge
//!
//! Translates editor cursor context into engine completion queries and
//! normalizes engine-specific candidate payloads into ranked suggestion
//! lists. Completion is best-effort by design: a broken provider must never
//! surface an error through the editor, so every failure path collapses to
//! an empty reply.

use std::sync::Arc;

use crate::engine::EngineAdapter;

/// Rank boost applied to candidates that look like named-argument
/// completions (trailing `=` marker)
const NAMED_ARGUMENT_BOOST: i32 = 10;

/// Cursor context for one completion query; ephemeral, scoped to a single
/// editor interaction
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Text of the line under the cursor
    pub line_text: String,
    /// The token span under the cursor
    pub token_text: String,
    /// Byte offset where the token starts
    pub token_start: usize,
    /// Byte offset where the token ends (the cursor position)
    pub token_end: usize,
    /// Whether the user invoked completion manually
    pub explicit: bool,
}

/// One ranked suggestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    /// Completion label as reported by the engine
    pub label: String,
    /// Relative ranking weight; higher sorts earlier
    pub rank_boost: i32,
}

/// Ordered suggestions plus the replacement anchor for the editor
#[derive(Debug, Clone, Default)]
pub struct CompletionReply {
    /// Byte offset at which the completion replaces text
    pub anchor: usize,
    /// Suggestions in engine order, rank boosts attached
    pub items: Vec<CompletionItem>,
}

impl CompletionReply {
    /// Reply carrying no suggestions
    pub fn empty(anchor: usize) -> Self {
        Self {
            anchor,
            items: Vec::new(),
        }
    }

    /// Whether there is anything to show
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Conservative identifier-character class used for token extraction.
///
/// Covers the operator-free identifier syntax common to the supported
/// engines: letters, digits, `_`, `.` and `:`.
fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == ':'
}

/// The token span ending at `cursor`: scans backwards over identifier
/// characters. Returns `(start, end)` byte offsets with `end` at the
/// nearest char boundary at or before `cursor`.
pub fn token_span(line: &str, cursor: usize) -> (usize, usize) {
    // Editors may hand over char-based offsets; snap to a valid boundary
    // rather than panic on multibyte text
    let mut cursor = cursor.min(line.len());
    while !line.is_char_boundary(cursor) {
        cursor -= 1;
    }
    let mut start = cursor;
    for (idx, c) in line[..cursor].char_indices().rev() {
        if is_token_char(c) {
            start = idx;
        } else {
            break;
        }
    }
    (start, cursor)
}

/// Request/response protocol between the editor and the engine's
/// completion machinery
pub struct CompletionBridge {
    engine: Arc<dyn EngineAdapter>,
}

impl CompletionBridge {
    /// Create a bridge delegating to the given engine
    pub fn new(engine: Arc<dyn EngineAdapter>) -> Self {
        Self { engine }
    }

    /// Produce suggestions for the cursor position in `line`.
    ///
    /// An empty token span on a non-explicit trigger returns no suggestions
    /// without contacting the engine, so ordinary typing stays quiet.
    pub async fn complete(&self, line: &str, cursor: usize, explicit: bool) -> CompletionReply {
        let (start, end) = token_span(line, cursor);
        if start == end && !explicit {
            return CompletionReply::empty(cursor);
        }

        // Close-parens at the end of the line confuse engine-side parsers;
        // the completion context never needs them
        let line_text = line.trim_end_matches(')').to_string();
        let token_text = line[start..end].to_string();

        let request = CompletionRequest {
            line_text,
            token_text,
            token_start: start,
            token_end: end,
            explicit,
        };

        let labels = self.engine.complete(&request).await;
        let items = labels
            .into_iter()
            .map(|label| {
                let rank_boost = if label.ends_with('=') {
                    NAMED_ARGUMENT_BOOST
                } else {
                    0
                };
                CompletionItem { label, rank_boost }
            })
            .collect();

        CompletionReply {
            anchor: start,
            items,
        }
    }
}
