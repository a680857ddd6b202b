//! Serializable result types for the matching API.
//!
//! A successful match produces a [`RuleMatch`]: the normalised words of the
//! utterance plus one [`NodeSpan`] per expansion node that claimed a span of
//! them. Downstream recogniser integrations consume these as JSON, so the
//! types carry serde and JSON-schema derives.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A token range in the normalised speech input (start inclusive, end
/// exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    /// Index of the first token covered.
    pub start: usize,
    /// Index one past the last token covered.
    pub end: usize,
}

impl Span {
    /// Creates a span over `[start, end)`.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of tokens covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True when the span covers no tokens.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// The span claimed by a single expansion node during a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpan {
    /// Child-index path from the expansion root to this node.
    pub path: Vec<usize>,

    /// Token range the node consumed.
    pub span: Span,

    /// True when the node is a dictation slot.
    pub dictation: bool,

    /// Referenced rule name when the node is a rule reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

/// The full trace of a successful rule match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuleMatch {
    /// Name of the rule that matched.
    pub rule_name: String,

    /// Normalised tokens of the matched utterance.
    pub words: Vec<String>,

    /// Span claimed by every expansion node that took part in the match,
    /// innermost nodes first.
    pub spans: Vec<NodeSpan>,
}

impl RuleMatch {
    /// Token ranges claimed by dictation slots, in match order.
    pub fn dictation_spans(&self) -> Vec<Span> {
        self.spans
            .iter()
            .filter(|node| node.dictation)
            .map(|node| node.span)
            .collect()
    }

    /// The free-form phrases claimed by dictation slots, space-joined per
    /// slot.
    pub fn dictation_phrases(&self) -> Vec<String> {
        self.dictation_spans()
            .iter()
            .map(|span| self.words[span.start..span.end].join(" "))
            .collect()
    }
}
